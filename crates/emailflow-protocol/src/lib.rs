//! EmailFlow Protocol Types
//!
//! Defines the upload policy, error envelope, CSV column contract and
//! progress stream shared by the upload endpoint and the intake client.

pub mod columns;
pub mod error;
pub mod progress;
pub mod stream;
pub mod upload;

pub use columns::{ColumnMapping, Field};
pub use error::{ErrorCode, UploadError};
pub use progress::{ProgressRecord, ProgressSnapshot, ProgressStatus};
pub use stream::{FrameDecoder, ProgressFrame, ProgressUpdate, MAX_FRAME_BYTES};
pub use upload::{check_upload, sanitize_filename, stored_filename, UploadReceipt};

/// Maximum accepted upload size in bytes (50 MiB).
///
/// Client and server both enforce this value; it is the single
/// authoritative limit.
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Accepted upload file extension (compared case-insensitively).
pub const UPLOAD_EXTENSION: &str = "csv";

/// Route prefix of the response approval queue.
pub const APPROVAL_ROUTE: &str = "/approval";

/// Route prefix of the per-upload progress pages.
pub const UPLOAD_PROGRESS_ROUTE: &str = "/emails/upload/progress";

/// Build the progress page route for an upload.
pub fn progress_route(progress_id: &str) -> String {
    format!("{}/{}", UPLOAD_PROGRESS_ROUTE, progress_id)
}
