//! Upload request checks shared by client and server.
//!
//! The client-side gate rejects obviously invalid files early, but the
//! endpoint stays authoritative and re-runs [`check_upload`] on every
//! request it receives.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

use crate::error::UploadError;
use crate::UPLOAD_EXTENSION;

/// Fallback name when sanitizing leaves nothing usable.
const FALLBACK_FILENAME: &str = "upload.csv";

/// Response returned by the endpoint once an upload is accepted for processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Identifier of the progress record tracking the import.
    pub progress_id: String,
    /// Sanitized file name as stored.
    pub filename: String,
}

impl UploadReceipt {
    /// Route of the progress page for this upload.
    pub fn progress_route(&self) -> String {
        crate::progress_route(&self.progress_id)
    }
}

/// Check the name and size of an uploaded file against the shared policy.
///
/// Size is checked before the extension so an oversize file reports
/// `PAYLOAD_TOO_LARGE` whatever its name.
pub fn check_upload(filename: &str, size: u64, max_bytes: u64) -> Result<(), UploadError> {
    if filename.trim().is_empty() {
        return Err(UploadError::missing_file());
    }

    if size > max_bytes {
        return Err(UploadError::payload_too_large(size, max_bytes));
    }

    if !has_upload_extension(filename) {
        return Err(UploadError::bad_extension(filename));
    }

    Ok(())
}

/// Whether the lowercase file name ends with `.csv`.
pub fn has_upload_extension(filename: &str) -> bool {
    let suffix = format!(".{}", UPLOAD_EXTENSION);
    filename.to_lowercase().ends_with(&suffix)
}

fn unsafe_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^\w\s\-.]").expect("static pattern"))
}

fn whitespace_runs() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("static pattern"))
}

/// Sanitize a client-supplied file name for storage.
///
/// Drops everything outside word characters, whitespace, `-` and `.`,
/// collapses whitespace to `_`, and strips leading dots and underscores so
/// the result can never name a hidden file or climb out of the upload folder.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    let cleaned = unsafe_chars().replace_all(base.trim(), "");
    let joined = whitespace_runs().replace_all(&cleaned, "_");
    let trimmed = joined.trim_start_matches(['.', '_']);

    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Unique storage name: `<uuid>_<sanitized name>`.
pub fn stored_filename(id: Uuid, filename: &str) -> String {
    format!("{}_{}", id, sanitize_filename(filename))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_check_upload_accepts_csv() {
        assert!(check_upload("report.csv", 2_500_000, 50 * 1024 * 1024).is_ok());
        assert!(check_upload("REPORT.CSV", 10, 100).is_ok());
    }

    #[test]
    fn test_check_upload_rejects_other_extensions() {
        let err = check_upload("report.xlsx", 10, 100).unwrap_err();
        assert_eq!(err.code, ErrorCode::BadExtension);

        let err = check_upload("csv", 10, 100).unwrap_err();
        assert_eq!(err.code, ErrorCode::BadExtension);
    }

    #[test]
    fn test_check_upload_size_wins_over_extension() {
        let err = check_upload("photo.png", 101, 100).unwrap_err();
        assert_eq!(err.code, ErrorCode::PayloadTooLarge);
    }

    #[test]
    fn test_check_upload_missing_name() {
        let err = check_upload("  ", 10, 100).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingFile);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("my report (final).csv"), "my_report_final.csv");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("..hidden.csv"), "hidden.csv");
        assert_eq!(sanitize_filename("C:\\Users\\me\\mails.csv"), "mails.csv");
        assert_eq!(sanitize_filename("***"), "upload.csv");
    }

    #[test]
    fn test_stored_filename_prefixes_uuid() {
        let id = Uuid::nil();
        assert_eq!(
            stored_filename(id, "inbox export.csv"),
            "00000000-0000-0000-0000-000000000000_inbox_export.csv"
        );
    }

    #[test]
    fn test_receipt_progress_route() {
        let receipt = UploadReceipt {
            progress_id: "abc123".to_string(),
            filename: "inbox.csv".to_string(),
        };
        assert_eq!(receipt.progress_route(), "/emails/upload/progress/abc123");
    }
}
