//! Error types for the upload endpoint.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes returned when the upload endpoint rejects a request.
///
/// These codes are stable and shared with the client-side gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No file part, or the file part has an empty name.
    MissingFile,
    /// File name does not carry the accepted extension.
    BadExtension,
    /// Upload exceeds the maximum allowed size.
    PayloadTooLarge,
    /// CSV header lacks one of the required columns.
    MissingColumns,
    /// A progress stream frame could not be decoded.
    MalformedFrame,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFile => write!(f, "MISSING_FILE"),
            Self::BadExtension => write!(f, "BAD_EXTENSION"),
            Self::PayloadTooLarge => write!(f, "PAYLOAD_TOO_LARGE"),
            Self::MissingColumns => write!(f, "MISSING_COLUMNS"),
            Self::MalformedFrame => write!(f, "MALFORMED_FRAME"),
        }
    }
}

/// Upload error payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadError {
    /// Error code from the registry.
    pub code: ErrorCode,
    /// Human-readable, single-line error message suitable for a flash banner.
    pub message: String,
    /// Optional machine-readable details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl UploadError {
    /// Create a new upload error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create a new upload error with additional data.
    pub fn with_data(code: ErrorCode, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Create a MISSING_FILE error.
    pub fn missing_file() -> Self {
        Self::new(ErrorCode::MissingFile, "No file selected.")
    }

    /// Create a BAD_EXTENSION error.
    pub fn bad_extension(filename: &str) -> Self {
        Self::with_data(
            ErrorCode::BadExtension,
            "Please select a CSV file.",
            serde_json::json!({ "filename": filename }),
        )
    }

    /// Create a PAYLOAD_TOO_LARGE error.
    pub fn payload_too_large(size: u64, max: u64) -> Self {
        Self::with_data(
            ErrorCode::PayloadTooLarge,
            format!("file size {} exceeds maximum {}", size, max),
            serde_json::json!({ "size": size, "max_bytes": max }),
        )
    }

    /// Create a MISSING_COLUMNS error.
    pub fn missing_columns(missing: &[&str]) -> Self {
        Self::with_data(
            ErrorCode::MissingColumns,
            "CSV must contain sender, subject, and body columns",
            serde_json::json!({ "missing": missing }),
        )
    }

    /// Create a MALFORMED_FRAME error.
    pub fn malformed_frame(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedFrame, detail)
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for UploadError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_wire_names() {
        let json = serde_json::to_string(&ErrorCode::PayloadTooLarge).unwrap();
        assert_eq!(json, "\"PAYLOAD_TOO_LARGE\"");
        assert_eq!(ErrorCode::BadExtension.to_string(), "BAD_EXTENSION");
    }

    #[test]
    fn test_payload_too_large_carries_limits() {
        let err = UploadError::payload_too_large(200, 100);
        let data = err.data.unwrap();
        assert_eq!(data["size"], 200);
        assert_eq!(data["max_bytes"], 100);
    }

    #[test]
    fn test_display_prefixes_code() {
        let err = UploadError::missing_file();
        assert_eq!(err.to_string(), "MISSING_FILE: No file selected.");
    }
}
