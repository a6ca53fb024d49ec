//! Client-detected errors.
//!
//! None of these ever escape `PageController::dispatch`; each is turned into
//! a notification and the page stays interactive.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::intake::human_size;
use crate::notify::Severity;

/// Failures the intake subsystem detects on its own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("Please select a {} file.", .extension.to_uppercase())]
    BadExtension { name: String, extension: String },

    #[error("File is too large ({}). Maximum size is {}.", human_size(*.size_bytes), human_size(*.max_bytes))]
    TooLarge { size_bytes: u64, max_bytes: u64 },

    #[error("No file selected.")]
    NoFileSelected,

    #[error("Upload did not finish within {} seconds. Please try again.", .after.as_secs())]
    SubmitTimeout { after: Duration },

    #[error("Clipboard is not available. Select the text and copy it manually.")]
    ClipboardUnavailable,
}

/// Stable code for each error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntakeErrorCode {
    BadExtension,
    TooLarge,
    NoFileSelected,
    SubmitTimeout,
    ClipboardUnavailable,
}

impl IntakeError {
    pub fn code(&self) -> IntakeErrorCode {
        match self {
            IntakeError::BadExtension { .. } => IntakeErrorCode::BadExtension,
            IntakeError::TooLarge { .. } => IntakeErrorCode::TooLarge,
            IntakeError::NoFileSelected => IntakeErrorCode::NoFileSelected,
            IntakeError::SubmitTimeout { .. } => IntakeErrorCode::SubmitTimeout,
            IntakeError::ClipboardUnavailable => IntakeErrorCode::ClipboardUnavailable,
        }
    }

    /// Severity of the notification reporting this error.
    pub fn severity(&self) -> Severity {
        match self {
            IntakeError::ClipboardUnavailable => Severity::Warning,
            _ => Severity::Danger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = IntakeError::TooLarge {
            size_bytes: 60 * 1024 * 1024,
            max_bytes: 50 * 1024 * 1024,
        };
        assert_eq!(
            err.to_string(),
            "File is too large (60.0 MB). Maximum size is 50.0 MB."
        );

        let err = IntakeError::BadExtension {
            name: "a.txt".into(),
            extension: "csv".into(),
        };
        assert_eq!(err.to_string(), "Please select a CSV file.");

        let err = IntakeError::SubmitTimeout {
            after: Duration::from_secs(30),
        };
        assert_eq!(
            err.to_string(),
            "Upload did not finish within 30 seconds. Please try again."
        );
    }

    #[test]
    fn test_severity() {
        assert_eq!(IntakeError::ClipboardUnavailable.severity(), Severity::Warning);
        assert_eq!(IntakeError::NoFileSelected.severity(), Severity::Danger);
        assert_eq!(
            IntakeError::BadExtension {
                name: "a.txt".into(),
                extension: "csv".into()
            }
            .severity(),
            Severity::Danger
        );
    }

    #[test]
    fn test_codes_serialize() {
        let json = serde_json::to_string(&IntakeError::ClipboardUnavailable.code()).unwrap();
        assert_eq!(json, "\"CLIPBOARD_UNAVAILABLE\"");
    }
}
