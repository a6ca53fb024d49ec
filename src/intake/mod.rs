//! File intake gate
//!
//! Every candidate file, whether picked through the file input or dropped on
//! the upload region, passes through [`IntakeGate::intake`]. Only names and
//! byte sizes are inspected, never content. The endpoint re-validates
//! independently; this gate only keeps obviously invalid files from being
//! sent.

use serde::{Deserialize, Serialize};

use crate::error::IntakeError;
use crate::notify::Severity;

/// Size/type policy applied by the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicy {
    /// Largest accepted file in bytes.
    pub max_bytes: u64,
    /// Accepted extension without the dot, lowercase.
    pub extension: String,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: emailflow_protocol::MAX_UPLOAD_BYTES,
            extension: emailflow_protocol::UPLOAD_EXTENSION.to_string(),
        }
    }
}

/// A file offered by selection or drop, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub size_bytes: u64,
}

impl FileRef {
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes,
        }
    }
}

/// A file that passed the gate and is held for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedFile {
    pub name: String,
    pub size_bytes: u64,
    /// Lowercase extension without the dot.
    pub extension: String,
}

/// Outcome classification of a validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    Ok,
    BadExtension,
    TooLarge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub accepted: bool,
    pub reason_code: ReasonCode,
    /// Human-readable text for the notification.
    pub message: String,
}

impl ValidationResult {
    fn accepted(file: &FileRef) -> Self {
        Self {
            accepted: true,
            reason_code: ReasonCode::Ok,
            message: format!("Selected {} ({})", file.name, human_size(file.size_bytes)),
        }
    }

    fn rejected(rejection: &Rejection) -> Self {
        Self {
            accepted: false,
            reason_code: rejection.reason_code(),
            message: IntakeError::from(rejection.clone()).to_string(),
        }
    }

    /// Severity of the notification reporting this result.
    pub fn severity(&self) -> Severity {
        if self.accepted {
            Severity::Success
        } else {
            Severity::Danger
        }
    }
}

/// Why the gate turned a file away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    TooLarge { size_bytes: u64, max_bytes: u64 },
    BadExtension { name: String, extension: String },
}

impl Rejection {
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            Rejection::TooLarge { .. } => ReasonCode::TooLarge,
            Rejection::BadExtension { .. } => ReasonCode::BadExtension,
        }
    }
}

impl From<Rejection> for IntakeError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::TooLarge {
                size_bytes,
                max_bytes,
            } => IntakeError::TooLarge {
                size_bytes,
                max_bytes,
            },
            Rejection::BadExtension { name, extension } => {
                IntakeError::BadExtension { name, extension }
            }
        }
    }
}

/// Lowercase extension of a file name, without the dot. Empty if none.
pub fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => String::new(),
    }
}

/// Check a file against the policy.
///
/// Pure and idempotent. The size rule runs first: an oversize file is
/// `TOO_LARGE` whatever its name.
pub fn check(file: &FileRef, policy: &UploadPolicy) -> Result<StagedFile, Rejection> {
    if file.size_bytes > policy.max_bytes {
        return Err(Rejection::TooLarge {
            size_bytes: file.size_bytes,
            max_bytes: policy.max_bytes,
        });
    }

    let extension = policy.extension.to_lowercase();
    if !file.name.to_lowercase().ends_with(&format!(".{}", extension)) {
        return Err(Rejection::BadExtension {
            name: file.name.clone(),
            extension,
        });
    }

    Ok(StagedFile {
        name: file.name.clone(),
        size_bytes: file.size_bytes,
        extension: extension_of(&file.name),
    })
}

/// Validate a file and describe the outcome.
pub fn validate(file: &FileRef, policy: &UploadPolicy) -> ValidationResult {
    match check(file, policy) {
        Ok(_) => ValidationResult::accepted(file),
        Err(e) => ValidationResult::rejected(&e),
    }
}

/// Format a byte count the way the upload page shows it (`2.5 MB`).
pub fn human_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else if b < GB {
        format!("{:.1} MB", b / MB)
    } else {
        format!("{:.1} GB", b / GB)
    }
}

/// Staging slot plus the submit control wired to validation state.
#[derive(Debug, Default)]
pub struct IntakeGate {
    policy: UploadPolicy,
    staged: Option<StagedFile>,
    submit_enabled: bool,
}

impl IntakeGate {
    pub fn new(policy: UploadPolicy) -> Self {
        Self {
            policy,
            staged: None,
            submit_enabled: false,
        }
    }

    /// Validate and stage (or unstage) a file.
    ///
    /// A rejection clears whatever was staged before, so a later submit can
    /// never silently reuse a bad or stale selection.
    pub fn intake(&mut self, file: &FileRef) -> ValidationResult {
        match check(file, &self.policy) {
            Ok(staged) => {
                tracing::debug!(file = %staged.name, size_bytes = staged.size_bytes, "file staged");
                self.staged = Some(staged);
                self.submit_enabled = true;
                ValidationResult::accepted(file)
            }
            Err(e) => {
                tracing::debug!(file = %file.name, size_bytes = file.size_bytes, reason = ?e.reason_code(), "file rejected");
                self.staged = None;
                self.submit_enabled = false;
                ValidationResult::rejected(&e)
            }
        }
    }

    pub fn staged(&self) -> Option<&StagedFile> {
        self.staged.as_ref()
    }

    /// Hand the staged file over for submission, leaving the slot empty.
    pub fn take_staged(&mut self) -> Option<StagedFile> {
        self.submit_enabled = false;
        self.staged.take()
    }

    /// Put a file back after a submission that did not go through.
    pub fn restage(&mut self, file: StagedFile) {
        self.staged = Some(file);
        self.submit_enabled = true;
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }
}
