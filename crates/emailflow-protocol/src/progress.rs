//! Import progress types.
//!
//! The server keeps one `ProgressRecord` per uploaded file; clients only
//! ever need the condensed `ProgressSnapshot`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Processing status of an uploaded file.
///
/// Serialized with the names the import worker writes (`processing`,
/// `completed`); the shorter `running`/`done` spellings are accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgressStatus {
    /// Accepted, not yet picked up.
    #[serde(rename = "pending")]
    Pending,
    /// Rows are being imported.
    #[serde(rename = "processing", alias = "running")]
    Running,
    /// All rows processed.
    #[serde(rename = "completed", alias = "done")]
    Done,
    /// Import aborted.
    #[serde(rename = "failed")]
    Failed,
}

impl ProgressStatus {
    /// No further updates will follow a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressStatus::Done | ProgressStatus::Failed)
    }
}

/// Latest status of a long-running import as seen by a client.
///
/// Deserialization goes through [`ProgressSnapshot::new`], so wire input is
/// clamped like everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireSnapshot")]
pub struct ProgressSnapshot {
    pub status: ProgressStatus,
    /// Completion in percent, always within `0..=100`.
    pub percent: u8,
}

#[derive(Deserialize)]
struct WireSnapshot {
    status: ProgressStatus,
    percent: u64,
}

impl From<WireSnapshot> for ProgressSnapshot {
    fn from(wire: WireSnapshot) -> Self {
        Self::new(wire.status, wire.percent.min(100) as u8)
    }
}

impl ProgressSnapshot {
    /// Create a snapshot, clamping `percent` to 100.
    pub fn new(status: ProgressStatus, percent: u8) -> Self {
        Self {
            status,
            percent: percent.min(100),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Server-side progress record for one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub filename: String,
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub processed_rows: u64,
    /// Rows that failed to import without aborting the file.
    #[serde(default)]
    pub error_count: u64,
    pub status: ProgressStatus,
    #[serde(default)]
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// Start a record for a file whose rows have not been counted yet.
    pub fn start(filename: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            filename: filename.into(),
            total_rows: 0,
            processed_rows: 0,
            error_count: 0,
            status: ProgressStatus::Running,
            error_message: String::new(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Completion in percent. Zero while the row count is unknown.
    pub fn percent(&self) -> u8 {
        if self.total_rows == 0 {
            return 0;
        }
        let pct = self.processed_rows.saturating_mul(100) / self.total_rows;
        pct.min(100) as u8
    }

    /// Condense into the snapshot clients poll for.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let percent = if self.status == ProgressStatus::Done {
            100
        } else {
            self.percent()
        };
        ProgressSnapshot::new(self.status, percent)
    }
}

impl From<&ProgressRecord> for ProgressSnapshot {
    fn from(record: &ProgressRecord) -> Self {
        record.snapshot()
    }
}
