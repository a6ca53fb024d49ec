//! Built-in defaults (layer 1)
//!
//! Hardcoded defaults for all configuration values.

use serde::{Deserialize, Serialize};

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Largest accepted upload in bytes (default: 50 MiB, shared with the endpoint)
    pub max_upload_bytes: u64,

    /// Accepted upload extension (default: "csv")
    pub upload_extension: String,

    /// Submission mode (default: "navigation")
    pub submit_mode: String,

    /// In-page submission timeout in seconds (default: 30)
    pub submit_timeout_seconds: u64,

    /// Submit control label (default: "Upload and Process")
    pub submit_label: String,

    /// Label shown while a submission is in flight (default: "Processing...")
    pub busy_label: String,

    /// Poll interval in seconds (default: 30)
    pub poll_interval_seconds: u64,

    /// Extra random delay per poll tick in milliseconds (default: 0)
    pub poll_jitter_ms: u64,

    /// Poll refresh strategy (default: "partial")
    pub poll_refresh: String,

    /// Route prefixes on which polling starts
    pub poll_routes: Vec<String>,

    /// Notification lifetime in milliseconds (default: 5000)
    pub notify_duration_ms: u64,

    /// Notification fade-out in milliseconds (default: 150)
    pub notify_fade_ms: u64,

    /// Hint debounce delay in milliseconds (default: 300)
    pub hint_debounce_ms: u64,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            max_upload_bytes: emailflow_protocol::MAX_UPLOAD_BYTES,
            upload_extension: emailflow_protocol::UPLOAD_EXTENSION.to_string(),
            submit_mode: "navigation".to_string(),
            submit_timeout_seconds: 30,
            submit_label: "Upload and Process".to_string(),
            busy_label: crate::lock::DEFAULT_BUSY_LABEL.to_string(),
            poll_interval_seconds: 30,
            poll_jitter_ms: 0,
            poll_refresh: "partial".to_string(),
            poll_routes: vec![
                emailflow_protocol::APPROVAL_ROUTE.to_string(),
                emailflow_protocol::UPLOAD_PROGRESS_ROUTE.to_string(),
            ],
            notify_duration_ms: 5000,
            notify_fade_ms: 150,
            hint_debounce_ms: 300,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "upload": {
                "max_bytes": self.max_upload_bytes,
                "extension": self.upload_extension
            },
            "submit": {
                "mode": self.submit_mode,
                "timeout_seconds": self.submit_timeout_seconds,
                "label": self.submit_label,
                "busy_label": self.busy_label
            },
            "poll": {
                "interval_seconds": self.poll_interval_seconds,
                "jitter_ms": self.poll_jitter_ms,
                "refresh": self.poll_refresh,
                "routes": self.poll_routes
            },
            "notify": {
                "duration_ms": self.notify_duration_ms,
                "fade_ms": self.notify_fade_ms
            },
            "hint": {
                "debounce_ms": self.hint_debounce_ms
            }
        })
    }
}
