//! Typed view of the merged configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ConfigError;
use crate::intake::UploadPolicy;
use crate::lock::SubmitMode;
use crate::poller::{PollerConfig, RefreshStrategy};

/// Hard ceiling for `upload.max_bytes`: the largest limit ever deployed.
pub const MAX_UPLOAD_CEILING: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSection {
    pub max_bytes: u64,
    pub extension: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitModeName {
    Navigation,
    InPage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitSection {
    pub mode: SubmitModeName,
    pub timeout_seconds: u64,
    pub label: String,
    pub busy_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSection {
    pub interval_seconds: u64,
    pub jitter_ms: u64,
    pub refresh: RefreshStrategy,
    pub routes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifySection {
    pub duration_ms: u64,
    pub fade_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintSection {
    pub debounce_ms: u64,
}

/// Everything a page controller needs to know about deployment policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakePolicy {
    pub upload: UploadSection,
    pub submit: SubmitSection,
    pub poll: PollSection,
    pub notify: NotifySection,
    pub hint: HintSection,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        let d = super::BuiltinDefaults::default();
        Self {
            upload: UploadSection {
                max_bytes: d.max_upload_bytes,
                extension: d.upload_extension,
            },
            submit: SubmitSection {
                mode: match d.submit_mode.as_str() {
                    "in_page" => SubmitModeName::InPage,
                    _ => SubmitModeName::Navigation,
                },
                timeout_seconds: d.submit_timeout_seconds,
                label: d.submit_label,
                busy_label: d.busy_label,
            },
            poll: PollSection {
                interval_seconds: d.poll_interval_seconds,
                jitter_ms: d.poll_jitter_ms,
                refresh: match d.poll_refresh.as_str() {
                    "reload" => RefreshStrategy::Reload,
                    _ => RefreshStrategy::Partial,
                },
                routes: d.poll_routes,
            },
            notify: NotifySection {
                duration_ms: d.notify_duration_ms,
                fade_ms: d.notify_fade_ms,
            },
            hint: HintSection {
                debounce_ms: d.hint_debounce_ms,
            },
        }
    }
}

impl IntakePolicy {
    /// Deserialize a merged config value.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ConfigError> {
        serde_json::from_value(value.clone())
            .map_err(|e| ConfigError::ParseError(format!("invalid intake config: {}", e)))
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            max_bytes: self.upload.max_bytes,
            extension: self.upload.extension.trim_start_matches('.').to_lowercase(),
        }
    }

    pub fn submit_mode(&self) -> SubmitMode {
        match self.submit.mode {
            SubmitModeName::Navigation => SubmitMode::Navigation,
            SubmitModeName::InPage => SubmitMode::InPage {
                timeout: Duration::from_secs(self.submit.timeout_seconds),
            },
        }
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_secs(self.poll.interval_seconds),
            jitter: Duration::from_millis(self.poll.jitter_ms),
            refresh: self.poll.refresh,
            routes: self.poll.routes.clone(),
        }
    }

    pub fn notify_duration(&self) -> Duration {
        Duration::from_millis(self.notify.duration_ms)
    }

    pub fn notify_fade(&self) -> Duration {
        Duration::from_millis(self.notify.fade_ms)
    }

    pub fn hint_delay(&self) -> Duration {
        Duration::from_millis(self.hint.debounce_ms)
    }
}
