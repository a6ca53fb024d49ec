//! Submission lock and busy control
//!
//! At most one submission per form may be in flight. A submit attempt while
//! the lock is held is dropped, not queued.
//!
//! Release happens on:
//! - an explicit completion signal from the response
//! - navigation away (the view state is discarded)
//! - the timeout fallback, for in-page submissions only
//!
//! A full-page navigation submission has no deadline: the reload that
//! follows the response discards the lock along with the rest of the view.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::clock::ViewTime;

/// Default in-page submission timeout.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default label shown on the busy submit control.
pub const DEFAULT_BUSY_LABEL: &str = "Processing...";

/// How the form submits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SubmitMode {
    /// Classic form post followed by a page load.
    #[default]
    Navigation,
    /// Background request; the page stays mounted.
    InPage {
        #[serde(with = "duration_secs")]
        timeout: Duration,
    },
}

impl SubmitMode {
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            SubmitMode::Navigation => None,
            SubmitMode::InPage { timeout } => Some(*timeout),
        }
    }
}

/// Result of trying to take the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    /// Lock taken; the submission may proceed.
    Acquired {
        /// When the timeout fallback fires, if any.
        deadline: Option<ViewTime>,
    },
    /// A submission is already in flight.
    Suppressed,
}

#[derive(Debug, Default)]
pub struct SubmissionLock {
    mode: SubmitMode,
    held_since: Option<ViewTime>,
}

impl SubmissionLock {
    pub fn new(mode: SubmitMode) -> Self {
        Self {
            mode,
            held_since: None,
        }
    }

    pub fn try_acquire(&mut self, now: ViewTime) -> Acquire {
        if self.held_since.is_some() {
            return Acquire::Suppressed;
        }
        self.held_since = Some(now);
        Acquire::Acquired {
            deadline: self.mode.timeout().map(|t| now + t),
        }
    }

    /// Release the lock. Returns false if it was not held.
    pub fn release(&mut self) -> bool {
        self.held_since.take().is_some()
    }

    pub fn is_held(&self) -> bool {
        self.held_since.is_some()
    }

    /// Held past the in-page timeout.
    pub fn is_expired(&self, now: ViewTime) -> bool {
        match (self.held_since, self.mode.timeout()) {
            (Some(since), Some(timeout)) => now.since(since) >= timeout,
            _ => false,
        }
    }

    pub fn mode(&self) -> SubmitMode {
        self.mode
    }
}

/// Submit control that swaps its label while busy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusyControl {
    label: String,
    busy_label: String,
    busy: bool,
}

impl BusyControl {
    pub fn new(label: impl Into<String>, busy_label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            busy_label: busy_label.into(),
            busy: false,
        }
    }

    /// Mark busy; returns the label to display.
    pub fn set_busy(&mut self) -> &str {
        self.busy = true;
        &self.busy_label
    }

    /// Restore the original label.
    pub fn restore(&mut self) -> &str {
        self.busy = false;
        &self.label
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn current_label(&self) -> &str {
        if self.busy {
            &self.busy_label
        } else {
            &self.label
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
