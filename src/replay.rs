//! Timed event scripts
//!
//! A script mounts one page controller and feeds it events at fixed view
//! times. Each step yields a record with the effects it produced, so a
//! recorded session can be inspected or diffed without a browser.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::clock::ViewTime;
use crate::config::IntakePolicy;
use crate::controller::{Effect, Event, PageController};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayStep {
    /// View time of the event in milliseconds.
    pub at_ms: u64,
    pub event: Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayScript {
    /// Route the view mounts on.
    pub route: String,
    #[serde(default = "default_clipboard")]
    pub clipboard: bool,
    pub steps: Vec<ReplayStep>,
}

fn default_clipboard() -> bool {
    true
}

/// Effects produced by one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayRecord {
    pub at_ms: u64,
    pub event: String,
    pub effects: Vec<Effect>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid replay script: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("step {index} at {at_ms} ms goes back in time (previous step at {previous_ms} ms)")]
    OutOfOrder {
        index: usize,
        at_ms: u64,
        previous_ms: u64,
    },
}

impl ReplayScript {
    pub fn from_file(path: &Path) -> Result<Self, ReplayError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Run every step through a fresh controller.
    ///
    /// Steps must be in non-decreasing time order; nothing is run if they
    /// are not.
    pub fn run(&self, policy: IntakePolicy) -> Result<Vec<ReplayRecord>, ReplayError> {
        let mut previous_ms = 0;
        for (index, step) in self.steps.iter().enumerate() {
            if step.at_ms < previous_ms {
                return Err(ReplayError::OutOfOrder {
                    index,
                    at_ms: step.at_ms,
                    previous_ms,
                });
            }
            previous_ms = step.at_ms;
        }

        let mut controller =
            PageController::new(policy, self.route.clone(), ViewTime::ZERO).with_clipboard(self.clipboard);
        let records = self
            .steps
            .iter()
            .map(|step| ReplayRecord {
                at_ms: step.at_ms,
                event: step.event.name().to_string(),
                effects: controller.dispatch(ViewTime::from_millis(step.at_ms), step.event.clone()),
            })
            .collect();
        Ok(records)
    }
}
