//! Poller state machine
//!
//! States: IDLE → POLLING → {TERMINAL_DONE | TERMINAL_FAILED}

use serde::{Deserialize, Serialize};

/// Check if a state is terminal (no further transitions possible)
pub trait TerminalState {
    fn is_terminal(&self) -> bool;
}

/// Poller state enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PollerState {
    /// Not on a page that tracks a long-running operation
    Idle,
    /// Re-checking status on a fixed interval
    Polling,
    /// Operation finished successfully
    TerminalDone,
    /// Operation failed
    TerminalFailed,
}

impl TerminalState for PollerState {
    fn is_terminal(&self) -> bool {
        matches!(self, PollerState::TerminalDone | PollerState::TerminalFailed)
    }
}

impl PollerState {
    /// Check if transition from this state to target is valid
    pub fn can_transition_to(&self, target: PollerState) -> bool {
        matches!(
            (self, target),
            (PollerState::Idle, PollerState::Polling)
                | (PollerState::Polling, PollerState::TerminalDone)
                | (PollerState::Polling, PollerState::TerminalFailed)
        )
    }
}

/// Errors for poller state operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollerError {
    #[error("Invalid poller transition from {from:?} to {to:?}")]
    InvalidTransition { from: PollerState, to: PollerState },
}
