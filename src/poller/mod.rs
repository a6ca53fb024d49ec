//! Progress poller
//!
//! Re-synchronizes a pending long-running operation's view with the status
//! the server reports. Polling only starts on routes that represent such an
//! operation (the approval queue and the per-upload progress pages).
//!
//! ## Skip guard
//!
//! A tick never refreshes while a modal dialog is open or a control holds
//! focus. The tick is skipped and the next one comes at the regular cadence;
//! nothing is queued. The check is best-effort: the user may start
//! interacting between the check and the refresh, which is harmless because
//! a refresh only reads.
//!
//! ## Cadence
//!
//! Fixed interval (30 s baseline), no backoff. Optional jitter adds a
//! uniform `0..=jitter` delay on top of the interval, never below it.

mod state;

pub use state::{PollerError, PollerState, TerminalState};

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use emailflow_protocol::{ProgressSnapshot, ProgressStatus};

use crate::clock::ViewTime;

/// Baseline poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// How a tick refreshes the view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshStrategy {
    /// Fetch the status endpoint and patch the progress display.
    #[default]
    Partial,
    /// Reload the whole view.
    Reload,
}

/// Configuration for the poller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub jitter: Duration,
    pub refresh: RefreshStrategy,
    /// Route prefixes on which polling starts.
    pub routes: Vec<String>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            jitter: Duration::ZERO,
            refresh: RefreshStrategy::default(),
            routes: vec![
                emailflow_protocol::APPROVAL_ROUTE.to_string(),
                emailflow_protocol::UPLOAD_PROGRESS_ROUTE.to_string(),
            ],
        }
    }
}

/// What the user is doing right now, as far as the skip guard cares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub modal_open: bool,
    pub focus_held: bool,
}

/// Why a tick did not refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    ModalOpen,
    FocusHeld,
}

/// Outcome of a poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    /// Refresh now, then schedule the next tick.
    Refresh(RefreshStrategy),
    /// Leave the view alone this cycle, retry on the next tick.
    Skipped(SkipReason),
    /// Not polling; no further ticks.
    Inactive,
}

/// Poller for one view.
#[derive(Debug)]
pub struct ProgressPoller {
    config: PollerConfig,
    state: PollerState,
    latest: Option<ProgressSnapshot>,
    refreshes: u64,
    skipped: u64,
}

impl ProgressPoller {
    pub fn new(config: PollerConfig) -> Self {
        Self {
            config,
            state: PollerState::Idle,
            latest: None,
            refreshes: 0,
            skipped: 0,
        }
    }

    /// Whether `route` is a page that tracks a pending operation.
    pub fn is_eligible(&self, route: &str) -> bool {
        let path = route.split(['?', '#']).next().unwrap_or(route);
        self.config.routes.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            path == prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Start polling if the route qualifies.
    ///
    /// Returns the time of the first tick, or `None` when the route is not
    /// polling-eligible.
    pub fn activate(&mut self, route: &str, now: ViewTime) -> Result<Option<ViewTime>, PollerError> {
        if !self.is_eligible(route) {
            return Ok(None);
        }
        self.transition(PollerState::Polling)?;
        tracing::debug!(route, interval_ms = self.config.interval.as_millis() as u64, "poller activated");
        Ok(Some(now + self.next_delay()))
    }

    /// Delay until the next tick.
    pub fn next_delay(&self) -> Duration {
        let jitter_ms = u64::try_from(self.config.jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return self.config.interval;
        }
        let extra = rand::thread_rng().gen_range(0..=jitter_ms);
        self.config.interval + Duration::from_millis(extra)
    }

    /// Decide what a tick does.
    pub fn on_tick(&mut self, interaction: Interaction) -> TickDecision {
        if self.state != PollerState::Polling {
            return TickDecision::Inactive;
        }

        let skip = if interaction.modal_open {
            Some(SkipReason::ModalOpen)
        } else if interaction.focus_held {
            Some(SkipReason::FocusHeld)
        } else {
            None
        };

        match skip {
            Some(reason) => {
                self.skipped += 1;
                tracing::debug!(?reason, "poll tick skipped");
                TickDecision::Skipped(reason)
            }
            None => {
                self.refreshes += 1;
                TickDecision::Refresh(self.config.refresh)
            }
        }
    }

    /// Record a status report, replacing the previous one.
    ///
    /// Returns the terminal state entered, if the report ended polling.
    pub fn observe(&mut self, snapshot: ProgressSnapshot) -> Result<Option<PollerState>, PollerError> {
        if self.state.is_terminal() {
            return Ok(None);
        }
        self.latest = Some(snapshot);

        if self.state != PollerState::Polling {
            return Ok(None);
        }

        let target = match snapshot.status {
            ProgressStatus::Done => PollerState::TerminalDone,
            ProgressStatus::Failed => PollerState::TerminalFailed,
            ProgressStatus::Pending | ProgressStatus::Running => return Ok(None),
        };
        self.transition(target)?;
        tracing::info!(state = ?target, percent = snapshot.percent, "polling finished");
        Ok(Some(target))
    }

    fn transition(&mut self, target: PollerState) -> Result<(), PollerError> {
        if !self.state.can_transition_to(target) {
            return Err(PollerError::InvalidTransition {
                from: self.state,
                to: target,
            });
        }
        self.state = target;
        Ok(())
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub fn is_polling(&self) -> bool {
        self.state == PollerState::Polling
    }

    /// Latest reported snapshot; no history is kept.
    pub fn latest(&self) -> Option<ProgressSnapshot> {
        self.latest
    }

    pub fn refresh_count(&self) -> u64 {
        self.refreshes
    }

    pub fn skipped_count(&self) -> u64 {
        self.skipped
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poller() -> ProgressPoller {
        ProgressPoller::new(PollerConfig::default())
    }

    #[test]
    fn test_route_eligibility() {
        let p = poller();
        assert!(p.is_eligible("/approval"));
        assert!(p.is_eligible("/approval/"));
        assert!(p.is_eligible("/approval/65f0c2?status=pending"));
        assert!(p.is_eligible("/emails/upload/progress/abc"));
        assert!(!p.is_eligible("/approvals"));
        assert!(!p.is_eligible("/emails/upload"));
        assert!(!p.is_eligible("/"));
    }

    #[test]
    fn test_activate_on_ineligible_route_stays_idle() {
        let mut p = poller();
        assert_eq!(p.activate("/emails", ViewTime::ZERO).unwrap(), None);
        assert_eq!(p.state(), PollerState::Idle);
        assert_eq!(p.on_tick(Interaction::default()), TickDecision::Inactive);
    }

    #[test]
    fn test_activate_schedules_first_tick() {
        let mut p = poller();
        let first = p.activate("/approval", ViewTime::from_secs(1)).unwrap();
        assert_eq!(first, Some(ViewTime::from_secs(31)));
        assert!(p.is_polling());
    }

    #[test]
    fn test_double_activation_is_rejected() {
        let mut p = poller();
        p.activate("/approval", ViewTime::ZERO).unwrap();
        assert!(matches!(
            p.activate("/approval", ViewTime::ZERO),
            Err(PollerError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_skip_guard() {
        let mut p = poller();
        p.activate("/approval", ViewTime::ZERO).unwrap();

        let modal = Interaction {
            modal_open: true,
            focus_held: true,
        };
        assert_eq!(p.on_tick(modal), TickDecision::Skipped(SkipReason::ModalOpen));

        let focus = Interaction {
            modal_open: false,
            focus_held: true,
        };
        assert_eq!(p.on_tick(focus), TickDecision::Skipped(SkipReason::FocusHeld));

        assert_eq!(
            p.on_tick(Interaction::default()),
            TickDecision::Refresh(RefreshStrategy::Partial)
        );
        assert_eq!(p.skipped_count(), 2);
        assert_eq!(p.refresh_count(), 1);
    }

    #[test]
    fn test_terminal_snapshot_stops_polling() {
        let mut p = poller();
        p.activate("/emails/upload/progress/x", ViewTime::ZERO).unwrap();

        let running = ProgressSnapshot::new(ProgressStatus::Running, 40);
        assert_eq!(p.observe(running).unwrap(), None);
        assert_eq!(p.latest(), Some(running));

        let done = ProgressSnapshot::new(ProgressStatus::Done, 100);
        assert_eq!(p.observe(done).unwrap(), Some(PollerState::TerminalDone));
        assert_eq!(p.on_tick(Interaction::default()), TickDecision::Inactive);

        // Late reports after a terminal state are ignored.
        assert_eq!(p.observe(running).unwrap(), None);
        assert_eq!(p.latest(), Some(done));
    }

    #[test]
    fn test_failed_snapshot() {
        let mut p = poller();
        p.activate("/approval", ViewTime::ZERO).unwrap();
        let failed = ProgressSnapshot::new(ProgressStatus::Failed, 10);
        assert_eq!(p.observe(failed).unwrap(), Some(PollerState::TerminalFailed));
    }

    #[test]
    fn test_jitter_keeps_baseline() {
        let p = ProgressPoller::new(PollerConfig {
            jitter: Duration::from_millis(500),
            ..PollerConfig::default()
        });
        for _ in 0..50 {
            let d = p.next_delay();
            assert!(d >= Duration::from_secs(30));
            assert!(d <= Duration::from_millis(30_500));
        }
    }
}
