//! Transient notification channel
//!
//! At most one auto notification is visible at a time: showing a new one
//! first fades out and then detaches every notification this channel is
//! still showing. Each notification expires on its own after its duration
//! unless the user closes it first; closing cancels the pending expiry so
//! the element is never removed twice.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::clock::ViewTime;
use crate::timer::{TimerId, TimerQueue};

/// Default time a notification stays up.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(5000);

/// Default fade-out time before a notification is detached.
pub const DEFAULT_FADE: Duration = Duration::from_millis(150);

/// Severity of a notification; maps onto the page's alert styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Danger,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Warning => write!(f, "warning"),
            Severity::Danger => write!(f, "danger"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Shown,
    FadingOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub text: String,
    pub severity: Severity,
    pub expires_at: ViewTime,
    pub phase: Phase,
    expiry_timer: Option<TimerId>,
}

/// Returned by [`NotificationChannel::notify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationHandle {
    pub id: NotificationId,
    pub expires_at: ViewTime,
}

/// Timers the channel schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelTimer {
    Expire(NotificationId),
    Detach(NotificationId),
}

/// Display changes the host has to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelChange {
    Shown {
        id: NotificationId,
        text: String,
        severity: Severity,
    },
    FadingOut(NotificationId),
    Detached(NotificationId),
}

#[derive(Debug)]
pub struct NotificationChannel {
    active: Vec<Notification>,
    next_id: u64,
    duration: Duration,
    fade: Duration,
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION, DEFAULT_FADE)
    }
}

impl NotificationChannel {
    pub fn new(duration: Duration, fade: Duration) -> Self {
        Self {
            active: Vec::new(),
            next_id: 0,
            duration,
            fade,
        }
    }

    /// Show a notification for the channel's default duration.
    pub fn notify<T: From<ChannelTimer>>(
        &mut self,
        text: impl Into<String>,
        severity: Severity,
        now: ViewTime,
        timers: &mut TimerQueue<T>,
    ) -> (NotificationHandle, Vec<ChannelChange>) {
        let duration = self.duration;
        self.notify_for(text, severity, duration, now, timers)
    }

    /// Show a notification, superseding whatever this channel shows.
    pub fn notify_for<T: From<ChannelTimer>>(
        &mut self,
        text: impl Into<String>,
        severity: Severity,
        duration: Duration,
        now: ViewTime,
        timers: &mut TimerQueue<T>,
    ) -> (NotificationHandle, Vec<ChannelChange>) {
        let mut changes = Vec::new();

        let shown: Vec<NotificationId> = self
            .active
            .iter()
            .filter(|n| n.phase == Phase::Shown)
            .map(|n| n.id)
            .collect();
        for id in shown {
            changes.extend(self.fade_out(id, now, timers));
        }

        let id = NotificationId(self.next_id);
        self.next_id += 1;
        let expires_at = now + duration;
        let expiry_timer = timers.schedule(expires_at, ChannelTimer::Expire(id).into());
        let text = text.into();

        tracing::debug!(?id, %severity, %text, "notification shown");
        changes.push(ChannelChange::Shown {
            id,
            text: text.clone(),
            severity,
        });
        self.active.push(Notification {
            id,
            text,
            severity,
            expires_at,
            phase: Phase::Shown,
            expiry_timer: Some(expiry_timer),
        });

        (NotificationHandle { id, expires_at }, changes)
    }

    /// Close a notification on user request.
    pub fn dismiss<T: From<ChannelTimer>>(
        &mut self,
        id: NotificationId,
        now: ViewTime,
        timers: &mut TimerQueue<T>,
    ) -> Vec<ChannelChange> {
        self.fade_out(id, now, timers).into_iter().collect()
    }

    /// Handle one of the channel's timers firing.
    ///
    /// Timers for notifications that are already gone are ignored.
    pub fn on_timer<T: From<ChannelTimer>>(
        &mut self,
        timer: ChannelTimer,
        now: ViewTime,
        timers: &mut TimerQueue<T>,
    ) -> Vec<ChannelChange> {
        match timer {
            ChannelTimer::Expire(id) => {
                if let Some(n) = self.active.iter_mut().find(|n| n.id == id) {
                    n.expiry_timer = None;
                }
                self.fade_out(id, now, timers).into_iter().collect()
            }
            ChannelTimer::Detach(id) => {
                let before = self.active.len();
                self.active.retain(|n| n.id != id);
                if self.active.len() < before {
                    vec![ChannelChange::Detached(id)]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn fade_out<T: From<ChannelTimer>>(
        &mut self,
        id: NotificationId,
        now: ViewTime,
        timers: &mut TimerQueue<T>,
    ) -> Option<ChannelChange> {
        let n = self
            .active
            .iter_mut()
            .find(|n| n.id == id && n.phase == Phase::Shown)?;
        if let Some(timer) = n.expiry_timer.take() {
            timers.cancel(timer);
        }
        n.phase = Phase::FadingOut;
        timers.schedule(now + self.fade, ChannelTimer::Detach(id).into());
        Some(ChannelChange::FadingOut(id))
    }

    /// Notifications currently on screen and not on their way out.
    pub fn visible(&self) -> impl Iterator<Item = &Notification> {
        self.active.iter().filter(|n| n.phase == Phase::Shown)
    }

    /// Every notification still attached, including fading ones.
    pub fn attached(&self) -> &[Notification] {
        &self.active
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.active.iter().find(|n| n.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Timers = TimerQueue<ChannelTimer>;

    fn fire_due(channel: &mut NotificationChannel, timers: &mut Timers, now: ViewTime) -> Vec<ChannelChange> {
        let mut changes = Vec::new();
        while let Some((_, timer)) = timers.pop_due(now) {
            changes.extend(channel.on_timer(timer, now, timers));
        }
        changes
    }

    #[test]
    fn test_second_notify_supersedes_first() {
        let mut channel = NotificationChannel::default();
        let mut timers = Timers::new();

        let (first, _) = channel.notify("first", Severity::Info, ViewTime::ZERO, &mut timers);
        let (second, changes) =
            channel.notify("second", Severity::Success, ViewTime::from_millis(10), &mut timers);

        assert_eq!(changes[0], ChannelChange::FadingOut(first.id));
        assert!(matches!(&changes[1], ChannelChange::Shown { id, .. } if *id == second.id));

        let visible: Vec<_> = channel.visible().map(|n| n.text.as_str()).collect();
        assert_eq!(visible, vec!["second"]);

        // After the fade the first one is gone for good.
        let changes = fire_due(&mut channel, &mut timers, ViewTime::from_millis(200));
        assert_eq!(changes, vec![ChannelChange::Detached(first.id)]);
        assert_eq!(channel.attached().len(), 1);
    }

    #[test]
    fn test_auto_expiry() {
        let mut channel = NotificationChannel::default();
        let mut timers = Timers::new();
        let (handle, _) = channel.notify("saved", Severity::Success, ViewTime::ZERO, &mut timers);
        assert_eq!(handle.expires_at, ViewTime::from_millis(5000));

        assert!(fire_due(&mut channel, &mut timers, ViewTime::from_millis(4999)).is_empty());
        assert_eq!(
            fire_due(&mut channel, &mut timers, ViewTime::from_millis(5000)),
            vec![ChannelChange::FadingOut(handle.id)]
        );
        assert_eq!(
            fire_due(&mut channel, &mut timers, ViewTime::from_millis(5150)),
            vec![ChannelChange::Detached(handle.id)]
        );
        assert!(timers.is_empty());
    }

    #[test]
    fn test_dismiss_cancels_expiry() {
        let mut channel = NotificationChannel::default();
        let mut timers = Timers::new();
        let (handle, _) = channel.notify("oops", Severity::Danger, ViewTime::ZERO, &mut timers);

        let changes = channel.dismiss(handle.id, ViewTime::from_millis(100), &mut timers);
        assert_eq!(changes, vec![ChannelChange::FadingOut(handle.id)]);
        // Only the detach timer is left; the expiry timer was cancelled.
        assert_eq!(timers.len(), 1);

        let changes = fire_due(&mut channel, &mut timers, ViewTime::from_millis(10_000));
        assert_eq!(changes, vec![ChannelChange::Detached(handle.id)]);
    }

    #[test]
    fn test_double_dismiss_is_noop() {
        let mut channel = NotificationChannel::default();
        let mut timers = Timers::new();
        let (handle, _) = channel.notify("x", Severity::Info, ViewTime::ZERO, &mut timers);
        channel.dismiss(handle.id, ViewTime::ZERO, &mut timers);
        assert!(channel.dismiss(handle.id, ViewTime::ZERO, &mut timers).is_empty());
    }

    #[test]
    fn test_stale_timers_are_ignored() {
        let mut channel = NotificationChannel::default();
        let mut timers = Timers::new();
        let (handle, _) = channel.notify("x", Severity::Info, ViewTime::ZERO, &mut timers);
        fire_due(&mut channel, &mut timers, ViewTime::from_secs(60));
        assert!(channel.get(handle.id).is_none());

        let now = ViewTime::from_secs(61);
        assert!(channel.on_timer(ChannelTimer::Expire(handle.id), now, &mut timers).is_empty());
        assert!(channel.on_timer(ChannelTimer::Detach(handle.id), now, &mut timers).is_empty());
    }

    #[test]
    fn test_custom_duration() {
        let mut channel = NotificationChannel::default();
        let mut timers = Timers::new();
        let (handle, _) = channel.notify_for(
            "brief",
            Severity::Warning,
            Duration::from_millis(800),
            ViewTime::from_millis(200),
            &mut timers,
        );
        assert_eq!(handle.expires_at, ViewTime::from_millis(1000));
    }

    #[test]
    fn test_severity_wire_names() {
        assert_eq!(serde_json::to_string(&Severity::Danger).unwrap(), "\"danger\"");
        assert_eq!(Severity::Warning.to_string(), "warning");
    }
}
