//! Trailing debounce for input-driven hints.
//!
//! Only the value present once input has paused for the configured delay is
//! delivered. There is no leading-edge mode.

use std::time::Duration;

use crate::clock::ViewTime;
use crate::timer::{TimerId, TimerQueue};

/// Default pause before a hint is shown.
pub const DEFAULT_HINT_DELAY: Duration = Duration::from_millis(300);

/// Timer payload scheduled by the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceFired;

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<(TimerId, String)>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Record new input, restarting the delay.
    pub fn input<T: From<DebounceFired>>(
        &mut self,
        value: impl Into<String>,
        now: ViewTime,
        timers: &mut TimerQueue<T>,
    ) {
        if let Some((timer, _)) = self.pending.take() {
            timers.cancel(timer);
        }
        let timer = timers.schedule(now + self.delay, DebounceFired.into());
        self.pending = Some((timer, value.into()));
    }

    /// Deliver the settled value when timer `id` fires.
    ///
    /// Returns `None` for a timer that was superseded by later input.
    pub fn fire(&mut self, id: TimerId) -> Option<String> {
        let current = matches!(&self.pending, Some((timer, _)) if *timer == id);
        if current {
            self.pending.take().map(|(_, value)| value)
        } else {
            None
        }
    }

    /// Drop pending input without delivering it.
    pub fn cancel<T>(&mut self, timers: &mut TimerQueue<T>) -> bool {
        match self.pending.take() {
            Some((timer, _)) => timers.cancel(timer),
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
