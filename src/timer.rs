//! Deterministic timer queue
//!
//! Stands in for the event loop's macrotask timers: the poll tick, the
//! notification expiry/detach timers, the hint debounce and the in-page
//! submit timeout. Timers fire in `(due, id)` order, so two timers due at
//! the same instant fire in the order they were scheduled.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::clock::ViewTime;

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(u64);

/// Ordered set of pending timers carrying a payload of type `K`.
#[derive(Debug)]
pub struct TimerQueue<K> {
    pending: BTreeMap<(ViewTime, TimerId), K>,
    due_at: HashMap<TimerId, ViewTime>,
    next_id: u64,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self {
            pending: BTreeMap::new(),
            due_at: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<K> TimerQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `payload` to fire at `due`.
    pub fn schedule(&mut self, due: ViewTime, payload: K) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.insert((due, id), payload);
        self.due_at.insert(id, due);
        id
    }

    /// Cancel a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.due_at.remove(&id) {
            Some(due) => self.pending.remove(&(due, id)).is_some(),
            None => false,
        }
    }

    /// Whether the timer is still pending.
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.due_at.contains_key(&id)
    }

    /// Remove and return the earliest timer due at or before `now`.
    pub fn pop_due(&mut self, now: ViewTime) -> Option<(TimerId, K)> {
        let key = *self.pending.keys().next()?;
        if key.0 > now {
            return None;
        }
        let payload = self.pending.remove(&key)?;
        self.due_at.remove(&key.1);
        Some((key.1, payload))
    }

    /// Due time of the earliest pending timer.
    pub fn next_due(&self) -> Option<ViewTime> {
        self.pending.keys().next().map(|(due, _)| *due)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every pending timer.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.due_at.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_due_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(ViewTime::from_millis(300), "late");
        timers.schedule(ViewTime::from_millis(100), "early");

        assert_eq!(timers.next_due(), Some(ViewTime::from_millis(100)));
        assert!(timers.pop_due(ViewTime::from_millis(50)).is_none());
        assert_eq!(timers.pop_due(ViewTime::from_millis(300)).map(|t| t.1), Some("early"));
        assert_eq!(timers.pop_due(ViewTime::from_millis(300)).map(|t| t.1), Some("late"));
        assert!(timers.is_empty());
    }

    #[test]
    fn test_same_instant_keeps_schedule_order() {
        let mut timers = TimerQueue::new();
        let at = ViewTime::from_millis(10);
        timers.schedule(at, 1);
        timers.schedule(at, 2);
        timers.schedule(at, 3);

        let fired: Vec<_> = std::iter::from_fn(|| timers.pop_due(at).map(|t| t.1)).collect();
        assert_eq!(fired, vec![1, 2, 3]);
    }

    #[test]
    fn test_cancel() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule(ViewTime::from_millis(10), ());
        assert!(timers.is_pending(id));
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert!(!timers.is_pending(id));
        assert!(timers.pop_due(ViewTime::from_millis(100)).is_none());
    }

    #[test]
    fn test_cancel_after_fire_is_noop() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule(ViewTime::from_millis(10), ());
        assert!(timers.pop_due(ViewTime::from_millis(10)).is_some());
        assert!(!timers.cancel(id));
    }

    #[test]
    fn test_clear() {
        let mut timers = TimerQueue::new();
        timers.schedule(ViewTime::from_millis(1), 'a');
        timers.schedule(ViewTime::from_millis(2), 'b');
        timers.clear();
        assert_eq!(timers.len(), 0);
        assert_eq!(timers.next_due(), None);
    }
}
