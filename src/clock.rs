//! View-relative time.
//!
//! Every component measures time as milliseconds since the page view was
//! mounted. The host supplies the current `ViewTime` with each event, so the
//! whole subsystem runs without a real clock and tests never sleep.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::time::Duration;

/// Milliseconds elapsed since the view was mounted.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ViewTime(u64);

impl ViewTime {
    /// The instant the view was mounted.
    pub const ZERO: ViewTime = ViewTime(0);

    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1000)
    }

    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Time elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn since(&self, earlier: ViewTime) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for ViewTime {
    type Output = ViewTime;

    fn add(self, rhs: Duration) -> ViewTime {
        let ms = u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX);
        ViewTime(self.0.saturating_add(ms))
    }
}

impl fmt::Display for ViewTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_duration() {
        let t = ViewTime::from_secs(2) + Duration::from_millis(250);
        assert_eq!(t.as_millis(), 2250);
    }

    #[test]
    fn test_add_saturates() {
        let t = ViewTime::from_millis(u64::MAX - 1) + Duration::from_secs(10);
        assert_eq!(t.as_millis(), u64::MAX);
    }

    #[test]
    fn test_since() {
        let a = ViewTime::from_millis(100);
        let b = ViewTime::from_millis(350);
        assert_eq!(b.since(a), Duration::from_millis(250));
        assert_eq!(a.since(b), Duration::ZERO);
    }
}
