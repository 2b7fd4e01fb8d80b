//! Simulated time.
//!
//! Time only moves when the dispatcher pops an event. Nothing in this module
//! observes the wall clock.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A point in simulated time, in seconds.
///
/// Always finite and non-negative, which makes the ordering total and lets
/// `SimTime` key a `BTreeMap`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub struct SimTime(f64);

impl SimTime {
    /// The start of every run.
    pub const ZERO: SimTime = SimTime(0.0);

    /// Create a time from seconds. Returns `None` for negative, NaN or
    /// infinite values.
    pub fn new(secs: f64) -> Option<Self> {
        if secs.is_finite() && secs >= 0.0 {
            // -0.0 + 0.0 == +0.0
            Some(SimTime(secs + 0.0))
        } else {
            None
        }
    }

    /// Raw seconds.
    #[inline]
    pub fn as_secs(self) -> f64 {
        self.0
    }

    /// The time `delta` seconds after `self`.
    ///
    /// Returns `None` if the result would not be a valid time. A negative
    /// `delta` that stays above zero is allowed here; the event queue is the
    /// one that rejects scheduling into the past.
    pub fn offset(self, delta: f64) -> Option<Self> {
        SimTime::new(self.0 + delta)
    }

    /// Seconds elapsed since `earlier`, or `None` if `earlier` is later.
    pub fn duration_since(self, earlier: SimTime) -> Option<f64> {
        (self >= earlier).then(|| self.0 - earlier.0)
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for SimTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl From<SimTime> for f64 {
    fn from(time: SimTime) -> f64 {
        time.0
    }
}

impl TryFrom<f64> for SimTime {
    type Error = String;

    fn try_from(secs: f64) -> Result<Self, Self::Error> {
        SimTime::new(secs).ok_or_else(|| format!("invalid simulated time: {secs}"))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T={:.3}", self.0)
    }
}

/// The simulated clock of a single run.
///
/// Equal to the time of the most recently dispatched event, or zero before
/// the first dispatch. Never moves backwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clock {
    now: SimTime,
}

impl Default for SimTime {
    fn default() -> Self {
        SimTime::ZERO
    }
}

impl Clock {
    /// A clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time.
    #[inline]
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Move the clock to `time`.
    ///
    /// Fails with [`EngineError::ClockRegression`] if `time` is earlier than
    /// the current time.
    pub fn advance_to(&mut self, time: SimTime) -> EngineResult<()> {
        if time < self.now {
            return Err(EngineError::ClockRegression {
                now: self.now,
                event_time: time,
            });
        }
        self.now = time;
        Ok(())
    }

    /// Back to time zero.
    pub fn reset(&mut self) {
        self.now = SimTime::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: f64) -> SimTime {
        SimTime::new(secs).unwrap()
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(SimTime::new(-1.0).is_none());
        assert!(SimTime::new(f64::NAN).is_none());
        assert!(SimTime::new(f64::INFINITY).is_none());
        assert_eq!(SimTime::new(0.0), Some(SimTime::ZERO));
    }

    #[test]
    fn test_negative_zero_is_zero() {
        let neg = SimTime::new(-0.0).unwrap();
        assert_eq!(neg, SimTime::ZERO);
        assert_eq!(neg.as_secs().to_bits(), 0.0f64.to_bits());
    }

    #[test]
    fn test_ordering() {
        assert!(t(1.5) < t(2.0));
        assert!(t(2.0) > t(0.0));
        assert_eq!(t(3.25), t(3.25));
    }

    #[test]
    fn test_offset() {
        assert_eq!(t(2.0).offset(0.5), Some(t(2.5)));
        assert_eq!(t(2.0).offset(-1.0), Some(t(1.0)));
        assert!(t(2.0).offset(-3.0).is_none());
        assert!(t(2.0).offset(f64::NAN).is_none());
    }

    #[test]
    fn test_duration_since() {
        assert_eq!(t(5.0).duration_since(t(2.0)), Some(3.0));
        assert_eq!(t(2.0).duration_since(t(5.0)), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(t(10.0).to_string(), "T=10.000");
    }

    #[test]
    fn test_clock_advances() {
        let mut clock = Clock::new();
        assert_eq!(clock.now(), SimTime::ZERO);
        clock.advance_to(t(4.0)).unwrap();
        clock.advance_to(t(4.0)).unwrap();
        assert_eq!(clock.now(), t(4.0));
    }

    #[test]
    fn test_clock_regression_is_an_error() {
        let mut clock = Clock::new();
        clock.advance_to(t(4.0)).unwrap();
        let err = clock.advance_to(t(3.0)).unwrap_err();
        assert_eq!(
            err,
            EngineError::ClockRegression {
                now: t(4.0),
                event_time: t(3.0),
            }
        );
        assert_eq!(clock.now(), t(4.0));
    }

    #[test]
    fn test_clock_reset() {
        let mut clock = Clock::new();
        clock.advance_to(t(9.0)).unwrap();
        clock.reset();
        assert_eq!(clock.now(), SimTime::ZERO);
    }
}
