//! Error types for the simulation engine.

use crate::event::{EventFamily, EventKind};
use crate::identifiers::{RunIndex, StationId};
use crate::time::SimTime;
use thiserror::Error;

/// Errors raised while scheduling or dispatching events.
///
/// `Clone + PartialEq` so that failed run results can be compared when
/// checking determinism.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// An event was scheduled before the current clock time, or at a time
    /// that is not a valid simulated time.
    #[error("cannot schedule {kind} at {requested} when clock is at {now}")]
    InvalidTime {
        kind: EventKind,
        requested: f64,
        now: SimTime,
    },

    /// The queue yielded an event earlier than the clock. Indicates a queue
    /// bug and aborts the run.
    #[error("clock regression: event at {event_time} popped while clock is at {now}")]
    ClockRegression { now: SimTime, event_time: SimTime },

    /// No direct handler and no family handler for this kind.
    #[error("no handler for event kind {kind} (dispatched at {time})")]
    UnknownEventKind { kind: EventKind, time: SimTime },

    /// A direct handler was registered twice for the same kind.
    #[error("handler already registered for event kind {0}")]
    HandlerAlreadyRegistered(EventKind),

    /// A family handler was registered twice.
    #[error("handler already registered for event family {0}")]
    FamilyAlreadyRegistered(EventFamily),

    /// The time horizon is not a valid simulated time.
    #[error("invalid time horizon: {0}")]
    InvalidHorizon(f64),

    /// An event targeted a station the world does not contain.
    #[error("unknown target {0}")]
    UnknownStation(StationId),

    /// An event that must carry a target or message did not.
    #[error("{kind} event carries no {missing}")]
    MissingPayload {
        kind: EventKind,
        missing: &'static str,
    },

    /// A run failed and the batch was configured to stop on first failure.
    #[error("batch aborted in run {run}: {source}")]
    BatchAborted {
        run: RunIndex,
        source: Box<EngineError>,
    },
}

/// Convenience alias for `Result<T, EngineError>`.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_time() {
        let e = EngineError::InvalidTime {
            kind: EventKind::ProcessEnd,
            requested: 3.0,
            now: SimTime::new(10.0).unwrap(),
        };
        let s = e.to_string();
        assert!(s.contains("process_end"));
        assert!(s.contains("T=10.000"));
    }

    #[test]
    fn test_display_unknown_kind_names_kind() {
        let e = EngineError::UnknownEventKind {
            kind: EventKind::InternalArrival,
            time: SimTime::ZERO,
        };
        assert!(e.to_string().contains("internal_arrival"));
    }

    #[test]
    fn test_batch_aborted_keeps_source() {
        let e = EngineError::BatchAborted {
            run: 2,
            source: Box::new(EngineError::UnknownStation(StationId(9))),
        };
        let s = e.to_string();
        assert!(s.contains("run 2"));
        assert!(s.contains("Station(9)"));
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn test_error_is_std_error() {
        let e: Box<dyn std::error::Error> = Box::new(EngineError::InvalidHorizon(-1.0));
        assert!(!e.to_string().is_empty());
    }
}
