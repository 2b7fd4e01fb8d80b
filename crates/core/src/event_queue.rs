//! Event queue with deterministic ordering.

use crate::error::{EngineError, EngineResult};
use crate::event::{Event, EventKey, EventKind};
use crate::time::SimTime;
use std::collections::BTreeMap;

/// Pending events of one run, ordered by `(time, sequence)`.
///
/// Equal timestamps pop in the order they were scheduled. An empty queue is
/// a normal terminal state, not an error.
#[derive(Debug, Clone)]
pub struct EventQueue<P> {
    events: BTreeMap<EventKey, Event<P>>,

    /// Sequence counter for FIFO tie-breaking.
    sequence: u64,

    /// Key of the SIMULATION_END event, once one has been scheduled.
    end: Option<EventKey>,
}

impl<P> Default for EventQueue<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> EventQueue<P> {
    pub fn new() -> Self {
        Self {
            events: BTreeMap::new(),
            sequence: 0,
            end: None,
        }
    }

    /// Insert an event at `time`.
    ///
    /// Fails with [`EngineError::InvalidTime`] if `time` is before `now`.
    /// Scheduling SIMULATION_END a second time is a no-op that returns the
    /// key of the first one.
    pub fn schedule(
        &mut self,
        now: SimTime,
        time: SimTime,
        kind: EventKind,
        payload: P,
    ) -> EngineResult<EventKey> {
        if time < now {
            return Err(EngineError::InvalidTime {
                kind,
                requested: time.as_secs(),
                now,
            });
        }
        if kind.is_simulation_end() {
            if let Some(key) = self.end {
                return Ok(key);
            }
        }

        self.sequence += 1;
        let key = EventKey {
            time,
            sequence: self.sequence,
        };
        self.events.insert(key, Event::new(key, kind, payload));
        if kind.is_simulation_end() {
            self.end = Some(key);
        }
        Ok(key)
    }

    /// Remove and return the earliest event, or `None` when drained.
    pub fn pop_earliest(&mut self) -> Option<Event<P>> {
        self.events.pop_first().map(|(_, event)| event)
    }

    /// Time of the earliest pending event.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.events.first_key_value().map(|(key, _)| key.time)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether SIMULATION_END has been scheduled (pending or already popped).
    pub fn end_scheduled(&self) -> bool {
        self.end.is_some()
    }

    /// Drop every pending event and restart the sequence counter.
    pub fn clear(&mut self) {
        self.events.clear();
        self.sequence = 0;
        self.end = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: f64) -> SimTime {
        SimTime::new(secs).unwrap()
    }

    #[test]
    fn test_pops_in_time_order() {
        let mut queue = EventQueue::new();
        queue
            .schedule(SimTime::ZERO, t(30.0), EventKind::ProcessEnd, "late")
            .unwrap();
        queue
            .schedule(SimTime::ZERO, t(10.0), EventKind::ProcessEnd, "early")
            .unwrap();
        queue
            .schedule(SimTime::ZERO, t(20.0), EventKind::ProcessEnd, "mid")
            .unwrap();

        let order: Vec<_> = std::iter::from_fn(|| queue.pop_earliest())
            .map(|e| *e.payload())
            .collect();
        assert_eq!(order, vec!["early", "mid", "late"]);
    }

    #[test]
    fn test_fifo_at_same_time() {
        let mut queue = EventQueue::new();
        for name in ["first", "second", "third"] {
            queue
                .schedule(SimTime::ZERO, t(5.0), EventKind::InternalArrival, name)
                .unwrap();
        }

        let e1 = queue.pop_earliest().unwrap();
        let e2 = queue.pop_earliest().unwrap();
        let e3 = queue.pop_earliest().unwrap();
        assert!(e1.sequence() < e2.sequence());
        assert!(e2.sequence() < e3.sequence());
        assert_eq!(*e1.payload(), "first");
        assert_eq!(*e3.payload(), "third");
    }

    #[test]
    fn test_rejects_past_time() {
        let mut queue: EventQueue<()> = EventQueue::new();
        let err = queue
            .schedule(t(5.0), t(4.5), EventKind::ProcessStart, ())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTime { kind: EventKind::ProcessStart, .. }));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_accepts_current_time() {
        let mut queue: EventQueue<()> = EventQueue::new();
        assert!(queue
            .schedule(t(5.0), t(5.0), EventKind::ProcessStart, ())
            .is_ok());
    }

    #[test]
    fn test_simulation_end_is_idempotent() {
        let mut queue: EventQueue<()> = EventQueue::new();
        let first = queue
            .schedule(SimTime::ZERO, t(10.0), EventKind::SimulationEnd, ())
            .unwrap();
        let second = queue
            .schedule(SimTime::ZERO, t(12.0), EventKind::SimulationEnd, ())
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(queue.len(), 1);

        // Still a no-op once the end event has been popped.
        queue.pop_earliest().unwrap();
        queue
            .schedule(t(10.0), t(10.0), EventKind::SimulationEnd, ())
            .unwrap();
        assert!(queue.is_empty());
        assert!(queue.end_scheduled());
    }

    #[test]
    fn test_peek_time() {
        let mut queue = EventQueue::new();
        assert_eq!(queue.peek_time(), None);
        queue
            .schedule(SimTime::ZERO, t(3.0), EventKind::ExternalArrival, 1)
            .unwrap();
        queue
            .schedule(SimTime::ZERO, t(1.0), EventKind::ExternalArrival, 2)
            .unwrap();
        assert_eq!(queue.peek_time(), Some(t(1.0)));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut queue = EventQueue::new();
        queue
            .schedule(SimTime::ZERO, t(1.0), EventKind::SimulationEnd, ())
            .unwrap();
        queue.clear();
        assert!(queue.is_empty());
        assert!(!queue.end_scheduled());
        let key = queue
            .schedule(SimTime::ZERO, t(1.0), EventKind::SimulationStart, ())
            .unwrap();
        assert_eq!(key.sequence, 1);
    }

    #[test]
    fn test_interleaved_schedule_is_sorted() {
        let mut queue = EventQueue::new();
        let times = [50.0, 10.0, 10.0, 30.0, 10.0, 0.0, 30.0];
        for (i, secs) in times.iter().enumerate() {
            queue
                .schedule(SimTime::ZERO, t(*secs), EventKind::ExternalArrival, i)
                .unwrap();
        }

        let events: Vec<_> = std::iter::from_fn(|| queue.pop_earliest()).collect();
        for window in events.windows(2) {
            assert!(
                window[0].key() < window[1].key(),
                "Events out of order: {:?} vs {:?}",
                window[0],
                window[1]
            );
        }
        // Equal times keep insertion order.
        let tens: Vec<_> = events
            .iter()
            .filter(|e| e.time() == t(10.0))
            .map(|e| *e.payload())
            .collect();
        assert_eq!(tens, vec![1, 2, 4]);
    }
}
