//! Event records and their classification.

use crate::time::SimTime;
use serde::Serialize;
use std::fmt;

/// What an event means to the engine.
///
/// The six baseline kinds drive the generic arrival/processing pipeline.
/// `Custom` kinds name domain-specific events that are handled by a
/// registered direct handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum EventKind {
    SimulationStart,
    SimulationEnd,
    ExternalArrival,
    InternalArrival,
    ProcessStart,
    ProcessEnd,
    /// A domain-specific event, identified by a static name.
    Custom(&'static str),
}

impl EventKind {
    /// Snake-case name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::SimulationStart => "simulation_start",
            EventKind::SimulationEnd => "simulation_end",
            EventKind::ExternalArrival => "external_arrival",
            EventKind::InternalArrival => "internal_arrival",
            EventKind::ProcessStart => "process_start",
            EventKind::ProcessEnd => "process_end",
            EventKind::Custom(name) => name,
        }
    }

    /// Whether this is the run-termination marker.
    pub fn is_simulation_end(&self) -> bool {
        matches!(self, EventKind::SimulationEnd)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Behavioural category used when a kind has no direct handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum EventFamily {
    Start,
    End,
    ExternalArrival,
    InternalArrival,
    ProcessStart,
    ProcessEnd,
}

impl EventFamily {
    /// The default classifier: each baseline kind belongs to its namesake
    /// family, custom kinds belong to none.
    pub fn classify(kind: &EventKind) -> Option<EventFamily> {
        match kind {
            EventKind::SimulationStart => Some(EventFamily::Start),
            EventKind::SimulationEnd => Some(EventFamily::End),
            EventKind::ExternalArrival => Some(EventFamily::ExternalArrival),
            EventKind::InternalArrival => Some(EventFamily::InternalArrival),
            EventKind::ProcessStart => Some(EventFamily::ProcessStart),
            EventKind::ProcessEnd => Some(EventFamily::ProcessEnd),
            EventKind::Custom(_) => None,
        }
    }
}

impl fmt::Display for EventFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventFamily::Start => "start",
            EventFamily::End => "end",
            EventFamily::ExternalArrival => "external_arrival",
            EventFamily::InternalArrival => "internal_arrival",
            EventFamily::ProcessStart => "process_start",
            EventFamily::ProcessEnd => "process_end",
        };
        f.write_str(name)
    }
}

/// Key for ordering events in the queue.
///
/// Events are ordered by:
/// 1. Time (earlier first)
/// 2. Sequence number (FIFO for equal times)
///
/// Also serves as the handle returned by `schedule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey {
    /// When this event fires.
    pub time: SimTime,
    /// Creation order within the run.
    pub sequence: u64,
}

/// A scheduled occurrence.
///
/// Fields are private: once created, an event's time and sequence cannot
/// change.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<P> {
    time: SimTime,
    kind: EventKind,
    payload: P,
    sequence: u64,
}

impl<P> Event<P> {
    pub(crate) fn new(key: EventKey, kind: EventKind, payload: P) -> Self {
        Self {
            time: key.time,
            kind,
            payload,
            sequence: key.sequence,
        }
    }

    /// When the event fires.
    #[inline]
    pub fn time(&self) -> SimTime {
        self.time
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Kind-specific data; only handlers interpret it.
    #[inline]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The queue key of this event.
    pub fn key(&self) -> EventKey {
        EventKey {
            time: self.time,
            sequence: self.sequence,
        }
    }

    /// Payload-free summary, handed to observers.
    pub fn record(&self) -> EventRecord {
        EventRecord {
            time: self.time,
            kind: self.kind,
            sequence: self.sequence,
        }
    }

    /// Take the payload, consuming the event.
    pub fn into_payload(self) -> P {
        self.payload
    }
}

/// What was dispatched, without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    pub time: SimTime,
    pub kind: EventKind,
    pub sequence: u64,
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{} {}", self.time, self.sequence, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(time: f64, sequence: u64) -> EventKey {
        EventKey {
            time: SimTime::new(time).unwrap(),
            sequence,
        }
    }

    #[test]
    fn test_event_key_ordering() {
        assert!(key(1.0, 5) < key(2.0, 1));
    }

    #[test]
    fn test_sequence_breaks_ties() {
        assert!(key(3.0, 1) < key(3.0, 2), "Lower sequence should come first");
    }

    #[test]
    fn test_default_classifier() {
        assert_eq!(
            EventFamily::classify(&EventKind::ExternalArrival),
            Some(EventFamily::ExternalArrival)
        );
        assert_eq!(
            EventFamily::classify(&EventKind::SimulationEnd),
            Some(EventFamily::End)
        );
        assert_eq!(EventFamily::classify(&EventKind::Custom("reject")), None);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(EventKind::ProcessStart.to_string(), "process_start");
        assert_eq!(EventKind::Custom("master_send").to_string(), "master_send");
    }

    #[test]
    fn test_record_matches_event() {
        let event = Event::new(key(2.0, 7), EventKind::ProcessEnd, ());
        let record = event.record();
        assert_eq!(record.time, event.time());
        assert_eq!(record.sequence, 7);
        assert_eq!(record.kind, EventKind::ProcessEnd);
        assert_eq!(event.key(), key(2.0, 7));
    }

    #[test]
    fn test_into_payload_hands_back_the_payload() {
        let event = Event::new(key(0.5, 1), EventKind::InternalArrival, vec![3_u32, 4]);
        assert_eq!(event.into_payload(), vec![3, 4]);
    }
}
