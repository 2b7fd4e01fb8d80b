//! Read-only observation of dispatched events.
//!
//! Observers get a shared borrow of the state, so they cannot schedule
//! events or move the clock.

use crate::state::SimulationState;
use netsim_core::{EventRecord, RunIndex};
use tracing::trace;

/// Receives a record of every dispatched event.
pub trait EventObserver<W, P> {
    /// Called after the handler of `record` has returned.
    fn on_event(&mut self, run: RunIndex, record: &EventRecord, state: &SimulationState<W, P>);

    /// Called once when a run finishes, successfully or not.
    fn on_run_finished(&mut self, _run: RunIndex, _state: &SimulationState<W, P>) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl<W, P> EventObserver<W, P> for NoopObserver {
    fn on_event(&mut self, _run: RunIndex, _record: &EventRecord, _state: &SimulationState<W, P>) {}
}

/// Emits one `trace!` line per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl<W, P> EventObserver<W, P> for TracingObserver {
    fn on_event(&mut self, run: RunIndex, record: &EventRecord, state: &SimulationState<W, P>) {
        trace!(
            run,
            time = record.time.as_secs(),
            kind = %record.kind,
            sequence = record.sequence,
            pending = state.pending(),
            "Event processed"
        );
    }
}

/// Keeps every record, tagged with its run.
#[derive(Debug, Default, Clone)]
pub struct EventTrace {
    records: Vec<(RunIndex, EventRecord)>,
}

impl EventTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[(RunIndex, EventRecord)] {
        &self.records
    }

    /// Records of one run, in dispatch order.
    pub fn run(&self, run: RunIndex) -> impl Iterator<Item = &EventRecord> + '_ {
        self.records
            .iter()
            .filter(move |(r, _)| *r == run)
            .map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<W, P> EventObserver<W, P> for EventTrace {
    fn on_event(&mut self, run: RunIndex, record: &EventRecord, _state: &SimulationState<W, P>) {
        self.records.push((run, *record));
    }
}
