//! One dispatch cycle: pop, advance the clock, invoke the handler.

use crate::registry::HandlerRegistry;
use crate::state::SimulationState;
use netsim_core::{EngineError, EngineResult, EventRecord};
use tracing::trace;

/// Result of a single [`Dispatcher::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The queue was empty; nothing was dispatched.
    Drained,
    /// One event was dispatched.
    Processed(EventRecord),
}

/// Drives events from a state's queue into the registered handlers.
///
/// Strictly sequential: a handler runs to completion before the next event
/// is popped, so events it schedules are never visible to itself.
pub struct Dispatcher<'r, W, P> {
    registry: &'r HandlerRegistry<W, P>,
}

impl<'r, W: 'static, P: 'static> Dispatcher<'r, W, P> {
    pub fn new(registry: &'r HandlerRegistry<W, P>) -> Self {
        Self { registry }
    }

    /// Dispatch the earliest pending event.
    ///
    /// # Errors
    ///
    /// - [`EngineError::ClockRegression`] if the event is earlier than the
    ///   clock (a queue bug).
    /// - [`EngineError::UnknownEventKind`] if neither a direct nor a family
    ///   handler exists for the event's kind.
    /// - Whatever the handler returns.
    pub fn step(&self, state: &mut SimulationState<W, P>) -> EngineResult<Outcome> {
        let Some(event) = state.queue_mut().pop_earliest() else {
            return Ok(Outcome::Drained);
        };

        state.clock_mut().advance_to(event.time())?;

        let handler = self
            .registry
            .resolve(&event.kind())
            .ok_or(EngineError::UnknownEventKind {
                kind: event.kind(),
                time: event.time(),
            })?;

        trace!(
            time = event.time().as_secs(),
            kind = %event.kind(),
            sequence = event.sequence(),
            "Dispatching event"
        );

        handler(&event, state)?;
        state.record_step();

        Ok(Outcome::Processed(event.record()))
    }
}
