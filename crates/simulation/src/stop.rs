//! Run termination.

use crate::dispatcher::Outcome;
use crate::state::SimulationState;
use netsim_core::{EngineError, EngineResult, EventKind, SimTime};
use serde::Serialize;
use tracing::debug;

/// Why a run ended normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// The queue ran out of events.
    Drained,
    /// SIMULATION_END was dispatched.
    EndOfSimulation,
}

/// Decides when a run is over and plants SIMULATION_END at the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopCondition {
    horizon: SimTime,
}

impl StopCondition {
    /// Fails with [`EngineError::InvalidHorizon`] for negative, NaN or
    /// infinite horizons.
    pub fn new(time_horizon: f64) -> EngineResult<Self> {
        let horizon = SimTime::new(time_horizon).ok_or(EngineError::InvalidHorizon(time_horizon))?;
        Ok(Self { horizon })
    }

    pub fn horizon(&self) -> SimTime {
        self.horizon
    }

    /// Whether the run ends after this outcome.
    pub fn should_stop(&self, outcome: &Outcome) -> Option<StopReason> {
        match outcome {
            Outcome::Drained => Some(StopReason::Drained),
            Outcome::Processed(record) if record.kind.is_simulation_end() => {
                Some(StopReason::EndOfSimulation)
            }
            Outcome::Processed(_) => None,
        }
    }

    /// Schedule SIMULATION_END once the horizon is reached.
    ///
    /// Called after every processed event:
    /// - clock at or past the horizon and nothing else pending at this
    ///   instant: end now, so every event of the horizon instant settles
    ///   first;
    /// - clock before the horizon and the next event lies beyond it: end
    ///   exactly at the horizon.
    ///
    /// An end event that is already scheduled makes this a no-op.
    pub fn enforce_horizon<W, P: Default>(
        &self,
        state: &mut SimulationState<W, P>,
    ) -> EngineResult<()> {
        if state.end_scheduled() {
            return Ok(());
        }

        let now = state.now();
        let next = state.peek_time();
        let end_at = if now >= self.horizon {
            (next != Some(now)).then_some(now)
        } else {
            next.filter(|next| *next > self.horizon).map(|_| self.horizon)
        };

        if let Some(time) = end_at {
            debug!(
                now = now.as_secs(),
                horizon = self.horizon.as_secs(),
                end = time.as_secs(),
                "Scheduling simulation end"
            );
            state.schedule(time, EventKind::SimulationEnd, P::default())?;
        }
        Ok(())
    }
}
