//! Batch runner.
//!
//! Each run builds a fresh [`SimulationState`] from the scenario, seeds
//! SIMULATION_START at time zero and dispatches until the stop condition
//! fires. Nothing carries over between runs except the returned results.

use crate::dispatcher::{Dispatcher, Outcome};
use crate::observer::{EventObserver, NoopObserver};
use crate::registry::HandlerRegistry;
use crate::state::SimulationState;
use crate::stop::{StopCondition, StopReason};
use netsim_core::{EngineError, EngineResult, EventKind, RunIndex, SimTime};
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Default step guard per run.
pub const DEFAULT_MAX_STEPS: u64 = 10_000_000;

/// Derive the seed of one run from the batch seed.
///
/// Every run gets its own stream, so a single run can be replayed without
/// replaying the runs before it.
pub fn derive_run_seed(seed: u64, run: RunIndex) -> u64 {
    seed.wrapping_add(run as u64).wrapping_mul(0x517c_c1b7_2722_0a95)
}

/// The domain side of a simulation.
///
/// Supplies a fresh world for every run and turns a finished run into a
/// summary. The engine never looks inside either.
pub trait Scenario {
    /// Root of all domain state (queues, busy flags, counters).
    type World;

    /// Event payload type.
    type Payload: Default;

    /// Per-run statistics.
    type Summary;

    /// Build the initial world of `run`.
    fn build_world(&self, run: RunIndex) -> Self::World;

    /// Payload carried by SIMULATION_START.
    fn start_payload(&self) -> Self::Payload {
        Self::Payload::default()
    }

    /// Aggregate what happened between SIMULATION_START and termination.
    fn summarize(&self, state: &SimulationState<Self::World, Self::Payload>) -> Self::Summary;
}

/// Batch parameters.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunConfig {
    /// Number of independent runs.
    pub run_count: u32,

    /// Simulated time at which SIMULATION_END is scheduled.
    pub time_horizon: f64,

    /// Batch seed; each run derives its own seed from it.
    pub seed: u64,

    /// Step guard against handlers that never let time advance.
    pub max_steps: Option<u64>,

    /// Stop the whole batch on the first failed run.
    pub abort_on_failure: bool,
}

impl RunConfig {
    pub fn new(run_count: u32, time_horizon: f64, seed: u64) -> Self {
        Self {
            run_count,
            time_horizon,
            seed,
            max_steps: Some(DEFAULT_MAX_STEPS),
            abort_on_failure: false,
        }
    }

    /// Set the per-run step guard (`None` disables it).
    pub fn with_max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Abort the batch on the first failed run.
    pub fn with_abort_on_failure(mut self, abort: bool) -> Self {
        self.abort_on_failure = abort;
        self
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(1, 30.0, 12345)
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Completed(StopReason),
    /// The step guard fired; the run was cut short but its state is valid.
    NonTerminating { max_steps: u64 },
    /// A fatal engine or handler error.
    Failed(EngineError),
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult<S> {
    pub run: RunIndex,
    /// Seed the run's random stream was built from.
    pub seed: u64,
    pub status: RunStatus,
    /// Events dispatched.
    pub steps: u64,
    /// Clock at termination.
    pub end_time: SimTime,
    /// Events still pending when the run stopped.
    pub discarded_events: usize,
    /// Domain statistics; `None` for failed runs.
    pub summary: Option<S>,
}

impl<S> RunResult<S> {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, RunStatus::Failed(_))
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.status, RunStatus::Completed(_))
    }
}

/// Drives a batch of independent runs of one scenario.
pub struct RunController<S: Scenario> {
    scenario: S,
    registry: HandlerRegistry<S::World, S::Payload>,
}

impl<S> RunController<S>
where
    S: Scenario,
    S::World: 'static,
    S::Payload: 'static,
{
    /// Takes ownership of the registry: handlers are fixed from here on.
    pub fn new(scenario: S, registry: HandlerRegistry<S::World, S::Payload>) -> Self {
        Self { scenario, registry }
    }

    pub fn scenario(&self) -> &S {
        &self.scenario
    }

    /// Run `run_count` runs up to `time_horizon` with the default guard.
    pub fn run_all(
        &self,
        run_count: u32,
        time_horizon: f64,
        seed: u64,
    ) -> EngineResult<Vec<RunResult<S::Summary>>> {
        self.run_batch(&RunConfig::new(run_count, time_horizon, seed))
    }

    pub fn run_batch(&self, config: &RunConfig) -> EngineResult<Vec<RunResult<S::Summary>>> {
        self.run_batch_observed(config, &mut NoopObserver)
    }

    /// Run a batch sequentially, reporting every event to `observer`.
    pub fn run_batch_observed(
        &self,
        config: &RunConfig,
        observer: &mut dyn EventObserver<S::World, S::Payload>,
    ) -> EngineResult<Vec<RunResult<S::Summary>>> {
        let stop = StopCondition::new(config.time_horizon)?;
        let started = Instant::now();
        info!(
            runs = config.run_count,
            horizon = config.time_horizon,
            seed = config.seed,
            "Starting batch"
        );

        let mut results = Vec::with_capacity(config.run_count as usize);
        for run in 1..=config.run_count {
            let result = self.execute(run, config, &stop, observer);
            check_abort(config, &result)?;
            results.push(result);
        }

        info!(
            runs = results.len(),
            failed = results.iter().filter(|r| r.is_failed()).count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch complete"
        );
        Ok(results)
    }

    /// Run one run of a batch on its own.
    ///
    /// Produces the same result as the `run`-th entry of
    /// [`run_batch`](Self::run_batch) with the same config.
    pub fn run_one(
        &self,
        run: RunIndex,
        config: &RunConfig,
    ) -> EngineResult<RunResult<S::Summary>> {
        let stop = StopCondition::new(config.time_horizon)?;
        Ok(self.execute(run, config, &stop, &mut NoopObserver))
    }

    fn execute(
        &self,
        run: RunIndex,
        config: &RunConfig,
        stop: &StopCondition,
        observer: &mut dyn EventObserver<S::World, S::Payload>,
    ) -> RunResult<S::Summary> {
        let seed = derive_run_seed(config.seed, run);
        let mut state = SimulationState::new(self.scenario.build_world(run), seed);
        debug!(run, seed, "Starting run");

        let status = match self.drive(run, config, stop, &mut state, observer) {
            Ok(status) => status,
            Err(err) => {
                error!(run, time = state.now().as_secs(), error = %err, "Run failed");
                RunStatus::Failed(err)
            }
        };
        observer.on_run_finished(run, &state);

        let summary = match status {
            RunStatus::Failed(_) => None,
            _ => Some(self.scenario.summarize(&state)),
        };

        debug!(
            run,
            steps = state.steps(),
            end_time = state.now().as_secs(),
            discarded = state.pending(),
            ?status,
            "Run finished"
        );

        RunResult {
            run,
            seed,
            status,
            steps: state.steps(),
            end_time: state.now(),
            discarded_events: state.pending(),
            summary,
        }
    }

    fn drive(
        &self,
        run: RunIndex,
        config: &RunConfig,
        stop: &StopCondition,
        state: &mut SimulationState<S::World, S::Payload>,
        observer: &mut dyn EventObserver<S::World, S::Payload>,
    ) -> EngineResult<RunStatus> {
        let dispatcher = Dispatcher::new(&self.registry);
        state.schedule(SimTime::ZERO, EventKind::SimulationStart, self.scenario.start_payload())?;

        loop {
            // A scheduled END or a draining queue bounds the run already.
            if let Some(max_steps) = config.max_steps {
                let open_ended = !state.end_scheduled() && state.pending() > 0;
                if open_ended && state.steps() >= max_steps {
                    warn!(
                        run,
                        max_steps,
                        time = state.now().as_secs(),
                        pending = state.pending(),
                        "Run did not terminate within the step limit"
                    );
                    return Ok(RunStatus::NonTerminating { max_steps });
                }
            }

            let outcome = dispatcher.step(state)?;
            if let Outcome::Processed(record) = &outcome {
                observer.on_event(run, record, state);
            }
            if let Some(reason) = stop.should_stop(&outcome) {
                return Ok(RunStatus::Completed(reason));
            }
            stop.enforce_horizon(state)?;
        }
    }
}

impl<S> RunController<S>
where
    S: Scenario + Sync,
    S::World: 'static,
    S::Payload: 'static,
    S::Summary: Send,
{
    /// Run a batch with one worker per run.
    ///
    /// Each worker owns a full `SimulationState`; results come back in run
    /// order and equal those of [`run_batch`](Self::run_batch).
    pub fn run_batch_parallel(
        &self,
        config: &RunConfig,
    ) -> EngineResult<Vec<RunResult<S::Summary>>> {
        let stop = StopCondition::new(config.time_horizon)?;
        info!(
            runs = config.run_count,
            horizon = config.time_horizon,
            seed = config.seed,
            "Starting parallel batch"
        );

        let results: Vec<RunResult<S::Summary>> = (1..=config.run_count)
            .into_par_iter()
            .map(|run| self.execute(run, config, &stop, &mut NoopObserver))
            .collect();

        for result in &results {
            check_abort(config, result)?;
        }
        Ok(results)
    }
}

fn check_abort<S>(config: &RunConfig, result: &RunResult<S>) -> EngineResult<()> {
    match &result.status {
        RunStatus::Failed(err) if config.abort_on_failure => Err(EngineError::BatchAborted {
            run: result.run,
            source: Box::new(err.clone()),
        }),
        _ => Ok(()),
    }
}
