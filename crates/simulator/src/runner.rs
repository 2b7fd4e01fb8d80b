//! Batch driver for the message system.

use crate::config::SimulatorConfig;
use crate::distributions::Distributions;
use crate::error::SimulatorError;
use crate::handlers::build_registry;
use crate::logger::StationLogger;
use crate::message::Message;
use crate::network::ComputerNetwork;
use crate::report::BatchReport;
use crate::stats::RunSummary;
use netsim_core::RunIndex;
use netsim_simulation::{Delivery, RunController, Scenario, SimulationState};
use tracing::{info, warn};

/// The message system as a [`Scenario`]: a fresh three-computer network
/// per run.
#[derive(Debug, Clone)]
pub struct MessageSystem {
    distributions: Distributions,
}

impl MessageSystem {
    pub fn new(distributions: Distributions) -> Self {
        Self { distributions }
    }
}

impl Scenario for MessageSystem {
    type World = ComputerNetwork;
    type Payload = Delivery<Message>;
    type Summary = RunSummary;

    fn build_world(&self, _run: RunIndex) -> ComputerNetwork {
        ComputerNetwork::new(self.distributions.clone())
    }

    fn summarize(&self, state: &SimulationState<ComputerNetwork, Delivery<Message>>) -> RunSummary {
        state.world().summarize(state.now())
    }
}

/// Runs batches of the message system.
pub struct Simulator {
    config: SimulatorConfig,
    controller: RunController<MessageSystem>,
}

impl Simulator {
    /// Validate `config` and assemble the handlers.
    pub fn new(config: SimulatorConfig) -> Result<Self, SimulatorError> {
        config.validate()?;
        let scenario = MessageSystem::new(Distributions::from_config(&config.distributions)?);
        let controller = RunController::new(scenario, build_registry()?);
        Ok(Self { config, controller })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Run the configured batch and build its report.
    pub fn run(&self) -> Result<BatchReport, SimulatorError> {
        let config = &self.config.run;
        info!(
            runs = config.run_count,
            horizon = config.time_horizon,
            seed = config.seed,
            parallel = self.config.parallel,
            log_events = self.config.log_events,
            "Starting message system simulation"
        );

        let results = if self.config.log_events {
            if self.config.parallel {
                warn!("Event logging needs a sequential batch, ignoring --parallel");
            }
            self.controller.run_batch_observed(config, &mut StationLogger)?
        } else if self.config.parallel {
            self.controller.run_batch_parallel(config)?
        } else {
            self.controller.run_batch(config)?
        };

        let report = BatchReport::new(config, &results);
        info!(
            runs = report.results.len(),
            failed = report.failed_runs(),
            "Simulation complete"
        );
        Ok(report)
    }
}
