//! Configuration types for the simulator.

use crate::error::SimulatorError;
use netsim_simulation::RunConfig;

/// Configuration for a batch of message-system runs.
#[derive(Clone, Debug)]
pub struct SimulatorConfig {
    /// Engine parameters: run count, horizon, seed, step guard.
    pub run: RunConfig,

    /// Arrival and service time distributions.
    pub distributions: DistributionConfig,

    /// Log every event with the state of each computer.
    pub log_events: bool,

    /// Run the batch on a worker pool.
    pub parallel: bool,
}

impl SimulatorConfig {
    /// Create a configuration for `runs` runs of `horizon` simulated seconds.
    pub fn new(runs: u32, horizon: f64) -> Self {
        Self {
            run: RunConfig::new(runs, horizon, 12345),
            distributions: DistributionConfig::default(),
            log_events: false,
            parallel: false,
        }
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.run.seed = seed;
        self
    }

    /// Set the per-run step guard.
    pub fn with_max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.run.max_steps = max_steps;
        self
    }

    /// Stop the batch on the first failed run.
    pub fn with_abort_on_failure(mut self, abort: bool) -> Self {
        self.run.abort_on_failure = abort;
        self
    }

    /// Set the distribution configuration.
    pub fn with_distributions(mut self, distributions: DistributionConfig) -> Self {
        self.distributions = distributions;
        self
    }

    pub fn with_log_events(mut self, log_events: bool) -> Self {
        self.log_events = log_events;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check every parameter before a batch starts.
    pub fn validate(&self) -> Result<(), SimulatorError> {
        if self.run.run_count == 0 {
            return Err(invalid("run count must be at least 1"));
        }
        if !(self.run.time_horizon.is_finite() && self.run.time_horizon > 0.0) {
            return Err(invalid(format!(
                "time horizon must be a positive number of seconds, got {}",
                self.run.time_horizon
            )));
        }
        if self.run.max_steps == Some(0) {
            return Err(invalid("max steps must be at least 1"));
        }
        self.distributions.validate()
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::new(1, 200.0)
    }
}

/// Arrival and service time parameters, in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct DistributionConfig {
    /// Mean of the exponential worker interarrival time.
    pub worker_mean_interarrival: f64,

    /// Triangular lazy interarrival time: (min, mode, max).
    pub lazy_interarrival: (f64, f64, f64),

    /// Uniform worker service time: [min, max].
    pub worker_service: (f64, f64),

    /// Lazy service time support; density grows with the square of the time.
    pub lazy_service: (f64, f64),

    /// Normal master service time: (mean, standard deviation).
    pub master_service: (f64, f64),

    /// Probability that the lazy computer rejects a processed message.
    pub reject_probability: f64,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            worker_mean_interarrival: 15.0,
            lazy_interarrival: (2.0, 4.0, 10.0),
            worker_service: (5.0, 10.0),
            lazy_service: (3.0, 5.0),
            master_service: (3.0, 1.0),
            reject_probability: 0.75,
        }
    }
}

impl DistributionConfig {
    pub fn with_worker_mean_interarrival(mut self, mean: f64) -> Self {
        self.worker_mean_interarrival = mean;
        self
    }

    pub fn with_lazy_interarrival(mut self, min: f64, mode: f64, max: f64) -> Self {
        self.lazy_interarrival = (min, mode, max);
        self
    }

    pub fn with_worker_service(mut self, min: f64, max: f64) -> Self {
        self.worker_service = (min, max);
        self
    }

    pub fn with_lazy_service(mut self, min: f64, max: f64) -> Self {
        self.lazy_service = (min, max);
        self
    }

    pub fn with_master_service(mut self, mean: f64, std_dev: f64) -> Self {
        self.master_service = (mean, std_dev);
        self
    }

    pub fn with_reject_probability(mut self, probability: f64) -> Self {
        self.reject_probability = probability;
        self
    }

    pub fn validate(&self) -> Result<(), SimulatorError> {
        if !(self.worker_mean_interarrival.is_finite() && self.worker_mean_interarrival > 0.0) {
            return Err(invalid("worker mean interarrival must be positive"));
        }

        let (min, mode, max) = self.lazy_interarrival;
        let ordered = 0.0 <= min && min <= mode && mode <= max && min < max;
        if !(min.is_finite() && max.is_finite() && ordered) {
            return Err(invalid(format!(
                "lazy interarrival needs 0 <= min <= mode <= max and min < max, \
                 got ({min}, {mode}, {max})"
            )));
        }

        let (min, max) = self.worker_service;
        if !(min.is_finite() && max.is_finite() && 0.0 <= min && min <= max) {
            return Err(invalid(format!(
                "worker service needs 0 <= min <= max, got ({min}, {max})"
            )));
        }

        let (min, max) = self.lazy_service;
        if !(min.is_finite() && max.is_finite() && 0.0 <= min && min < max) {
            return Err(invalid(format!(
                "lazy service needs 0 <= min < max, got ({min}, {max})"
            )));
        }

        let (mean, std_dev) = self.master_service;
        if !(mean.is_finite() && std_dev.is_finite() && std_dev >= 0.0) {
            return Err(invalid(format!(
                "master service needs a finite mean and std dev >= 0, got ({mean}, {std_dev})"
            )));
        }

        if !(0.0..=1.0).contains(&self.reject_probability) {
            return Err(invalid(format!(
                "reject probability must be within [0, 1], got {}",
                self.reject_probability
            )));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> SimulatorError {
    SimulatorError::InvalidConfig(reason.into())
}
