//! netsim CLI
//!
//! Run batches of the computer message system simulation.
//!
//! # Example
//!
//! ```bash
//! # Ten one-hour runs with a fixed seed
//! netsim --runs 10 --horizon 3600 --seed 42
//!
//! # Log every event of a short run
//! netsim --horizon 60 --log-events
//! ```

use clap::Parser;
use netsim_simulator::{DistributionConfig, Simulator, SimulatorConfig};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Computer message system simulator
///
/// Deterministic discrete-event simulation of a master, a worker and a
/// lazy computer. Reproducible when the same seed is used.
#[derive(Parser, Debug)]
#[command(name = "netsim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of independent runs
    #[arg(short = 'r', long, default_value = "1")]
    runs: u32,

    /// Simulated seconds per run
    #[arg(short = 't', long, default_value = "200")]
    horizon: f64,

    /// Random seed for reproducible results. When omitted, a random seed is used.
    #[arg(long)]
    seed: Option<u64>,

    /// Events per run before a run is cut short
    #[arg(long)]
    max_steps: Option<u64>,

    /// Stop the whole batch on the first failed run
    #[arg(long)]
    abort_on_failure: bool,

    /// Run the batch on all cores
    #[arg(long)]
    parallel: bool,

    /// Log every event with the state of each computer
    #[arg(long)]
    log_events: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Probability that the lazy computer rejects a message (0.0-1.0)
    #[arg(long, default_value = "0.75")]
    reject_probability: f64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,netsim_simulator=info")),
        )
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, runs = args.runs, horizon = args.horizon, "Using seed");

    let mut config = SimulatorConfig::new(args.runs, args.horizon)
        .with_seed(seed)
        .with_abort_on_failure(args.abort_on_failure)
        .with_parallel(args.parallel)
        .with_log_events(args.log_events)
        .with_distributions(
            DistributionConfig::default().with_reject_probability(args.reject_probability),
        );
    if args.max_steps.is_some() {
        config = config.with_max_steps(args.max_steps);
    }

    let report = match Simulator::new(config).and_then(|simulator| simulator.run()) {
        Ok(report) => report,
        Err(err) => {
            error!(error = %err, "Simulation failed");
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match report.to_json() {
            Ok(json) => println!("{json}"),
            Err(err) => {
                error!(error = %err, "Failed to write report");
                return ExitCode::FAILURE;
            }
        }
    } else {
        report.print_summary();
    }

    if report.failed_runs() > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
