//! Computer message system simulator.
//!
//! Three computers on top of `netsim-simulation`:
//!
//! - **Worker** (2) and **Lazy** (3) receive external messages, process
//!   them and pass them to the master. The lazy computer rejects most of
//!   what it processes.
//! - **Master** (1) processes every forwarded message and sends it out of
//!   the system.
//!
//! Each run reports per-computer busy times, time in system and waiting
//! time per message class, and the time all computers were busy at once.
//!
//! # Example
//!
//! ```ignore
//! use netsim_simulator::{DistributionConfig, Simulator, SimulatorConfig};
//!
//! let config = SimulatorConfig::new(10, 3600.0)
//!     .with_seed(42)
//!     .with_distributions(DistributionConfig::default().with_reject_probability(0.5));
//!
//! let report = Simulator::new(config)?.run()?;
//! report.print_summary();
//! ```

pub mod computer;
pub mod config;
pub mod distributions;
pub mod error;
pub mod handlers;
pub mod logger;
pub mod message;
pub mod network;
pub mod report;
pub mod runner;
pub mod stats;

pub use computer::Computer;
pub use config::{DistributionConfig, SimulatorConfig};
pub use distributions::Distributions;
pub use error::SimulatorError;
pub use handlers::build_registry;
pub use logger::StationLogger;
pub use message::Message;
pub use network::{ComputerNetwork, LAZY_REJECT, MASTER_SEND};
pub use report::{BatchMeans, BatchReport, RunReport, StationMean};
pub use runner::{MessageSystem, Simulator};
pub use stats::{ClassSummary, RunSummary, StationSummary, TimePercentiles};
