//! Simulator errors.

use netsim_core::EngineError;
use thiserror::Error;

/// Errors that can occur while setting up or running the message system.
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The engine rejected the batch.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The report could not be serialized.
    #[error("failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),
}
