//! Identifier types shared by the engine and domain crates.

use serde::Serialize;
use std::fmt;

/// A message-processing station (a computer, a server, a queue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StationId(pub u32);

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Station({})", self.0)
    }
}

/// One-based index of a run within a batch.
pub type RunIndex = u32;
