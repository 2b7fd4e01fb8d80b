//! The three computers of the message system.

use netsim_core::StationId;
use serde::Serialize;
use std::fmt;

/// A computer (station) of the message system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Computer {
    /// Computer 1: receives every forwarded message and sends it out.
    Master,
    /// Computer 2: prepares external messages for the master.
    Worker,
    /// Computer 3: prepares external messages, rejecting most of them.
    Lazy,
}

impl Computer {
    pub const ALL: [Computer; 3] = [Computer::Master, Computer::Worker, Computer::Lazy];

    /// Computers fed by an external arrival stream.
    pub const SOURCES: [Computer; 2] = [Computer::Worker, Computer::Lazy];

    pub fn id(self) -> StationId {
        StationId(self.index() as u32 + 1)
    }

    pub fn from_id(id: StationId) -> Option<Self> {
        match id.0 {
            1 => Some(Computer::Master),
            2 => Some(Computer::Worker),
            3 => Some(Computer::Lazy),
            _ => None,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Computer::Master => 0,
            Computer::Worker => 1,
            Computer::Lazy => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Computer::Master => "master",
            Computer::Worker => "worker",
            Computer::Lazy => "lazy",
        }
    }
}

impl fmt::Display for Computer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
