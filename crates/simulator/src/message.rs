//! Messages flowing between computers.

use crate::computer::Computer;
use netsim_core::SimTime;
use serde::Serialize;

/// A message, from external arrival until it is sent or rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: u64,

    /// Computer whose external stream produced the message.
    pub source: Computer,

    /// When the message entered the system.
    pub arrival_time: SimTime,

    /// When the message joined its current queue.
    pub enqueue_time: SimTime,

    /// Total time spent waiting in queues so far.
    pub wait_time: f64,

    /// When the message left the system, sent or rejected.
    pub exit_time: Option<SimTime>,

    pub rejected: bool,
}

impl Message {
    pub fn new(id: u64, source: Computer, now: SimTime) -> Self {
        Self {
            id,
            source,
            arrival_time: now,
            enqueue_time: now,
            wait_time: 0.0,
            exit_time: None,
            rejected: false,
        }
    }

    /// Time between arrival and exit; `None` while still in the system.
    pub fn time_in_system(&self) -> Option<f64> {
        self.exit_time?.duration_since(self.arrival_time)
    }
}
