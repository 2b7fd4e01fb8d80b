//! A generic single-server FIFO station.

use netsim_core::{SimTime, StationId};
use std::collections::VecDeque;

/// A message-processing entity: one server, one FIFO queue.
///
/// The family handlers flip the busy flag and move messages in and out;
/// the station only keeps the books.
#[derive(Debug, Clone)]
pub struct Station<M> {
    id: StationId,
    name: &'static str,
    queue: VecDeque<M>,
    busy: bool,

    /// When the current busy period started.
    busy_since: SimTime,

    /// Accumulated busy time of finished service periods.
    busy_time: f64,

    /// Messages enqueued (external and internal).
    received: u64,

    /// Services completed.
    processed: u64,

    peak_queue_len: usize,
}

impl<M> Station<M> {
    /// An idle station with an empty queue.
    pub fn new(id: StationId, name: &'static str) -> Self {
        Self {
            id,
            name,
            queue: VecDeque::new(),
            busy: false,
            busy_since: SimTime::ZERO,
            busy_time: 0.0,
            received: 0,
            processed: 0,
            peak_queue_len: 0,
        }
    }

    pub fn id(&self) -> StationId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_idle(&self) -> bool {
        !self.busy
    }

    /// "busy" or "free", for logs.
    pub fn state_label(&self) -> &'static str {
        if self.busy {
            "busy"
        } else {
            "free"
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn peak_queue_len(&self) -> usize {
        self.peak_queue_len
    }

    /// Busy time of finished service periods.
    pub fn busy_time(&self) -> f64 {
        self.busy_time
    }

    /// Busy time up to `now`, including a service still in progress.
    pub fn busy_time_at(&self, now: SimTime) -> f64 {
        let open = if self.busy {
            now.duration_since(self.busy_since).unwrap_or(0.0)
        } else {
            0.0
        };
        self.busy_time + open
    }

    /// Append a message to the back of the queue.
    pub fn enqueue(&mut self, message: M) {
        self.queue.push_back(message);
        self.received += 1;
        self.peak_queue_len = self.peak_queue_len.max(self.queue.len());
    }

    /// Take the message at the front of the queue.
    pub fn dequeue(&mut self) -> Option<M> {
        self.queue.pop_front()
    }

    /// Mark the server busy from `now`.
    pub fn start_service(&mut self, now: SimTime) {
        self.busy = true;
        self.busy_since = now;
    }

    /// Mark the server idle and close the busy period.
    pub fn finish_service(&mut self, now: SimTime) {
        if self.busy {
            self.busy_time += now.duration_since(self.busy_since).unwrap_or(0.0);
            self.processed += 1;
        }
        self.busy = false;
    }

    /// Messages waiting, front first.
    pub fn queued(&self) -> impl Iterator<Item = &M> {
        self.queue.iter()
    }
}
