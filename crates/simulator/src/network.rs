//! The message-system world: three computers wired master <- {worker, lazy}.

use crate::computer::Computer;
use crate::distributions::Distributions;
use crate::message::Message;
use crate::stats::{ClassSummary, RunSummary, StationSummary};
use netsim_core::{EventKind, SimTime, StationId};
use netsim_simulation::{OutcomeDecision, QueueNetwork, Station};
use rand_chacha::ChaCha8Rng;

/// The master sends a processed message out of the system.
pub const MASTER_SEND: EventKind = EventKind::Custom("master_send");

/// The lazy computer throws a processed message away.
pub const LAZY_REJECT: EventKind = EventKind::Custom("lazy_reject");

/// Times of messages that left the system one way.
#[derive(Debug, Clone, Default)]
pub struct ClassLedger {
    times_in_system: Vec<f64>,
    waits: Vec<f64>,
}

impl ClassLedger {
    fn record(&mut self, message: &Message) {
        if let Some(time) = message.time_in_system() {
            self.times_in_system.push(time);
            self.waits.push(message.wait_time);
        }
    }

    pub fn len(&self) -> usize {
        self.times_in_system.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times_in_system.is_empty()
    }

    pub(crate) fn summary(&self) -> ClassSummary {
        ClassSummary::from_samples(&self.times_in_system, &self.waits)
    }
}

/// Per-run state of the three computers.
#[derive(Debug, Clone)]
pub struct ComputerNetwork {
    stations: [Station<Message>; 3],
    distributions: Distributions,
    next_message_id: u64,

    sent_from_worker: ClassLedger,
    sent_from_lazy: ClassLedger,
    rejected: ClassLedger,

    /// Start of the current stretch with all computers busy.
    all_busy_since: Option<SimTime>,

    /// Closed stretches with all computers busy.
    joint_work_time: f64,
}

impl ComputerNetwork {
    pub fn new(distributions: Distributions) -> Self {
        Self {
            stations: Computer::ALL.map(|computer| Station::new(computer.id(), computer.name())),
            distributions,
            next_message_id: 0,
            sent_from_worker: ClassLedger::default(),
            sent_from_lazy: ClassLedger::default(),
            rejected: ClassLedger::default(),
            all_busy_since: None,
            joint_work_time: 0.0,
        }
    }

    pub fn computer(&self, computer: Computer) -> &Station<Message> {
        &self.stations[computer.index()]
    }

    /// A message left through the master.
    pub fn record_sent(&mut self, message: &Message) {
        match message.source {
            Computer::Lazy => self.sent_from_lazy.record(message),
            _ => self.sent_from_worker.record(message),
        }
    }

    /// A message was thrown away by the lazy computer.
    pub fn record_rejected(&mut self, message: &Message) {
        self.rejected.record(message);
    }

    pub fn sent_from_worker(&self) -> &ClassLedger {
        &self.sent_from_worker
    }

    pub fn sent_from_lazy(&self) -> &ClassLedger {
        &self.sent_from_lazy
    }

    pub fn rejected(&self) -> &ClassLedger {
        &self.rejected
    }

    /// Time all three computers were busy at once, up to `now`.
    pub fn joint_work_time_at(&self, now: SimTime) -> f64 {
        let open = self
            .all_busy_since
            .and_then(|since| now.duration_since(since))
            .unwrap_or(0.0);
        self.joint_work_time + open
    }

    /// Aggregate the run as seen at `now`.
    pub fn summarize(&self, now: SimTime) -> RunSummary {
        let elapsed = now.as_secs();
        let stations = Computer::ALL
            .iter()
            .map(|&computer| StationSummary::new(computer, self.computer(computer), now))
            .collect();

        let joint_work_time = self.joint_work_time_at(now);
        RunSummary {
            simulated_time: elapsed,
            stations,
            sent_from_worker: self.sent_from_worker.summary(),
            sent_from_lazy: self.sent_from_lazy.summary(),
            rejected: self.rejected.summary(),
            joint_work_time,
            joint_work_percentage: percentage(joint_work_time, elapsed),
        }
    }

    fn all_busy(&self) -> bool {
        self.stations.iter().all(Station::is_busy)
    }
}

impl QueueNetwork for ComputerNetwork {
    type Message = Message;

    fn station(&self, id: StationId) -> Option<&Station<Message>> {
        let computer = Computer::from_id(id)?;
        Some(&self.stations[computer.index()])
    }

    fn station_mut(&mut self, id: StationId) -> Option<&mut Station<Message>> {
        let computer = Computer::from_id(id)?;
        Some(&mut self.stations[computer.index()])
    }

    fn external_sources(&self) -> Vec<StationId> {
        Computer::SOURCES.iter().map(|computer| computer.id()).collect()
    }

    fn new_external_message(&mut self, target: StationId, now: SimTime) -> Message {
        self.next_message_id += 1;
        let source = Computer::from_id(target).unwrap_or(Computer::Worker);
        Message::new(self.next_message_id, source, now)
    }

    fn sample_interarrival_time(&self, target: StationId, rng: &mut ChaCha8Rng) -> f64 {
        // NaN makes the schedule fail with InvalidTime instead of silently
        // starting a stream that does not exist.
        Computer::from_id(target)
            .and_then(|computer| self.distributions.interarrival(computer, rng))
            .unwrap_or(f64::NAN)
    }

    fn sample_service_time(&self, station: StationId, rng: &mut ChaCha8Rng) -> f64 {
        Computer::from_id(station)
            .map_or(f64::NAN, |computer| self.distributions.service(computer, rng))
    }

    fn compute_outcome(
        &self,
        _message: &Message,
        station: StationId,
        rng: &mut ChaCha8Rng,
    ) -> OutcomeDecision {
        match Computer::from_id(station) {
            Some(Computer::Worker) => OutcomeDecision::Forward,
            Some(Computer::Lazy) if self.distributions.lazy_rejects(rng) => {
                OutcomeDecision::Emit(LAZY_REJECT)
            }
            Some(Computer::Lazy) => OutcomeDecision::Forward,
            Some(Computer::Master) => OutcomeDecision::Emit(MASTER_SEND),
            None => OutcomeDecision::Drop,
        }
    }

    fn select_target(&self, _message: &Message) -> StationId {
        Computer::Master.id()
    }

    fn message_enqueued(&mut self, _station: StationId, message: &mut Message, now: SimTime) {
        message.enqueue_time = now;
    }

    fn message_dequeued(&mut self, _station: StationId, message: &mut Message, now: SimTime) {
        message.wait_time += now.duration_since(message.enqueue_time).unwrap_or(0.0);
    }

    fn station_state_changed(&mut self, _station: StationId, now: SimTime) {
        match (self.all_busy(), self.all_busy_since) {
            (true, None) => self.all_busy_since = Some(now),
            (false, Some(since)) => {
                self.joint_work_time += now.duration_since(since).unwrap_or(0.0);
                self.all_busy_since = None;
            }
            _ => {}
        }
    }
}

pub(crate) fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        100.0 * part / whole
    } else {
        0.0
    }
}
