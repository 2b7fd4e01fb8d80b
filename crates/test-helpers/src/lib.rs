//! Test helpers for netsim.
//!
//! [`FixedIntervalScenario`] is a one-station network with clockwork
//! arrivals, small enough to predict every event by hand. Setting a jitter
//! makes service times random, for determinism and seeding tests.

use netsim_core::{EngineResult, EventKind, EventRecord, RunIndex, SimTime, StationId};
use netsim_simulation::{
    families, Delivery, EventTrace, HandlerRegistry, OutcomeDecision, QueueNetwork, RunController,
    Scenario, SimulationState, Station,
};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// The only station of a [`FixedIntervalNetwork`].
pub const STATION: StationId = StationId(1);

/// A unit of work flowing through the test network.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: u64,
    pub arrived: SimTime,
    pub started: Option<SimTime>,
}

/// One station fed every `interval` seconds.
#[derive(Debug, Clone)]
pub struct FixedIntervalNetwork {
    station: Station<Job>,
    interval: f64,
    service: f64,
    jitter: f64,
    outcome: OutcomeDecision,
    next_id: u64,
    /// Jobs in the order they started service.
    pub served: Vec<Job>,
}

impl FixedIntervalNetwork {
    pub fn new(interval: f64, service: f64) -> Self {
        Self {
            station: Station::new(STATION, "single"),
            interval,
            service,
            jitter: 0.0,
            outcome: OutcomeDecision::Drop,
            next_id: 0,
            served: Vec::new(),
        }
    }

    pub fn station_ref(&self) -> &Station<Job> {
        &self.station
    }
}

impl QueueNetwork for FixedIntervalNetwork {
    type Message = Job;

    fn station(&self, id: StationId) -> Option<&Station<Job>> {
        (id == STATION).then_some(&self.station)
    }

    fn station_mut(&mut self, id: StationId) -> Option<&mut Station<Job>> {
        (id == STATION).then_some(&mut self.station)
    }

    fn external_sources(&self) -> Vec<StationId> {
        vec![STATION]
    }

    fn new_external_message(&mut self, _target: StationId, now: SimTime) -> Job {
        self.next_id += 1;
        Job {
            id: self.next_id,
            arrived: now,
            started: None,
        }
    }

    fn sample_interarrival_time(&self, _target: StationId, _rng: &mut ChaCha8Rng) -> f64 {
        self.interval
    }

    fn sample_service_time(&self, _station: StationId, rng: &mut ChaCha8Rng) -> f64 {
        if self.jitter > 0.0 {
            self.service + rng.gen_range(0.0..self.jitter)
        } else {
            self.service
        }
    }

    fn compute_outcome(
        &self,
        _message: &Job,
        _station: StationId,
        _rng: &mut ChaCha8Rng,
    ) -> OutcomeDecision {
        self.outcome
    }

    fn select_target(&self, _message: &Job) -> StationId {
        STATION
    }

    fn message_dequeued(&mut self, _station: StationId, message: &mut Job, now: SimTime) {
        message.started = Some(now);
        self.served.push(message.clone());
    }
}

/// What a finished run of the test network looked like.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedIntervalSummary {
    pub received: u64,
    pub processed: u64,
    pub waiting: usize,
    pub busy_time: f64,
    /// Ids in service order.
    pub served: Vec<u64>,
    pub end_time: SimTime,
}

/// Scenario wrapper around [`FixedIntervalNetwork`].
#[derive(Debug, Clone)]
pub struct FixedIntervalScenario {
    interval: f64,
    service: f64,
    jitter: f64,
    outcome: OutcomeDecision,
}

impl FixedIntervalScenario {
    pub fn new(interval: f64, service: f64) -> Self {
        Self {
            interval,
            service,
            jitter: 0.0,
            outcome: OutcomeDecision::Drop,
        }
    }

    /// Add a uniform `[0, jitter)` term to every service time.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Route finished jobs through `outcome` instead of dropping them.
    pub fn with_outcome(mut self, outcome: OutcomeDecision) -> Self {
        self.outcome = outcome;
        self
    }

    /// Registry with the baseline family handlers installed.
    pub fn registry(&self) -> EngineResult<HandlerRegistry<FixedIntervalNetwork, Delivery<Job>>> {
        let mut registry = HandlerRegistry::new();
        families::install(&mut registry)?;
        Ok(registry)
    }

    /// Controller over this scenario with the baseline handlers.
    pub fn controller(self) -> EngineResult<RunController<Self>> {
        let registry = self.registry()?;
        Ok(RunController::new(self, registry))
    }
}

impl Scenario for FixedIntervalScenario {
    type World = FixedIntervalNetwork;
    type Payload = Delivery<Job>;
    type Summary = FixedIntervalSummary;

    fn build_world(&self, _run: RunIndex) -> FixedIntervalNetwork {
        let mut network = FixedIntervalNetwork::new(self.interval, self.service);
        network.jitter = self.jitter;
        network.outcome = self.outcome;
        network
    }

    fn summarize(
        &self,
        state: &SimulationState<FixedIntervalNetwork, Delivery<Job>>,
    ) -> FixedIntervalSummary {
        let network = state.world();
        let station = network.station_ref();
        FixedIntervalSummary {
            received: station.received(),
            processed: station.processed(),
            waiting: station.queue_len(),
            busy_time: station.busy_time_at(state.now()),
            served: network.served.iter().map(|job| job.id).collect(),
            end_time: state.now(),
        }
    }
}

/// `(time, kind)` of every event of `run`, in dispatch order.
pub fn timeline(trace: &EventTrace, run: RunIndex) -> Vec<(f64, EventKind)> {
    trace
        .run(run)
        .map(|record| (record.time.as_secs(), record.kind))
        .collect()
}

/// Panics unless dispatch times never decrease and ties keep
/// insertion order.
pub fn assert_dispatch_order<'a>(records: impl IntoIterator<Item = &'a EventRecord>) {
    let mut previous: Option<&EventRecord> = None;
    for record in records {
        if let Some(prev) = previous {
            assert!(
                prev.time <= record.time,
                "clock went backwards: {} after {}",
                record,
                prev
            );
            if prev.time == record.time {
                assert!(
                    prev.sequence < record.sequence,
                    "same-time events out of insertion order: {} after {}",
                    record,
                    prev
                );
            }
        }
        previous = Some(record);
    }
}
