//! Baseline family handlers: message arrival, queuing and processing.
//!
//! These handlers implement the generic pipeline every queueing network
//! shares. Domain behaviour (distributions, routing, accept/reject policy)
//! comes from the world through the [`QueueNetwork`] collaborator trait.
//!
//! | Family            | Action |
//! |-------------------|--------|
//! | Start             | Schedule the first external arrival of every source. |
//! | ExternalArrival   | Enqueue; start service if idle; schedule the next external arrival. |
//! | InternalArrival   | Enqueue; start service if idle. Never feeds the external stream. |
//! | ProcessStart      | Dequeue, mark busy, schedule ProcessEnd after the service time. |
//! | ProcessEnd        | Mark idle, apply the outcome, start the next service if messages wait. |
//!
//! The End family keeps the registry's built-in no-op.

use crate::registry::HandlerRegistry;
use crate::state::SimulationState;
use crate::station::Station;
use netsim_core::{EngineError, EngineResult, Event, EventFamily, EventKind, SimTime, StationId};
use rand_chacha::ChaCha8Rng;
use std::fmt::Debug;
use tracing::trace;

/// Payload of the family events.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery<M> {
    /// Station the event concerns.
    pub target: Option<StationId>,
    /// Message in flight, if any.
    pub message: Option<M>,
}

impl<M> Default for Delivery<M> {
    fn default() -> Self {
        Self::none()
    }
}

impl<M> Delivery<M> {
    /// No target, no message (SIMULATION_START / SIMULATION_END).
    pub fn none() -> Self {
        Self {
            target: None,
            message: None,
        }
    }

    /// Targets a station without a message.
    pub fn to(target: StationId) -> Self {
        Self {
            target: Some(target),
            message: None,
        }
    }

    /// Carries `message` to `target`.
    pub fn carrying(target: StationId, message: M) -> Self {
        Self {
            target: Some(target),
            message: Some(message),
        }
    }
}

/// What happens to a message once a station has processed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeDecision {
    /// Pass it to another station as an INTERNAL_ARRIVAL.
    Forward,
    /// Hand it to a direct handler through an event of this kind.
    Emit(EventKind),
    /// Discard it.
    Drop,
}

/// Collaborator interface the family handlers drive.
///
/// Samplers and policies return values; the handlers do all scheduling.
pub trait QueueNetwork {
    type Message: Clone + Debug;

    fn station(&self, id: StationId) -> Option<&Station<Self::Message>>;

    fn station_mut(&mut self, id: StationId) -> Option<&mut Station<Self::Message>>;

    /// Stations fed by an external arrival stream.
    fn external_sources(&self) -> Vec<StationId>;

    /// A message arriving from outside at `target`.
    fn new_external_message(&mut self, target: StationId, now: SimTime) -> Self::Message;

    /// Seconds until the next external arrival at `target`.
    fn sample_interarrival_time(&self, target: StationId, rng: &mut ChaCha8Rng) -> f64;

    /// Seconds `station` spends on one message.
    fn sample_service_time(&self, station: StationId, rng: &mut ChaCha8Rng) -> f64;

    /// Fate of `message` after `station` processed it.
    fn compute_outcome(
        &self,
        message: &Self::Message,
        station: StationId,
        rng: &mut ChaCha8Rng,
    ) -> OutcomeDecision;

    /// Where a forwarded message goes.
    fn select_target(&self, message: &Self::Message) -> StationId;

    /// Called just before `message` joins the queue of `station`.
    fn message_enqueued(
        &mut self,
        _station: StationId,
        _message: &mut Self::Message,
        _now: SimTime,
    ) {
    }

    /// Called when `message` leaves the queue to be served.
    fn message_dequeued(
        &mut self,
        _station: StationId,
        _message: &mut Self::Message,
        _now: SimTime,
    ) {
    }

    /// Called after `station` switched between busy and idle.
    fn station_state_changed(&mut self, _station: StationId, _now: SimTime) {}
}

/// State type the family handlers run against.
pub type NetworkState<N> = SimulationState<N, Delivery<<N as QueueNetwork>::Message>>;

type NetworkEvent<N> = Event<Delivery<<N as QueueNetwork>::Message>>;

/// Register the five baseline family handlers.
pub fn install<N>(registry: &mut HandlerRegistry<N, Delivery<N::Message>>) -> EngineResult<()>
where
    N: QueueNetwork + 'static,
    N::Message: 'static,
{
    registry.register_family(EventFamily::Start, on_simulation_start::<N>)?;
    registry.register_family(EventFamily::ExternalArrival, on_external_arrival::<N>)?;
    registry.register_family(EventFamily::InternalArrival, on_internal_arrival::<N>)?;
    registry.register_family(EventFamily::ProcessStart, on_process_start::<N>)?;
    registry.register_family(EventFamily::ProcessEnd, on_process_end::<N>)?;
    Ok(())
}

fn on_simulation_start<N: QueueNetwork>(
    _event: &NetworkEvent<N>,
    state: &mut NetworkState<N>,
) -> EngineResult<()> {
    for target in state.world().external_sources() {
        schedule_next_external_arrival(state, target)?;
    }
    Ok(())
}

fn on_external_arrival<N: QueueNetwork>(
    event: &NetworkEvent<N>,
    state: &mut NetworkState<N>,
) -> EngineResult<()> {
    let target = target_of(event)?;
    let now = state.now();
    let message = match &event.payload().message {
        Some(message) => message.clone(),
        None => state.world_mut().new_external_message(target, now),
    };

    admit(state, target, message)?;
    schedule_next_external_arrival(state, target)
}

fn on_internal_arrival<N: QueueNetwork>(
    event: &NetworkEvent<N>,
    state: &mut NetworkState<N>,
) -> EngineResult<()> {
    let target = target_of(event)?;
    let message = message_of(event)?;
    admit(state, target, message)
}

fn on_process_start<N: QueueNetwork>(
    event: &NetworkEvent<N>,
    state: &mut NetworkState<N>,
) -> EngineResult<()> {
    let target = target_of(event)?;
    let now = state.now();

    let world = state.world_mut();
    let station = world
        .station_mut(target)
        .ok_or(EngineError::UnknownStation(target))?;
    // Two arrivals at one instant can both see the station idle.
    if station.is_busy() {
        trace!(%target, "Station already busy, ignoring stale start");
        return Ok(());
    }
    let Some(mut message) = station.dequeue() else {
        trace!(%target, "Queue empty, ignoring stale start");
        return Ok(());
    };
    station.start_service(now);
    world.message_dequeued(target, &mut message, now);
    world.station_state_changed(target, now);

    let (world, rng) = state.world_and_rng();
    let service_time = world.sample_service_time(target, rng);
    state.schedule_after(
        service_time,
        EventKind::ProcessEnd,
        Delivery::carrying(target, message),
    )?;
    Ok(())
}

fn on_process_end<N: QueueNetwork>(
    event: &NetworkEvent<N>,
    state: &mut NetworkState<N>,
) -> EngineResult<()> {
    let target = target_of(event)?;
    let message = message_of(event)?;
    let now = state.now();

    let world = state.world_mut();
    world
        .station_mut(target)
        .ok_or(EngineError::UnknownStation(target))?
        .finish_service(now);
    world.station_state_changed(target, now);

    let (world, rng) = state.world_and_rng();
    let decision = world.compute_outcome(&message, target, rng);
    let waiting = world.station(target).map_or(0, Station::queue_len);

    match decision {
        OutcomeDecision::Forward => {
            let next = state.world().select_target(&message);
            state.schedule_now(EventKind::InternalArrival, Delivery::carrying(next, message))?;
        }
        OutcomeDecision::Emit(kind) => {
            state.schedule_now(kind, Delivery::carrying(target, message))?;
        }
        OutcomeDecision::Drop => {
            trace!(%target, ?message, "Message dropped");
        }
    }

    if waiting > 0 {
        state.schedule_now(EventKind::ProcessStart, Delivery::to(target))?;
    }
    Ok(())
}

/// Enqueue `message` at `target` and start service if the station is idle.
fn admit<N: QueueNetwork>(
    state: &mut NetworkState<N>,
    target: StationId,
    mut message: N::Message,
) -> EngineResult<()> {
    let now = state.now();
    let world = state.world_mut();
    if world.station(target).is_none() {
        return Err(EngineError::UnknownStation(target));
    }
    world.message_enqueued(target, &mut message, now);

    let station = world
        .station_mut(target)
        .ok_or(EngineError::UnknownStation(target))?;
    station.enqueue(message);
    let idle = station.is_idle();

    if idle {
        state.schedule_now(EventKind::ProcessStart, Delivery::to(target))?;
    }
    Ok(())
}

fn schedule_next_external_arrival<N: QueueNetwork>(
    state: &mut NetworkState<N>,
    target: StationId,
) -> EngineResult<()> {
    let (world, rng) = state.world_and_rng();
    let delay = world.sample_interarrival_time(target, rng);
    state.schedule_after(delay, EventKind::ExternalArrival, Delivery::to(target))?;
    Ok(())
}

fn target_of<M>(event: &Event<Delivery<M>>) -> EngineResult<StationId> {
    event.payload().target.ok_or(EngineError::MissingPayload {
        kind: event.kind(),
        missing: "target",
    })
}

fn message_of<M: Clone>(event: &Event<Delivery<M>>) -> EngineResult<M> {
    event
        .payload()
        .message
        .clone()
        .ok_or(EngineError::MissingPayload {
            kind: event.kind(),
            missing: "message",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{Dispatcher, Outcome};

    const FRONT: StationId = StationId(1);
    const BACK: StationId = StationId(2);

    /// FRONT forwards to BACK, BACK emits "done". Arrivals every 3s at
    /// FRONT, service takes 1s at FRONT and 2s at BACK.
    struct Pipeline {
        stations: Vec<Station<u32>>,
        next_id: u32,
        done: Vec<u32>,
        /// Messages seen by the enqueue hook.
        enqueued: Vec<(StationId, u32)>,
    }

    impl Pipeline {
        fn new() -> Self {
            Self {
                stations: vec![Station::new(FRONT, "front"), Station::new(BACK, "back")],
                next_id: 0,
                done: Vec::new(),
                enqueued: Vec::new(),
            }
        }
    }

    impl QueueNetwork for Pipeline {
        type Message = u32;

        fn station(&self, id: StationId) -> Option<&Station<u32>> {
            self.stations.iter().find(|s| s.id() == id)
        }

        fn station_mut(&mut self, id: StationId) -> Option<&mut Station<u32>> {
            self.stations.iter_mut().find(|s| s.id() == id)
        }

        fn external_sources(&self) -> Vec<StationId> {
            vec![FRONT]
        }

        fn new_external_message(&mut self, _target: StationId, _now: SimTime) -> u32 {
            self.next_id += 1;
            self.next_id
        }

        fn sample_interarrival_time(&self, _target: StationId, _rng: &mut ChaCha8Rng) -> f64 {
            3.0
        }

        fn sample_service_time(&self, station: StationId, _rng: &mut ChaCha8Rng) -> f64 {
            if station == FRONT {
                1.0
            } else {
                2.0
            }
        }

        fn compute_outcome(
            &self,
            _message: &u32,
            station: StationId,
            _rng: &mut ChaCha8Rng,
        ) -> OutcomeDecision {
            if station == FRONT {
                OutcomeDecision::Forward
            } else {
                OutcomeDecision::Emit(EventKind::Custom("done"))
            }
        }

        fn select_target(&self, _message: &u32) -> StationId {
            BACK
        }

        fn message_enqueued(&mut self, station: StationId, message: &mut u32, _now: SimTime) {
            self.enqueued.push((station, *message));
        }
    }

    fn registry() -> HandlerRegistry<Pipeline, Delivery<u32>> {
        let mut registry: HandlerRegistry<Pipeline, Delivery<u32>> = HandlerRegistry::new();
        install(&mut registry).unwrap();
        registry
            .register_handler(EventKind::Custom("done"), |event, state| {
                let message = message_of(event)?;
                state.world_mut().done.push(message);
                Ok(())
            })
            .unwrap();
        registry
    }

    fn t(secs: f64) -> SimTime {
        SimTime::new(secs).unwrap()
    }

    /// Dispatch until nothing is pending at or before `until`.
    fn run_until(
        registry: &HandlerRegistry<Pipeline, Delivery<u32>>,
        state: &mut NetworkState<Pipeline>,
        until: f64,
    ) -> Vec<(f64, EventKind)> {
        let dispatcher = Dispatcher::new(registry);
        let mut seen = Vec::new();
        while state.peek_time().is_some_and(|time| time <= t(until)) {
            match dispatcher.step(state).unwrap() {
                Outcome::Processed(record) => seen.push((record.time.as_secs(), record.kind)),
                Outcome::Drained => break,
            }
        }
        seen
    }

    #[test]
    fn test_message_flows_through_pipeline() {
        let registry = registry();
        let mut state = SimulationState::new(Pipeline::new(), 0);
        state
            .schedule(SimTime::ZERO, EventKind::SimulationStart, Delivery::none())
            .unwrap();

        let seen = run_until(&registry, &mut state, 6.0);
        assert_eq!(
            seen,
            vec![
                (0.0, EventKind::SimulationStart),
                (3.0, EventKind::ExternalArrival),
                (3.0, EventKind::ProcessStart),
                (4.0, EventKind::ProcessEnd),
                (4.0, EventKind::InternalArrival),
                (4.0, EventKind::ProcessStart),
                (6.0, EventKind::ExternalArrival),
                (6.0, EventKind::ProcessEnd),
                (6.0, EventKind::ProcessStart),
                (6.0, EventKind::Custom("done")),
            ]
        );
        assert_eq!(state.world().done, vec![1]);
        assert_eq!(state.world().enqueued, vec![(FRONT, 1), (BACK, 1), (FRONT, 2)]);
        let front = state.world().station(FRONT).unwrap();
        assert_eq!(front.processed(), 1);
        assert!(front.is_busy());
    }

    #[test]
    fn test_internal_arrival_does_not_feed_external_stream() {
        let registry = registry();
        let mut state = SimulationState::new(Pipeline::new(), 0);
        state
            .schedule(SimTime::ZERO, EventKind::InternalArrival, Delivery::carrying(BACK, 42))
            .unwrap();

        let seen = run_until(&registry, &mut state, 100.0);
        assert!(seen.iter().all(|(_, kind)| *kind != EventKind::ExternalArrival));
        assert_eq!(state.world().done, vec![42]);
        assert_eq!(state.pending(), 0);
    }

    #[test]
    fn test_queued_messages_are_served_back_to_back() {
        let registry = registry();
        let mut state = SimulationState::new(Pipeline::new(), 0);
        for id in [7, 8, 9] {
            state
                .schedule(SimTime::ZERO, EventKind::InternalArrival, Delivery::carrying(BACK, id))
                .unwrap();
        }

        run_until(&registry, &mut state, 100.0);
        assert_eq!(state.world().done, vec![7, 8, 9]);
        assert_eq!(state.now(), t(6.0));
        let back = state.world().station(BACK).unwrap();
        assert_eq!(back.busy_time(), 6.0);
        assert_eq!(back.peak_queue_len(), 3);
        assert!(back.is_idle());
    }

    #[test]
    fn test_stale_start_is_ignored() {
        let registry = registry();
        let mut state = SimulationState::new(Pipeline::new(), 0);
        state
            .schedule(SimTime::ZERO, EventKind::ProcessStart, Delivery::to(BACK))
            .unwrap();

        let seen = run_until(&registry, &mut state, 10.0);
        assert_eq!(seen, vec![(0.0, EventKind::ProcessStart)]);
        assert!(state.world().station(BACK).unwrap().is_idle());
    }

    #[test]
    fn test_missing_target_is_an_error() {
        let registry = registry();
        let mut state = SimulationState::new(Pipeline::new(), 0);
        state
            .schedule(SimTime::ZERO, EventKind::ProcessStart, Delivery::none())
            .unwrap();

        let err = Dispatcher::new(&registry).step(&mut state).unwrap_err();
        assert_eq!(
            err,
            EngineError::MissingPayload {
                kind: EventKind::ProcessStart,
                missing: "target",
            }
        );
    }

    #[test]
    fn test_unknown_station_is_an_error() {
        let registry = registry();
        let mut state = SimulationState::new(Pipeline::new(), 0);
        state
            .schedule(
                SimTime::ZERO,
                EventKind::InternalArrival,
                Delivery::carrying(StationId(9), 1),
            )
            .unwrap();

        let err = Dispatcher::new(&registry).step(&mut state).unwrap_err();
        assert_eq!(err, EngineError::UnknownStation(StationId(9)));
        assert!(state.world().enqueued.is_empty(), "No hook runs for an unknown station");
    }
}
