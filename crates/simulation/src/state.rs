//! Per-run mutable state.

use netsim_core::{Clock, EngineError, EngineResult, EventKey, EventKind, EventQueue, SimTime};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Everything a single run mutates.
///
/// Built fresh for every run and dropped at the end of it, so nothing leaks
/// from one run into the next. Handlers receive it by `&mut` and may
/// schedule events or mutate the domain world `W`.
pub struct SimulationState<W, P> {
    clock: Clock,
    queue: EventQueue<P>,
    world: W,

    /// Random stream for domain collaborators (seeded per run).
    rng: ChaCha8Rng,

    /// Events dispatched so far.
    steps: u64,
}

impl<W, P> SimulationState<W, P> {
    /// Create the state of a new run at time zero.
    pub fn new(world: W, seed: u64) -> Self {
        Self {
            clock: Clock::new(),
            queue: EventQueue::new(),
            world,
            rng: ChaCha8Rng::seed_from_u64(seed),
            steps: 0,
        }
    }

    /// Current simulated time.
    #[inline]
    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    /// Schedule an event at an absolute time.
    pub fn schedule(
        &mut self,
        time: SimTime,
        kind: EventKind,
        payload: P,
    ) -> EngineResult<EventKey> {
        self.queue.schedule(self.clock.now(), time, kind, payload)
    }

    /// Schedule an event at the current instant.
    pub fn schedule_now(&mut self, kind: EventKind, payload: P) -> EngineResult<EventKey> {
        self.schedule(self.clock.now(), kind, payload)
    }

    /// Schedule an event `delay` seconds from now.
    ///
    /// A negative, NaN or infinite delay fails with
    /// [`EngineError::InvalidTime`].
    pub fn schedule_after(
        &mut self,
        delay: f64,
        kind: EventKind,
        payload: P,
    ) -> EngineResult<EventKey> {
        let now = self.clock.now();
        let time = now
            .offset(delay)
            .filter(|time| *time >= now)
            .ok_or(EngineError::InvalidTime {
                kind,
                requested: now.as_secs() + delay,
                now,
            })?;
        self.schedule(time, kind, payload)
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Split borrow for collaborators that sample while mutating the world.
    pub fn world_and_rng(&mut self) -> (&mut W, &mut ChaCha8Rng) {
        (&mut self.world, &mut self.rng)
    }

    /// Time of the next pending event.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.queue.peek_time()
    }

    /// Number of pending events.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Whether SIMULATION_END has been scheduled in this run.
    pub fn end_scheduled(&self) -> bool {
        self.queue.end_scheduled()
    }

    /// Events dispatched so far in this run.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Consume the state, keeping only the world.
    pub fn into_world(self) -> W {
        self.world
    }

    pub(crate) fn queue_mut(&mut self) -> &mut EventQueue<P> {
        &mut self.queue
    }

    pub(crate) fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub(crate) fn record_step(&mut self) {
        self.steps += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn t(secs: f64) -> SimTime {
        SimTime::new(secs).unwrap()
    }

    #[test]
    fn test_starts_at_zero() {
        let state: SimulationState<(), ()> = SimulationState::new((), 1);
        assert_eq!(state.now(), SimTime::ZERO);
        assert_eq!(state.pending(), 0);
        assert_eq!(state.steps(), 0);
        assert!(!state.end_scheduled());
    }

    #[test]
    fn test_schedule_after_rejects_negative_delay() {
        let mut state: SimulationState<(), ()> = SimulationState::new((), 1);
        state.clock_mut().advance_to(t(5.0)).unwrap();

        let err = state
            .schedule_after(-1.0, EventKind::ProcessEnd, ())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTime { requested, .. } if requested == 4.0));

        assert!(state.schedule_after(f64::NAN, EventKind::ProcessEnd, ()).is_err());
        assert_eq!(state.pending(), 0);
    }

    #[test]
    fn test_schedule_after_adds_delay() {
        let mut state: SimulationState<(), ()> = SimulationState::new((), 1);
        state.clock_mut().advance_to(t(2.0)).unwrap();
        let key = state.schedule_after(1.5, EventKind::ProcessEnd, ()).unwrap();
        assert_eq!(key.time, t(3.5));
        assert_eq!(state.peek_time(), Some(t(3.5)));
    }

    #[test]
    fn test_schedule_into_past_fails() {
        let mut state: SimulationState<(), ()> = SimulationState::new((), 1);
        state.clock_mut().advance_to(t(2.0)).unwrap();
        assert!(matches!(
            state.schedule(t(1.999), EventKind::ExternalArrival, ()),
            Err(EngineError::InvalidTime { .. })
        ));
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a: SimulationState<(), ()> = SimulationState::new((), 99);
        let mut b: SimulationState<(), ()> = SimulationState::new((), 99);
        let xs: Vec<u64> = (0..4).map(|_| a.rng_mut().gen()).collect();
        let ys: Vec<u64> = (0..4).map(|_| b.rng_mut().gen()).collect();
        assert_eq!(xs, ys);
    }
}
