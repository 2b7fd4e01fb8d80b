//! Event log: one line per dispatched event with the state of every computer.

use crate::computer::Computer;
use crate::message::Message;
use crate::network::ComputerNetwork;
use netsim_core::{EventRecord, RunIndex};
use netsim_simulation::{Delivery, EventObserver, SimulationState};
use tracing::info;

/// Logs the clock, the event and each computer's state and queue length.
#[derive(Debug, Default, Clone, Copy)]
pub struct StationLogger;

impl EventObserver<ComputerNetwork, Delivery<Message>> for StationLogger {
    fn on_event(
        &mut self,
        run: RunIndex,
        record: &EventRecord,
        state: &SimulationState<ComputerNetwork, Delivery<Message>>,
    ) {
        let network = state.world();
        let master = network.computer(Computer::Master);
        let worker = network.computer(Computer::Worker);
        let lazy = network.computer(Computer::Lazy);
        info!(
            run,
            clock = record.time.as_secs(),
            event = %record.kind,
            master = master.state_label(),
            master_queue = master.queue_len(),
            worker = worker.state_label(),
            worker_queue = worker.queue_len(),
            lazy = lazy.state_label(),
            lazy_queue = lazy.queue_len(),
            "Event"
        );
    }

    fn on_run_finished(
        &mut self,
        run: RunIndex,
        state: &SimulationState<ComputerNetwork, Delivery<Message>>,
    ) {
        info!(
            run,
            clock = state.now().as_secs(),
            discarded = state.pending(),
            "Run finished"
        );
    }
}
