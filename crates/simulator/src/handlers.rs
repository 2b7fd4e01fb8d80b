//! Direct handlers of the message system and registry assembly.

use crate::message::Message;
use crate::network::{ComputerNetwork, LAZY_REJECT, MASTER_SEND};
use netsim_core::{EngineError, EngineResult, Event};
use netsim_simulation::{families, Delivery, HandlerRegistry, NetworkState};
use tracing::trace;

/// Registry with the baseline families plus `master_send` and `lazy_reject`.
pub fn build_registry() -> EngineResult<HandlerRegistry<ComputerNetwork, Delivery<Message>>> {
    let mut registry = HandlerRegistry::new();
    families::install(&mut registry)?;
    registry.register_handler(MASTER_SEND, on_master_send)?;
    registry.register_handler(LAZY_REJECT, on_lazy_reject)?;
    Ok(registry)
}

fn on_master_send(
    event: &Event<Delivery<Message>>,
    state: &mut NetworkState<ComputerNetwork>,
) -> EngineResult<()> {
    let mut message = leaving_message(event)?;
    message.exit_time = Some(state.now());
    trace!(id = message.id, source = %message.source, "Message sent");
    state.world_mut().record_sent(&message);
    Ok(())
}

fn on_lazy_reject(
    event: &Event<Delivery<Message>>,
    state: &mut NetworkState<ComputerNetwork>,
) -> EngineResult<()> {
    let mut message = leaving_message(event)?;
    message.exit_time = Some(state.now());
    message.rejected = true;
    trace!(id = message.id, "Message rejected");
    state.world_mut().record_rejected(&message);
    Ok(())
}

fn leaving_message(event: &Event<Delivery<Message>>) -> EngineResult<Message> {
    event
        .payload()
        .message
        .clone()
        .ok_or(EngineError::MissingPayload {
            kind: event.kind(),
            missing: "message",
        })
}
