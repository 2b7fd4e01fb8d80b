//! Event kind → handler mapping.

use crate::state::SimulationState;
use netsim_core::{EngineError, EngineResult, Event, EventFamily, EventKind};
use std::collections::BTreeMap;

/// A handler for one event kind or family.
///
/// May schedule further events and mutate the world through the state.
pub type Handler<W, P> =
    Box<dyn Fn(&Event<P>, &mut SimulationState<W, P>) -> EngineResult<()> + Send + Sync>;

/// Maps event kinds to kinds' families.
pub type Classifier = fn(&EventKind) -> Option<EventFamily>;

/// Direct handlers plus family handlers.
///
/// Lookup order for an event kind:
/// 1. A direct handler registered for exactly that kind.
/// 2. The handler of the family the classifier assigns to the kind.
///
/// The `End` family comes with a no-op handler, since SIMULATION_END only
/// marks termination. Register a direct handler for
/// [`EventKind::SimulationEnd`] to hook into it.
///
/// The registry is filled in before any run and then moved into the run
/// controller, so handlers cannot change while a run is in progress.
pub struct HandlerRegistry<W, P> {
    direct: BTreeMap<EventKind, Handler<W, P>>,
    families: BTreeMap<EventFamily, Handler<W, P>>,
    classifier: Classifier,
}

impl<W: 'static, P: 'static> Default for HandlerRegistry<W, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: 'static, P: 'static> HandlerRegistry<W, P> {
    /// An empty registry using [`EventFamily::classify`].
    pub fn new() -> Self {
        Self::with_classifier(EventFamily::classify)
    }

    /// An empty registry with a custom kind → family mapping.
    pub fn with_classifier(classifier: Classifier) -> Self {
        let mut families: BTreeMap<EventFamily, Handler<W, P>> = BTreeMap::new();
        families.insert(EventFamily::End, Box::new(ignore::<W, P>));
        Self {
            direct: BTreeMap::new(),
            families,
            classifier,
        }
    }

    /// Install a direct handler. Direct handlers bypass family
    /// classification entirely.
    pub fn register_handler<F>(&mut self, kind: EventKind, handler: F) -> EngineResult<()>
    where
        F: Fn(&Event<P>, &mut SimulationState<W, P>) -> EngineResult<()> + Send + Sync + 'static,
    {
        if self.direct.contains_key(&kind) {
            return Err(EngineError::HandlerAlreadyRegistered(kind));
        }
        self.direct.insert(kind, Box::new(handler));
        Ok(())
    }

    /// Install the handler for a whole family.
    pub fn register_family<F>(&mut self, family: EventFamily, handler: F) -> EngineResult<()>
    where
        F: Fn(&Event<P>, &mut SimulationState<W, P>) -> EngineResult<()> + Send + Sync + 'static,
    {
        if self.families.contains_key(&family) {
            return Err(EngineError::FamilyAlreadyRegistered(family));
        }
        self.families.insert(family, Box::new(handler));
        Ok(())
    }

    /// Find the handler for `kind`, direct first, then by family.
    pub fn resolve(&self, kind: &EventKind) -> Option<&Handler<W, P>> {
        self.direct
            .get(kind)
            .or_else(|| (self.classifier)(kind).and_then(|family| self.families.get(&family)))
    }

    /// Family the classifier assigns to `kind`.
    pub fn family_of(&self, kind: &EventKind) -> Option<EventFamily> {
        (self.classifier)(kind)
    }

    pub fn has_direct_handler(&self, kind: &EventKind) -> bool {
        self.direct.contains_key(kind)
    }
}

fn ignore<W, P>(_event: &Event<P>, _state: &mut SimulationState<W, P>) -> EngineResult<()> {
    Ok(())
}
