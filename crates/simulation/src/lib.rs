//! Deterministic discrete-event simulation engine.
//!
//! Given the same seed and the same handlers, a batch produces identical
//! results every time, sequentially or in parallel.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    RunController                        │
//! │   for each run: fresh SimulationState + derived seed    │
//! │                                                         │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     EventQueue (BTreeMap<EventKey, Event>)         │ │
//! │  │     Ordered by: time, then insertion sequence      │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │ pop earliest, advance Clock │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Dispatcher → HandlerRegistry                   │ │
//! │  │     direct handler, else family handler            │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Handlers mutate the world, schedule events     │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           ▼                             │
//! │        StopCondition: SIMULATION_END at the horizon     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Queueing networks get the arrival/processing pipeline for free through
//! [`families::install`] and the [`QueueNetwork`] trait.

mod dispatcher;
pub mod families;
mod observer;
mod registry;
mod runner;
mod state;
mod station;
mod stop;

pub use dispatcher::{Dispatcher, Outcome};
pub use families::{Delivery, NetworkState, OutcomeDecision, QueueNetwork};
pub use observer::{EventObserver, EventTrace, NoopObserver, TracingObserver};
pub use registry::{Classifier, Handler, HandlerRegistry};
pub use runner::{
    derive_run_seed, RunConfig, RunController, RunResult, RunStatus, Scenario, DEFAULT_MAX_STEPS,
};
pub use state::SimulationState;
pub use station::Station;
pub use stop::{StopCondition, StopReason};
