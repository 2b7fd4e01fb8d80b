//! Core types for the netsim discrete-event engine.
//!
//! This crate holds the pieces every other crate agrees on:
//!
//! - [`SimTime`] and [`Clock`]: simulated time, never wall-clock
//! - [`Event`], [`EventKind`], [`EventFamily`]: immutable event records and
//!   their classification
//! - [`EventQueue`]: pending events ordered by `(time, sequence)`
//! - [`EngineError`]: everything that can go wrong while scheduling or
//!   dispatching
//!
//! No domain logic lives here.

mod error;
mod event;
mod event_queue;
mod identifiers;
mod time;

pub use error::{EngineError, EngineResult};
pub use event::{Event, EventFamily, EventKey, EventKind, EventRecord};
pub use event_queue::EventQueue;
pub use identifiers::{RunIndex, StationId};
pub use time::{Clock, SimTime};
