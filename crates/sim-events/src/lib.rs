//! Event, message, and strategy-result types plus the time-ordered event queue (TEQ).
//!
//! This crate is the leaf of the simulation stack: it owns no handler or
//! strategy logic, only the data model and the queue that orders pending
//! events by `(time, priority, sequence)`.

mod event;
mod message;
mod queue;

pub use event::{Event, EventId, EventSpec, Payload, PayloadValue};
pub use message::{Message, StrategyResult};
pub use queue::{EventQueue, ScheduleError};
