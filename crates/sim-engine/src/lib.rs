//! The Dispatcher & Engine (DE) and Strategy & Metrics Pipeline (SMP): the
//! single-threaded, cooperative run loop that drains `sim_events::EventQueue`
//! in order, routes events to registered handlers, and — for message-bearing
//! events — scores them against every registered anti-spam strategy.
//!
//! This crate owns no concrete handler or strategy; those live in
//! `demos` or a researcher's own crate and plug in through [`Handler`] and
//! `sim_strategy::Strategy`.

mod config;
mod engine;
mod error;
mod handler;
mod pipeline;
mod state;
mod stop;

pub use config::{DEFAULT_RELAY_WINDOW, EngineConfig};
pub use engine::Engine;
pub use error::EngineError;
pub use handler::{Handler, HandlerId};
pub use pipeline::EventLabeler;
pub use state::{EngineState, StopReason};
pub use stop::StopHandle;
