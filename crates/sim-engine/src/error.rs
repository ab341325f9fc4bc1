//! Engine-level error taxonomy. Fatal variants abort the run (§7); everything
//! else (scheduling, handler/strategy failures) is contained at its call site
//! and never reaches here.

use sim_events::ScheduleError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// The popped event's time is earlier than the clock already advanced to.
    /// Can only happen if a caller bypasses `EventQueue` invariants; treated
    /// as programmer error, not a recoverable condition.
    #[error("clock regression: dispatched event at t={popped} after clock reached t={current}")]
    ClockRegression { current: f64, popped: f64 },

    /// The queue returned an event whose id it has no record of, or some
    /// other internal bookkeeping mismatch.
    #[error("event queue corruption: {0}")]
    QueueCorruption(String),

    /// `start()` called on an engine that is not `Idle`.
    #[error("engine already started: current state is {0}")]
    AlreadyStarted(&'static str),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}
