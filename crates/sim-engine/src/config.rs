//! Engine run configuration (§4.2, §6). Validated at construction so an
//! invalid run never starts rather than failing mid-dispatch.

use crate::error::EngineError;

/// Upper bound on pending relay-load / latency sample retention if a caller
/// does not override it (§4.3 "N configurable, default 100").
pub const DEFAULT_RELAY_WINDOW: usize = 100;

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Exclusive upper bound on simulation time; an event scheduled at or
    /// after this is never dispatched.
    pub duration: f64,
    /// Advisory quantum for periodic tasks. Not enforced by the engine
    /// itself; carried through for handlers that schedule on a fixed tick.
    pub time_step: f64,
    /// Optional cap on the number of events processed in one run.
    pub max_events: Option<u64>,
    /// Minimum simulation-time gap between periodic metrics snapshots.
    pub metrics_interval: f64,
    /// Sliding-window capacity for relay-load samples.
    pub relay_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            duration: 3600.0,
            time_step: 1.0,
            max_events: None,
            metrics_interval: 10.0,
            relay_window: DEFAULT_RELAY_WINDOW,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.duration > 0.0) || !self.duration.is_finite() {
            return Err(EngineError::InvalidConfig(format!(
                "duration must be a finite, positive number of seconds, got {}",
                self.duration
            )));
        }
        if !(self.time_step > 0.0) || !self.time_step.is_finite() {
            return Err(EngineError::InvalidConfig(format!(
                "timeStep must be a finite, positive number of seconds, got {}",
                self.time_step
            )));
        }
        if !(self.metrics_interval > 0.0) || !self.metrics_interval.is_finite() {
            return Err(EngineError::InvalidConfig(format!(
                "metricsInterval must be a finite, positive number of seconds, got {}",
                self.metrics_interval
            )));
        }
        Ok(())
    }
}
