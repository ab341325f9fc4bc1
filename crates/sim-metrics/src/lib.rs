//! Ground-truth accounting, latency/relay-load measurement, and resilience
//! tracking for one simulation run.
//!
//! Everything here is owned by the engine and accessed from its single
//! dispatch thread (see the concurrency model): no atomics, no locks, plain
//! `&mut self` bookkeeping. Snapshots are value copies so a report can be
//! handed out without holding the collector live.

mod collector;
mod confusion;
mod latency;
mod relay_load;
mod resilience;

pub use collector::{ComprehensiveReport, MetricsCollector, RateSeriesPoint, StrategyReport, TimeSeriesPoint};
pub use confusion::{ConfusionCounts, ConfusionSnapshot};
pub use latency::{LatencySnapshot, LatencyTracker};
pub use relay_load::{RelayLoadMonitor, RelayLoadSnapshot};
pub use resilience::{AttackRecord, ResilienceSnapshot, ResilienceTracker};
