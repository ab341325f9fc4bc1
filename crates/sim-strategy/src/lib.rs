//! The anti-spam strategy contract.
//!
//! A [`Strategy`] is a stateful message classifier: `evaluate` is read-only
//! with respect to the strategy's own state (it may consult it, but the SMP
//! pipeline is the only thing permitted to follow up with a state mutation,
//! via `update_state`, and only when the message was admitted). Concrete
//! strategies (rate limiting, proof-of-work, web-of-trust, reputation
//! tokens) are deliberately out of this crate; `demos::rate_limit` is the
//! one illustrative implementation exercising every hook.

mod metrics;

pub use metrics::{StrategyMetrics, StrategyMetricsSnapshot};

use sim_events::{Message, StrategyResult};

/// Stateful anti-spam classifier. Strategies are independent of one
/// another; the pipeline never lets one strategy observe another's state.
pub trait Strategy: Send {
    /// Stable identifier used to key per-strategy counters and reports.
    fn name(&self) -> &str;

    /// Judge one message at simulation time `t`. Must not mutate state that
    /// `update_state` or `metrics` would observe; a strategy that needs
    /// per-evaluation bookkeeping (e.g. a PoW nonce check cost) tracks it
    /// through its own metrics snapshot, not through evaluate-side mutation.
    fn evaluate(&mut self, message: &Message, t: f64) -> StrategyResult;

    /// Apply state changes implied by admitting `message`. The pipeline
    /// calls this only when the corresponding `evaluate` returned
    /// `allowed = true`.
    fn update_state(&mut self, message: &Message, t: f64);

    /// Reset all strategy-owned counters to a fresh-start state, without
    /// discarding the classification state itself (e.g. a rate limiter
    /// clears its metrics but keeps author windows).
    fn reset_metrics(&mut self);

    /// Point-in-time snapshot of this strategy's own counters.
    fn metrics(&self) -> StrategyMetricsSnapshot;
}

impl<T: Strategy + ?Sized> Strategy for &mut T {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn evaluate(&mut self, message: &Message, t: f64) -> StrategyResult {
        (**self).evaluate(message, t)
    }
    fn update_state(&mut self, message: &Message, t: f64) {
        (**self).update_state(message, t)
    }
    fn reset_metrics(&mut self) {
        (**self).reset_metrics()
    }
    fn metrics(&self) -> StrategyMetricsSnapshot {
        (**self).metrics()
    }
}

/// A strategy that allows every message. Useful as a pipeline placeholder
/// and as a baseline in comparative reports.
#[derive(Debug, Default)]
pub struct NoopStrategy {
    metrics: StrategyMetrics,
}

impl NoopStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for NoopStrategy {
    fn name(&self) -> &str {
        "noop"
    }

    fn evaluate(&mut self, _message: &Message, _t: f64) -> StrategyResult {
        self.metrics.record_evaluation();
        StrategyResult::allow("noop strategy allows everything")
    }

    fn update_state(&mut self, _message: &Message, _t: f64) {}

    fn reset_metrics(&mut self) {
        self.metrics = StrategyMetrics::default();
    }

    fn metrics(&self) -> StrategyMetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_strategy_always_allows_and_counts_evaluations() {
        let mut strategy = NoopStrategy::new();
        let msg = Message::new("m1", 1, "alice", 0.0);
        let result = strategy.evaluate(&msg, 0.0);
        assert!(result.allowed);
        assert_eq!(strategy.metrics().evaluations, 1);
    }

    #[test]
    fn reset_metrics_clears_counters() {
        let mut strategy = NoopStrategy::new();
        let msg = Message::new("m1", 1, "alice", 0.0);
        strategy.evaluate(&msg, 0.0);
        strategy.reset_metrics();
        assert_eq!(strategy.metrics().evaluations, 0);
    }
}
