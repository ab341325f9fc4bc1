//! Per-strategy counters, atomic so a strategy can be shared across
//! reporting boundaries without an external lock (see `core-render`'s
//! `RenderPathMetrics` for the pattern this mirrors).

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct StrategyMetrics {
    evaluations: AtomicU64,
    allowed: AtomicU64,
    blocked: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StrategyMetricsSnapshot {
    pub evaluations: u64,
    pub allowed: u64,
    pub blocked: u64,
}

impl StrategyMetrics {
    pub fn record_evaluation(&self) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decision(&self, allowed: bool) {
        self.record_evaluation();
        if allowed {
            self.allowed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.blocked.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StrategyMetricsSnapshot {
        StrategyMetricsSnapshot {
            evaluations: self.evaluations.load(Ordering::Relaxed),
            allowed: self.allowed.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
        }
    }
}
