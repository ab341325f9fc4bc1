//! Top-level metrics collector owned by the engine: the single place all
//! per-run accounting lands, and the source of the comprehensive report.

use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use crate::confusion::{ConfusionCounts, ConfusionSnapshot};
use crate::latency::{LatencySnapshot, LatencyTracker};
use crate::relay_load::{RelayLoadMonitor, RelayLoadSnapshot};
use crate::resilience::{ResilienceSnapshot, ResilienceTracker};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub time: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateSeriesPoint {
    pub time: f64,
    pub events_per_second: f64,
    pub simulation_speed_factor: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyReport {
    pub confusion: ConfusionSnapshot,
    pub latency: LatencySnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComprehensiveReport {
    pub collection_window: (f64, f64),
    pub overall: ConfusionSnapshot,
    pub per_strategy: HashMap<String, StrategyReport>,
    pub relay_load: RelayLoadSnapshot,
    pub latency_overall: LatencySnapshot,
    pub resilience: ResilienceSnapshot,
    pub errors_by_strategy: HashMap<String, u64>,
}

#[derive(Debug)]
pub struct MetricsCollector {
    window_start: f64,
    labels: HashMap<String, bool>,
    overall_confusion: ConfusionCounts,
    per_strategy_confusion: HashMap<String, ConfusionCounts>,
    overall_latency: LatencyTracker,
    per_strategy_latency: HashMap<String, LatencyTracker>,
    relay_load: RelayLoadMonitor,
    resilience: ResilienceTracker,
    errors_by_strategy: HashMap<String, u64>,
    queue_size_series: Vec<TimeSeriesPoint>,
    events_processed_series: Vec<TimeSeriesPoint>,
    rate_series: Vec<RateSeriesPoint>,
}

impl MetricsCollector {
    pub fn new(window_start: f64) -> Self {
        Self::with_relay_window(window_start, crate::relay_load::DEFAULT_WINDOW_CAPACITY)
    }

    /// Same as [`MetricsCollector::new`] but with an explicit relay-load
    /// sliding-window capacity (§4.3 "N configurable, default 100").
    pub fn with_relay_window(window_start: f64, relay_window: usize) -> Self {
        Self {
            window_start,
            labels: HashMap::new(),
            overall_confusion: ConfusionCounts::default(),
            per_strategy_confusion: HashMap::new(),
            overall_latency: LatencyTracker::default(),
            per_strategy_latency: HashMap::new(),
            relay_load: RelayLoadMonitor::with_capacity(relay_window),
            resilience: ResilienceTracker::default(),
            errors_by_strategy: HashMap::new(),
            queue_size_series: Vec::new(),
            events_processed_series: Vec::new(),
            rate_series: Vec::new(),
        }
    }

    /// Record a ground-truth label for a message. Monotonic: once a message
    /// has been labeled, later calls for the same id are ignored.
    pub fn label_message(&mut self, message_id: &str, is_spam: bool) -> bool {
        if self.labels.contains_key(message_id) {
            return self.labels[message_id];
        }
        self.labels.insert(message_id.to_string(), is_spam);
        is_spam
    }

    pub fn label_of(&self, message_id: &str) -> Option<bool> {
        self.labels.get(message_id).copied()
    }

    pub fn record_relay_sample(&mut self, t_real: f64, cpu_seconds: f64, bytes: u64) {
        self.relay_load.record(t_real, cpu_seconds, bytes);
    }

    /// Record one strategy's decision against the message's label, if any
    /// has been established. `blocked` is `!result.allowed`.
    pub fn record_decision(&mut self, strategy: &str, is_spam: Option<bool>, blocked: bool) {
        let Some(is_spam) = is_spam else {
            return;
        };
        self.overall_confusion.record(is_spam, blocked);
        self.per_strategy_confusion
            .entry(strategy.to_string())
            .or_default()
            .record(is_spam, blocked);
    }

    pub fn record_latency(&mut self, strategy: &str, seconds: f64) {
        self.overall_latency.record(seconds);
        self.per_strategy_latency
            .entry(strategy.to_string())
            .or_default()
            .record(seconds);
    }

    pub fn record_error(&mut self, strategy: &str) {
        *self.errors_by_strategy.entry(strategy.to_string()).or_insert(0) += 1;
        warn!(target: "metrics", strategy, "strategy error recorded");
    }

    pub fn record_attack(&mut self, attack_type: impl Into<String>, detected: bool, t: f64) {
        self.resilience.record_attack(attack_type, detected, t);
    }

    pub fn start_recovery(&mut self, attack_type: impl Into<String>, wall_now: f64) {
        self.resilience.start_recovery(attack_type, wall_now);
    }

    pub fn end_recovery(&mut self, attack_type: &str, wall_now: f64) {
        self.resilience.end_recovery(attack_type, wall_now);
    }

    pub fn record_adaptive_response(&mut self) {
        self.resilience.record_adaptive_response();
    }

    pub fn update_sybil_resistance(&mut self, score: f64) {
        self.resilience.update_sybil_resistance(score);
    }

    /// Append one periodic sample point, taken by the engine once per
    /// `metricsInterval` of simulation time.
    pub fn snapshot_time_series(&mut self, sim_time: f64, queue_size: usize, events_processed: u64) {
        self.queue_size_series.push(TimeSeriesPoint {
            time: sim_time,
            value: queue_size as f64,
        });
        self.events_processed_series.push(TimeSeriesPoint {
            time: sim_time,
            value: events_processed as f64,
        });
    }

    /// Append a real-time-rate sample: events dispatched per real second and
    /// the ratio of simulated to real time since the run started.
    pub fn snapshot_rate(&mut self, sim_time: f64, events_per_second: f64, simulation_speed_factor: f64) {
        self.rate_series.push(RateSeriesPoint {
            time: sim_time,
            events_per_second,
            simulation_speed_factor,
        });
    }

    pub fn queue_size_series(&self) -> &[TimeSeriesPoint] {
        &self.queue_size_series
    }

    pub fn events_processed_series(&self) -> &[TimeSeriesPoint] {
        &self.events_processed_series
    }

    pub fn rate_series(&self) -> &[RateSeriesPoint] {
        &self.rate_series
    }

    pub fn snapshot_count(&self) -> usize {
        self.queue_size_series.len()
    }

    pub fn comprehensive_report(&self, now: f64) -> ComprehensiveReport {
        let mut per_strategy = HashMap::new();
        let names: std::collections::HashSet<&String> = self
            .per_strategy_confusion
            .keys()
            .chain(self.per_strategy_latency.keys())
            .collect();
        for name in names {
            let confusion = self
                .per_strategy_confusion
                .get(name)
                .map(ConfusionCounts::snapshot)
                .unwrap_or_default();
            let latency = self
                .per_strategy_latency
                .get(name)
                .map(LatencyTracker::snapshot)
                .unwrap_or_default();
            per_strategy.insert(name.clone(), StrategyReport { confusion, latency });
        }

        ComprehensiveReport {
            collection_window: (self.window_start, now),
            overall: self.overall_confusion.snapshot(),
            per_strategy,
            relay_load: self.relay_load.snapshot(now),
            latency_overall: self.overall_latency.snapshot(),
            resilience: self.resilience.snapshot(),
            errors_by_strategy: self.errors_by_strategy.clone(),
        }
    }
}
