//! The Strategy & Metrics Pipeline (SMP, §4.3): labels each message-bearing
//! event, records relay load, runs every registered strategy against the
//! message, and feeds the 2x2 confusion accounting and latency streams.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use sim_events::Message;
use sim_metrics::MetricsCollector;
use sim_strategy::Strategy;
use tracing::{error, warn};

/// Oracle called once per unlabeled message to establish ground truth.
/// Boxed rather than generic so the engine can hold a trait object set at
/// `setEventLabeler` time, matching the external interface in §6.
pub type EventLabeler = Box<dyn FnMut(&Message, f64) -> bool + Send>;

/// Approximate wire size of a message, the `bytes(m)` referenced by §4.3's
/// relay-load sample. The core does not interpret message contents, so this
/// is a structural byte count, not a protocol-accurate serialization.
fn message_bytes(message: &Message) -> u64 {
    let tags_len: usize = message
        .tags
        .iter()
        .flat_map(|tag| tag.iter())
        .map(|s| s.len())
        .sum();
    (message.id.len() + message.author.len() + message.content.len() + tags_len) as u64
}

pub struct Pipeline {
    labeler: Option<EventLabeler>,
    strategies: Vec<(String, Box<dyn Strategy>)>,
    clock: Instant,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            labeler: None,
            strategies: Vec::new(),
            clock: Instant::now(),
        }
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_labeler(&mut self, labeler: EventLabeler) {
        self.labeler = Some(labeler);
    }

    pub fn register_strategy(&mut self, name: impl Into<String>, strategy: Box<dyn Strategy>) {
        self.strategies.push((name.into(), strategy));
    }

    pub fn strategy_names(&self) -> impl Iterator<Item = &str> {
        self.strategies.iter().map(|(name, _)| name.as_str())
    }

    fn wall_seconds(&self) -> f64 {
        self.clock.elapsed().as_secs_f64()
    }

    /// Run the full per-message protocol of §4.3 steps 1-3f.
    pub fn process_message(&mut self, message: &Message, t: f64, dispatch_cpu_seconds: f64, metrics: &mut MetricsCollector) {
        let is_spam = if let Some(existing) = metrics.label_of(&message.id) {
            Some(existing)
        } else if let Some(labeler) = self.labeler.as_mut() {
            let label = panic::catch_unwind(AssertUnwindSafe(|| labeler(message, t))).unwrap_or_else(|_| {
                error!(target: "pipeline", message_id = %message.id, "event labeler panicked; message left unlabeled");
                false
            });
            Some(metrics.label_message(&message.id, label))
        } else {
            None
        };

        metrics.record_relay_sample(self.wall_seconds(), dispatch_cpu_seconds, message_bytes(message));

        for (name, strategy) in self.strategies.iter_mut() {
            let started = Instant::now();
            let result = match panic::catch_unwind(AssertUnwindSafe(|| strategy.evaluate(message, t))) {
                Ok(result) => result,
                Err(_) => {
                    error!(target: "pipeline", strategy = name.as_str(), message_id = %message.id, "strategy evaluate panicked");
                    metrics.record_error(name);
                    continue;
                }
            };
            let elapsed = started.elapsed().as_secs_f64();
            let latency = result
                .metrics
                .as_ref()
                .and_then(|m| m.get("latency").copied())
                .unwrap_or(elapsed);
            metrics.record_latency(name, latency);

            metrics.record_decision(name, is_spam, !result.allowed);

            if result.allowed {
                if panic::catch_unwind(AssertUnwindSafe(|| strategy.update_state(message, t))).is_err() {
                    error!(target: "pipeline", strategy = name.as_str(), message_id = %message.id, "strategy update_state panicked");
                    metrics.record_error(name);
                }
            } else {
                warn!(target: "pipeline", strategy = name.as_str(), message_id = %message.id, reason = result.reason.as_str(), "message blocked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_events::StrategyResult;
    use sim_strategy::StrategyMetricsSnapshot;

    struct AlwaysBlock;
    impl Strategy for AlwaysBlock {
        fn name(&self) -> &str {
            "always-block"
        }
        fn evaluate(&mut self, _message: &Message, _t: f64) -> StrategyResult {
            StrategyResult::reject("blocked by policy")
        }
        fn update_state(&mut self, _message: &Message, _t: f64) {}
        fn reset_metrics(&mut self) {}
        fn metrics(&self) -> StrategyMetricsSnapshot {
            StrategyMetricsSnapshot::default()
        }
    }

    struct Panics;
    impl Strategy for Panics {
        fn name(&self) -> &str {
            "panics"
        }
        fn evaluate(&mut self, _message: &Message, _t: f64) -> StrategyResult {
            panic!("boom")
        }
        fn update_state(&mut self, _message: &Message, _t: f64) {}
        fn reset_metrics(&mut self) {}
        fn metrics(&self) -> StrategyMetricsSnapshot {
            StrategyMetricsSnapshot::default()
        }
    }

    #[test]
    fn records_decision_against_the_established_label() {
        let mut pipeline = Pipeline::new();
        pipeline.set_labeler(Box::new(|_m, _t| true));
        pipeline.register_strategy("always-block", Box::new(AlwaysBlock));
        let mut metrics = MetricsCollector::new(0.0);
        let msg = Message::new("m1", 1, "alice", 0.0).with_content("buy now");
        pipeline.process_message(&msg, 0.0, 0.0, &mut metrics);
        let report = metrics.comprehensive_report(1.0);
        assert_eq!(report.per_strategy["always-block"].confusion.tp, 1);
    }

    #[test]
    fn panicking_strategy_is_contained_and_counted_as_an_error() {
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));
        let mut pipeline = Pipeline::new();
        pipeline.register_strategy("panics", Box::new(Panics));
        let mut metrics = MetricsCollector::new(0.0);
        let msg = Message::new("m1", 1, "alice", 0.0);
        pipeline.process_message(&msg, 0.0, 0.0, &mut metrics);
        std::panic::set_hook(original_hook);
        let report = metrics.comprehensive_report(1.0);
        assert_eq!(report.errors_by_strategy["panics"], 1);
    }

    #[test]
    fn unlabeled_message_contributes_no_confusion_counts() {
        let mut pipeline = Pipeline::new();
        pipeline.register_strategy("always-block", Box::new(AlwaysBlock));
        let mut metrics = MetricsCollector::new(0.0);
        let msg = Message::new("m1", 1, "alice", 0.0);
        pipeline.process_message(&msg, 0.0, 0.0, &mut metrics);
        let report = metrics.comprehensive_report(1.0);
        assert_eq!(report.overall.tp + report.overall.fp + report.overall.tn + report.overall.fn_, 0);
    }
}
