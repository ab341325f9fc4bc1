//! A fixed-window per-author rate limiter: the one illustrative [`Strategy`]
//! implementation in this workspace (§10), exercising every hook the
//! contract defines.

use std::collections::{HashMap, VecDeque};

use sim_events::{Message, StrategyResult};
use sim_strategy::{Strategy, StrategyMetrics, StrategyMetricsSnapshot};

/// Blocks an author once they have posted `max_messages` admitted messages
/// within the trailing `window_seconds`. The per-author history is only
/// ever written in `update_state`, never in `evaluate` (§4.3 rule d/e: state
/// updates reflect only admitted traffic).
pub struct FixedWindowRateLimit {
    max_messages: usize,
    window_seconds: f64,
    history: HashMap<String, VecDeque<f64>>,
    metrics: StrategyMetrics,
}

impl FixedWindowRateLimit {
    pub fn new(max_messages: usize, window_seconds: f64) -> Self {
        Self {
            max_messages,
            window_seconds,
            history: HashMap::new(),
            metrics: StrategyMetrics::default(),
        }
    }

    fn admitted_count_in_window(&self, author: &str, t: f64) -> usize {
        self.history
            .get(author)
            .map(|window| window.iter().filter(|&&ts| t - ts < self.window_seconds).count())
            .unwrap_or(0)
    }
}

impl Strategy for FixedWindowRateLimit {
    fn name(&self) -> &str {
        "fixed-window-rate-limit"
    }

    fn evaluate(&mut self, message: &Message, t: f64) -> StrategyResult {
        let count = self.admitted_count_in_window(&message.author, t);
        let allowed = count < self.max_messages;
        self.metrics.record_decision(allowed);
        if allowed {
            StrategyResult::allow(format!(
                "author {} has {}/{} messages in the trailing {:.0}s window",
                message.author, count, self.max_messages, self.window_seconds
            ))
        } else {
            StrategyResult::reject(format!(
                "author {} exceeded {} messages in the trailing {:.0}s window",
                message.author, self.max_messages, self.window_seconds
            ))
        }
    }

    fn update_state(&mut self, message: &Message, t: f64) {
        let window = self.history.entry(message.author.clone()).or_default();
        window.push_back(t);
        while let Some(&front) = window.front() {
            if t - front >= self.window_seconds {
                window.pop_front();
            } else {
                break;
            }
        }
    }

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

    fn msg(id: &str, author: &str, t: f64) -> Message {
        Message::new(id, 1, author, t)
    }

    #[test]
    fn allows_up_to_the_configured_limit_then_blocks() {
        let mut strategy = FixedWindowRateLimit::new(2, 60.0);

        let r1 = strategy.evaluate(&msg("m1", "alice", 0.0), 0.0);
        assert!(r1.allowed);
        strategy.update_state(&msg("m1", "alice", 0.0), 0.0);

        let r2 = strategy.evaluate(&msg("m2", "alice", 1.0), 1.0);
        assert!(r2.allowed);
        strategy.update_state(&msg("m2", "alice", 1.0), 1.0);

        let r3 = strategy.evaluate(&msg("m3", "alice", 2.0), 2.0);
        assert!(!r3.allowed, "third message within the window should be blocked");
    }

    #[test]
    fn window_expiry_frees_up_capacity() {
        let mut strategy = FixedWindowRateLimit::new(1, 10.0);
        strategy.evaluate(&msg("m1", "alice", 0.0), 0.0);
        strategy.update_state(&msg("m1", "alice", 0.0), 0.0);

        let blocked = strategy.evaluate(&msg("m2", "alice", 5.0), 5.0);
        assert!(!blocked.allowed);

        let allowed_again = strategy.evaluate(&msg("m3", "alice", 11.0), 11.0);
        assert!(allowed_again.allowed, "window has slid past the first message");
    }

    #[test]
    fn authors_are_tracked_independently() {
        let mut strategy = FixedWindowRateLimit::new(1, 60.0);
        strategy.evaluate(&msg("m1", "alice", 0.0), 0.0);
        strategy.update_state(&msg("m1", "alice", 0.0), 0.0);

        let bob = strategy.evaluate(&msg("m2", "bob", 0.5), 0.5);
        assert!(bob.allowed, "bob has his own independent window");
    }

    #[test]
    fn blocked_messages_do_not_consume_window_capacity() {
        let mut strategy = FixedWindowRateLimit::new(1, 60.0);
        strategy.evaluate(&msg("m1", "alice", 0.0), 0.0);
        strategy.update_state(&msg("m1", "alice", 0.0), 0.0);

        let blocked = strategy.evaluate(&msg("m2", "alice", 1.0), 1.0);
        assert!(!blocked.allowed);
        // update_state is never called for a blocked message by contract;
        // a subsequent evaluate should see the same admitted count.
        let still_blocked = strategy.evaluate(&msg("m3", "alice", 2.0), 2.0);
        assert!(!still_blocked.allowed);
    }
}
