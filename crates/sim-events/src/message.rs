//! Message data model and the result a strategy returns after evaluating one.

use std::collections::HashMap;

/// A relay message: the thing anti-spam strategies actually evaluate.
///
/// Mirrors the original source's event model (unique identity, kind tag,
/// author identity, creation timestamp, content payload, arbitrary tags).
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub kind: u32,
    pub author: String,
    pub created_at: f64,
    pub content: String,
    pub tags: Vec<Vec<String>>,
}

impl Message {
    pub fn new(id: impl Into<String>, kind: u32, author: impl Into<String>, created_at: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            author: author.into(),
            created_at,
            content: String::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<Vec<String>>) -> Self {
        self.tags = tags;
        self
    }
}

/// Verdict produced by an anti-spam strategy for one message.
///
/// Defaults to the conservative rejection the original contract tests
/// require: a strategy that panics or is mis-wired must not silently pass
/// spam through.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyResult {
    pub allowed: bool,
    pub reason: String,
    pub metrics: Option<HashMap<String, f64>>,
    pub computational_cost: f64,
}

impl Default for StrategyResult {
    fn default() -> Self {
        Self {
            allowed: false,
            reason: String::new(),
            metrics: None,
            computational_cost: 0.0,
        }
    }
}

impl StrategyResult {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
            ..Self::default()
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            ..Self::default()
        }
    }

    pub fn with_cost(mut self, computational_cost: f64) -> Self {
        self.computational_cost = computational_cost;
        self
    }

    pub fn with_metrics(mut self, metrics: HashMap<String, f64>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_result_is_a_conservative_reject() {
        let r = StrategyResult::default();
        assert!(!r.allowed);
        assert_eq!(r.computational_cost, 0.0);
        assert!(r.metrics.is_none());
    }

    #[test]
    fn allow_and_reject_builders_set_the_flag() {
        assert!(StrategyResult::allow("ok").allowed);
        assert!(!StrategyResult::reject("spam").allowed);
    }
}
