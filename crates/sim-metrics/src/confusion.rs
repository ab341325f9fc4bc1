//! Confusion-matrix accounting: one instance per strategy plus one overall.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default)]
pub struct ConfusionCounts {
    pub tp: u64,
    pub tn: u64,
    pub fp: u64,
    pub fn_: u64,
    pub total_spam: u64,
    pub blocked_spam: u64,
    pub allowed_spam: u64,
    pub total_legit: u64,
    pub blocked_legit: u64,
}

impl ConfusionCounts {
    /// Record one strategy decision against a known ground-truth label.
    /// `blocked` is `!result.allowed`.
    pub fn record(&mut self, is_spam: bool, blocked: bool) {
        match (is_spam, blocked) {
            (true, true) => self.tp += 1,
            (true, false) => self.fn_ += 1,
            (false, true) => self.fp += 1,
            (false, false) => self.tn += 1,
        }
        if is_spam {
            self.total_spam += 1;
            if blocked {
                self.blocked_spam += 1;
            } else {
                self.allowed_spam += 1;
            }
        } else {
            self.total_legit += 1;
            if blocked {
                self.blocked_legit += 1;
            }
        }
    }

    pub fn precision(&self) -> f64 {
        let denom = self.tp + self.fp;
        if denom == 0 { 0.0 } else { self.tp as f64 / denom as f64 }
    }

    pub fn recall(&self) -> f64 {
        let denom = self.tp + self.fn_;
        if denom == 0 { 0.0 } else { self.tp as f64 / denom as f64 }
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
    }

    pub fn accuracy(&self) -> f64 {
        let denom = self.tp + self.tn + self.fp + self.fn_;
        if denom == 0 {
            0.0
        } else {
            (self.tp + self.tn) as f64 / denom as f64
        }
    }

    pub fn spam_reduction_pct(&self) -> f64 {
        if self.total_spam == 0 {
            0.0
        } else {
            self.blocked_spam as f64 / self.total_spam as f64 * 100.0
        }
    }

    pub fn legit_pass_rate(&self) -> f64 {
        if self.total_legit == 0 {
            0.0
        } else {
            (self.total_legit - self.blocked_legit) as f64 / self.total_legit as f64 * 100.0
        }
    }

    pub fn snapshot(&self) -> ConfusionSnapshot {
        ConfusionSnapshot {
            tp: self.tp,
            tn: self.tn,
            fp: self.fp,
            fn_: self.fn_,
            total_spam: self.total_spam,
            blocked_spam: self.blocked_spam,
            allowed_spam: self.allowed_spam,
            total_legit: self.total_legit,
            blocked_legit: self.blocked_legit,
            precision: self.precision(),
            recall: self.recall(),
            f1: self.f1(),
            accuracy: self.accuracy(),
            spam_reduction_pct: self.spam_reduction_pct(),
            legit_pass_rate: self.legit_pass_rate(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ConfusionSnapshot {
    pub tp: u64,
    pub tn: u64,
    pub fp: u64,
    pub fn_: u64,
    pub total_spam: u64,
    pub blocked_spam: u64,
    pub allowed_spam: u64,
    pub total_legit: u64,
    pub blocked_legit: u64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub accuracy: f64,
    pub spam_reduction_pct: f64,
    pub legit_pass_rate: f64,
}
