//! Attack/resilience tracking: an immutable attack timeline, offline-attack
//! detection counters, wall-clock recovery accounting, and a clamped sybil
//! resistance score.

use std::collections::HashMap;

use serde::Serialize;

const OFFLINE_ATTACK_PREFIX: &str = "offline_";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttackRecord {
    pub attack_type: String,
    pub detected: bool,
    pub t: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ResilienceTracker {
    timeline: Vec<AttackRecord>,
    offline_detected: u64,
    offline_missed: u64,
    recovery_starts: HashMap<String, f64>,
    total_recovery_seconds: f64,
    sybil_resistance_score: f64,
    adaptive_responses: u64,
}

impl ResilienceTracker {
    /// Append an attack observation. Offline attacks are identified by the
    /// `offline_` type prefix and counted separately as detected or missed.
    pub fn record_attack(&mut self, attack_type: impl Into<String>, detected: bool, t: f64) {
        let attack_type = attack_type.into();
        if attack_type.starts_with(OFFLINE_ATTACK_PREFIX) {
            if detected {
                self.offline_detected += 1;
            } else {
                self.offline_missed += 1;
            }
        }
        self.timeline.push(AttackRecord {
            attack_type,
            detected,
            t,
        });
    }

    /// Begin wall-clock recovery timing for an attack type.
    pub fn start_recovery(&mut self, attack_type: impl Into<String>, wall_now: f64) {
        self.recovery_starts.insert(attack_type.into(), wall_now);
    }

    /// End wall-clock recovery timing. A no-op if there was no matching
    /// `start_recovery` call for this attack type.
    pub fn end_recovery(&mut self, attack_type: &str, wall_now: f64) {
        if let Some(start) = self.recovery_starts.remove(attack_type) {
            self.total_recovery_seconds += (wall_now - start).max(0.0);
        }
    }

    pub fn record_adaptive_response(&mut self) {
        self.adaptive_responses += 1;
    }

    pub fn update_sybil_resistance(&mut self, score: f64) {
        self.sybil_resistance_score = score.clamp(0.0, 1.0);
    }

    pub fn snapshot(&self) -> ResilienceSnapshot {
        ResilienceSnapshot {
            offline_detected: self.offline_detected,
            offline_missed: self.offline_missed,
            total_recovery_seconds: self.total_recovery_seconds,
            sybil_resistance_score: self.sybil_resistance_score,
            adaptive_responses: self.adaptive_responses,
            timeline: self.timeline.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResilienceSnapshot {
    pub offline_detected: u64,
    pub offline_missed: u64,
    pub total_recovery_seconds: f64,
    pub sybil_resistance_score: f64,
    pub adaptive_responses: u64,
    pub timeline: Vec<AttackRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_attacks_are_tallied_by_detection_outcome() {
        let mut t = ResilienceTracker::default();
        t.record_attack("offline_replay", true, 1.0);
        t.record_attack("offline_replay", false, 2.0);
        t.record_attack("online_flood", true, 3.0);
        let snap = t.snapshot();
        assert_eq!(snap.offline_detected, 1);
        assert_eq!(snap.offline_missed, 1);
        assert_eq!(snap.timeline.len(), 3);
    }

    #[test]
    fn sybil_resistance_score_clamps_to_unit_interval() {
        let mut t = ResilienceTracker::default();
        t.update_sybil_resistance(1.5);
        assert_eq!(t.snapshot().sybil_resistance_score, 1.0);
        t.update_sybil_resistance(-0.2);
        assert_eq!(t.snapshot().sybil_resistance_score, 0.0);
    }

    #[test]
    fn mismatched_end_recovery_is_a_no_op() {
        let mut t = ResilienceTracker::default();
        t.end_recovery("nonexistent", 10.0);
        assert_eq!(t.snapshot().total_recovery_seconds, 0.0);
    }

    #[test]
    fn recovery_seconds_accumulate_across_multiple_attacks() {
        let mut t = ResilienceTracker::default();
        t.start_recovery("offline_replay", 10.0);
        t.end_recovery("offline_replay", 12.5);
        t.start_recovery("offline_replay", 20.0);
        t.end_recovery("offline_replay", 21.0);
        assert_eq!(t.snapshot().total_recovery_seconds, 3.5);
    }
}
