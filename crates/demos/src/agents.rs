//! Toy agents (§10): a recurring-tick honest user and a recurring-tick
//! burst-spam adversary, each a [`Handler`] that turns its own tick event
//! into zero or more `message`-bearing events plus the next tick.
//!
//! These are illustrations of the Handler contract, not a general agent
//! framework — the framework is out of scope (§1).

use sim_engine::Handler;
use sim_events::{Event, EventSpec, Message, Payload};

/// Minimal seeded PRNG so agent behavior stays reproducible across runs with
/// the same `simulation.randomSeed` (§9: "any RNG is the concern of
/// strategies and agents, which must accept a seed from configuration").
pub struct Xorshift64(u64);

impl Xorshift64 {
    pub fn new(seed: u64) -> Self {
        Self(if seed == 0 { 0x9E3779B97F4A7C15 } else { seed })
    }

    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Integer in `[0, bound)`.
    pub fn below(&mut self, bound: u64) -> u64 {
        if bound == 0 { 0 } else { self.next() % bound }
    }
}

pub const HONEST_USER_TICK: &str = "tick_honest_user";
pub const BURST_SPAM_TICK: &str = "tick_burst_spam";
pub const NOSTR_MESSAGE: &str = "nostr_message";

/// Emits one benign message per tick and reschedules itself.
pub struct HonestUserAgent {
    author: String,
    tick_interval: f64,
    next_id: u64,
}

impl HonestUserAgent {
    pub fn new(author: impl Into<String>, tick_interval: f64) -> Self {
        Self {
            author: author.into(),
            tick_interval,
            next_id: 0,
        }
    }
}

impl Handler for HonestUserAgent {
    fn can_handle(&self, event_type: &str) -> bool {
        event_type == HONEST_USER_TICK
    }

    fn handle(&mut self, event: &Event) -> Vec<EventSpec> {
        let id = format!("{}-{}", self.author, self.next_id);
        self.next_id += 1;
        let message = Message::new(id, 1, self.author.clone(), event.time).with_content("gm nostr, nice weather today");

        vec![
            EventSpec::new(event.time, NOSTR_MESSAGE)
                .with_payload(Payload::with_message(message))
                .with_source(self.author.clone()),
            EventSpec::new(event.time + self.tick_interval, HONEST_USER_TICK).with_source(self.author.clone()),
        ]
    }
}

/// Emits a burst of spam-labeled messages per tick and reschedules itself.
/// The burst size jitters by +/-1 around the configured size using a
/// seeded PRNG, so two runs with the same seed are byte-identical.
pub struct BurstSpamAgent {
    author: String,
    tick_interval: f64,
    burst_size: u64,
    next_id: u64,
    rng: Xorshift64,
}

impl BurstSpamAgent {
    pub fn new(author: impl Into<String>, tick_interval: f64, burst_size: u64, seed: u64) -> Self {
        Self {
            author: author.into(),
            tick_interval,
            burst_size,
            next_id: 0,
            rng: Xorshift64::new(seed),
        }
    }
}

impl Handler for BurstSpamAgent {
    fn can_handle(&self, event_type: &str) -> bool {
        event_type == BURST_SPAM_TICK
    }

    fn handle(&mut self, event: &Event) -> Vec<EventSpec> {
        let jitter = self.rng.below(3) as i64 - 1; // -1, 0, or +1
        let count = (self.burst_size as i64 + jitter).max(0) as u64;

        let mut out = Vec::with_capacity(count as usize + 1);
        for _ in 0..count {
            let id = format!("{}-{}", self.author, self.next_id);
            self.next_id += 1;
            let message =
                Message::new(id, 1, self.author.clone(), event.time).with_content("BUY CHEAP FOLLOWERS NOW!!! link-in-bio");
            out.push(
                EventSpec::new(event.time, NOSTR_MESSAGE)
                    .with_payload(Payload::with_message(message))
                    .with_source(self.author.clone()),
            );
        }
        out.push(EventSpec::new(event.time + self.tick_interval, BURST_SPAM_TICK).with_source(self.author.clone()));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_events::EventQueue;

    fn dispatch_self(handler: &mut dyn Handler, event_type: &str, t: f64) -> Vec<EventSpec> {
        let mut q = EventQueue::new();
        q.schedule_at(t, 0, event_type, Payload::new()).unwrap();
        let event = q.pop().unwrap();
        handler.handle(&event)
    }

    #[test]
    fn honest_user_emits_one_message_and_reschedules() {
        let mut agent = HonestUserAgent::new("alice", 5.0);
        let specs = dispatch_self(&mut agent, HONEST_USER_TICK, 0.0);
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].event_type, NOSTR_MESSAGE);
        assert_eq!(specs[1].event_type, HONEST_USER_TICK);
        assert_eq!(specs[1].time, 5.0);
    }

    #[test]
    fn burst_spam_reschedules_itself_deterministically_for_a_given_seed() {
        let mut a = BurstSpamAgent::new("spammer", 1.0, 5, 42);
        let mut b = BurstSpamAgent::new("spammer", 1.0, 5, 42);
        let specs_a = dispatch_self(&mut a, BURST_SPAM_TICK, 0.0);
        let specs_b = dispatch_self(&mut b, BURST_SPAM_TICK, 0.0);
        assert_eq!(specs_a.len(), specs_b.len());
        assert!(specs_a.last().unwrap().event_type == BURST_SPAM_TICK);
    }

    #[test]
    fn xorshift_is_deterministic_for_a_fixed_seed() {
        let mut a = Xorshift64::new(7);
        let mut b = Xorshift64::new(7);
        let seq_a: Vec<u64> = (0..5).map(|_| a.below(100)).collect();
        let seq_b: Vec<u64> = (0..5).map(|_| b.below(100)).collect();
        assert_eq!(seq_a, seq_b);
    }
}
