//! Concrete agents and strategies (§1, §10): minimal, illustrative
//! implementations of the `Handler` and `Strategy` contracts, kept
//! deliberately small. Not the deliverable — they exist so the contracts in
//! `sim-engine` and `sim-strategy` have at least one real exerciser.

mod agents;
mod labeler;
mod rate_limit;

pub use agents::{BURST_SPAM_TICK, BurstSpamAgent, HONEST_USER_TICK, HonestUserAgent, NOSTR_MESSAGE, Xorshift64};
pub use labeler::content_based_labeler;
pub use rate_limit::FixedWindowRateLimit;
