//! A trivial content-based ground-truth labeler (§10), registered with
//! `set_event_labeler` so the demo scenario has at least one working oracle.

use sim_events::Message;

const SPAM_MARKERS: &[&str] = &["buy cheap", "link-in-bio", "free followers", "click here"];

/// Labels a message spam if its content contains any of a small set of
/// known spam phrases (case-insensitive). Real labelers are scenario code's
/// concern; this exists only to exercise `setEventLabeler`.
pub fn content_based_labeler(message: &Message, _t: f64) -> bool {
    let lowered = message.content.to_lowercase();
    SPAM_MARKERS.iter().any(|marker| lowered.contains(marker))
}
