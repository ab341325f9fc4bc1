//! Event type and its payload.
//!
//! Design Note: the original source models the payload as an untyped
//! `dict[str, Any]`. We keep the two keys the core actually interprets
//! (`message`, `_cancelled`) as real struct fields and push everything else
//! into a small extension map, rather than exposing an untyped bag to
//! handlers (see Design Notes, §9).

use std::collections::HashMap;
use std::fmt;

use crate::message::Message;

/// Stable identity of a scheduled event. Assigned by [`crate::EventQueue`] at
/// schedule time; monotonically increasing within a run, which doubles as the
/// insertion-sequence tie-breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub(crate) u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evt-{}", self.0)
    }
}

/// An opaque extension value carried in [`Payload`] under a caller-defined key.
/// Unknown keys are pass-through; the core never interprets them.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Typed event payload. `message` and `_cancelled` are the two recognized
/// entries the core reads; everything else a handler attaches rides along in
/// `extra` unexamined.
#[derive(Debug, Clone, Default)]
pub struct Payload {
    message: Option<Message>,
    cancelled: bool,
    extra: HashMap<String, PayloadValue>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(message: Message) -> Self {
        Self {
            message: Some(message),
            ..Self::default()
        }
    }

    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    pub fn take_message(self) -> Option<Message> {
        self.message
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub(crate) fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub fn set(&mut self, key: impl Into<String>, value: PayloadValue) {
        self.extra.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.extra.get(key)
    }
}

/// A scheduled action on the simulation timeline.
///
/// Ordering is defined externally by [`crate::EventQueue`] over
/// `(time, priority, sequence)`; `Event` itself carries no `Ord` impl so that
/// identity comparisons (by `id`, see the glossary) are never silently
/// confused with ordering comparisons.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: EventId,
    pub time: f64,
    pub priority: i64,
    pub(crate) sequence: u64,
    pub event_type: String,
    pub payload: Payload,
    pub source: Option<String>,
    pub target: Option<String>,
}

impl Event {
    /// Identity equality, as distinct from structural equality: two events
    /// are "the same event" iff their ids match, regardless of any other
    /// field (used for cancellation bookkeeping).
    pub fn is_same_as(&self, other: &Event) -> bool {
        self.id == other.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.payload.is_cancelled()
    }
}

/// A request to schedule a new event, returned by handlers. Carries no
/// `EventId`/sequence of its own: those are assigned by the queue at the
/// point of actual scheduling, the same as any other `schedule_at` call.
#[derive(Debug, Clone)]
pub struct EventSpec {
    pub time: f64,
    pub priority: i64,
    pub event_type: String,
    pub payload: Payload,
    pub source: Option<String>,
    pub target: Option<String>,
}

impl EventSpec {
    pub fn new(time: f64, event_type: impl Into<String>) -> Self {
        Self {
            time,
            priority: 0,
            event_type: event_type.into(),
            payload: Payload::new(),
            source: None,
            target: None,
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}
