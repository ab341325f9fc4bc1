//! The time-ordered event queue (TEQ): a min-heap over
//! `(time, priority, sequence)` with O(log n) tombstone cancellation.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use thiserror::Error;
use tracing::debug;

use crate::event::{Event, EventId, EventSpec, Payload};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("event time must be finite, got {0}")]
    InvalidTime(String),
    #[error("delay must be non-negative and finite, got {0}")]
    InvalidDelay(String),
}

/// Heap key. Kept separate from `Event` so that `Event` itself never needs an
/// `Ord` impl: identity (`EventId`) and heap order (`time, priority, sequence`)
/// are different concerns and mixing them invites a silent Eq/Ord mismatch.
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    time: f64,
    priority: i64,
    sequence: u64,
    id: EventId,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.priority == other.priority && self.sequence == other.sequence
    }
}

impl Eq for QueueEntry {}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.priority.cmp(&other.priority))
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Time-ordered queue of pending events.
///
/// `pop` always yields the earliest non-popped entry, cancelled or not — a
/// cancelled event is a tombstone, not a hole, so the heap never needs
/// reheapification. Callers that dispatch events (see `sim-engine`) are
/// responsible for skipping ones where [`Event::is_cancelled`] is true.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<std::cmp::Reverse<QueueEntry>>,
    events: HashMap<EventId, Event>,
    next_id: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an event to fire at an absolute simulation time.
    pub fn schedule_at(
        &mut self,
        time: f64,
        priority: i64,
        event_type: impl Into<String>,
        payload: Payload,
    ) -> Result<EventId, ScheduleError> {
        if !time.is_finite() {
            return Err(ScheduleError::InvalidTime(time.to_string()));
        }
        let sequence = self.next_id;
        let id = EventId(self.next_id);
        self.next_id += 1;

        let event = Event {
            id,
            time,
            priority,
            sequence,
            event_type: event_type.into(),
            payload,
            source: None,
            target: None,
        };
        self.heap.push(std::cmp::Reverse(QueueEntry {
            time,
            priority,
            sequence,
            id,
        }));
        self.events.insert(id, event);
        debug!(target: "teq", event = %id, t = time, priority, "event scheduled");
        Ok(id)
    }

    /// Schedule an event a non-negative delay after `now`.
    pub fn schedule_after(
        &mut self,
        now: f64,
        delay: f64,
        priority: i64,
        event_type: impl Into<String>,
        payload: Payload,
    ) -> Result<EventId, ScheduleError> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(ScheduleError::InvalidDelay(delay.to_string()));
        }
        self.schedule_at(now + delay, priority, event_type, payload)
    }

    /// Schedule an already-built [`EventSpec`], as returned by a handler.
    pub fn schedule(&mut self, spec: EventSpec) -> Result<EventId, ScheduleError> {
        let id = self.schedule_at(spec.time, spec.priority, spec.event_type, spec.payload)?;
        if let Some(event) = self.events.get_mut(&id) {
            event.source = spec.source;
            event.target = spec.target;
        }
        Ok(id)
    }

    /// Mark an event cancelled. Returns `false` if the id is unknown or the
    /// event was already cancelled (idempotent, not an error).
    pub fn cancel(&mut self, id: EventId) -> bool {
        match self.events.get_mut(&id) {
            Some(event) if !event.is_cancelled() => {
                event.payload.mark_cancelled();
                debug!(target: "teq", event = %id, "event cancelled (tombstoned)");
                true
            }
            _ => false,
        }
    }

    /// Look at the next event to be popped without removing it.
    pub fn peek(&self) -> Option<&Event> {
        self.heap.peek().and_then(|entry| self.events.get(&entry.0.id))
    }

    /// Remove and return the earliest scheduled event, cancelled or not.
    pub fn pop(&mut self) -> Option<Event> {
        let entry = self.heap.pop()?;
        self.events.remove(&entry.0.id)
    }

    pub fn size(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(q: &mut EventQueue, time: f64) -> EventId {
        q.schedule_at(time, 0, "tick", Payload::new()).unwrap()
    }

    #[test]
    fn pops_events_in_time_order_regardless_of_insertion_order() {
        let mut q = EventQueue::new();
        push(&mut q, 20.0);
        push(&mut q, 10.0);
        push(&mut q, 15.0);

        let times: Vec<f64> = std::iter::from_fn(|| q.pop()).map(|e| e.time).collect();
        assert_eq!(times, vec![10.0, 15.0, 20.0]);
    }

    #[test]
    fn equal_time_breaks_tie_by_priority_then_sequence() {
        let mut q = EventQueue::new();
        let low_pri = q.schedule_at(5.0, 10, "a", Payload::new()).unwrap();
        let high_pri = q.schedule_at(5.0, 1, "b", Payload::new()).unwrap();
        let first_in = q.schedule_at(5.0, 1, "c", Payload::new()).unwrap();

        let order: Vec<EventId> = std::iter::from_fn(|| q.pop()).map(|e| e.id).collect();
        assert_eq!(order, vec![high_pri, first_in, low_pri]);
    }

    #[test]
    fn cancel_is_a_tombstone_not_a_removal() {
        let mut q = EventQueue::new();
        let id = push(&mut q, 1.0);
        assert!(q.cancel(id));
        assert_eq!(q.size(), 1);

        let popped = q.pop().unwrap();
        assert_eq!(popped.id, id);
        assert!(popped.is_cancelled());
    }

    #[test]
    fn cancelling_twice_returns_false_the_second_time() {
        let mut q = EventQueue::new();
        let id = push(&mut q, 1.0);
        assert!(q.cancel(id));
        assert!(!q.cancel(id));
    }

    #[test]
    fn cancelling_unknown_id_returns_false() {
        let mut q = EventQueue::new();
        push(&mut q, 1.0);
        let bogus = EventId(9999);
        assert!(!q.cancel(bogus));
    }

    #[test]
    fn size_empty_and_clear_track_pending_count() {
        let mut q = EventQueue::new();
        assert!(q.is_empty());
        push(&mut q, 1.0);
        push(&mut q, 2.0);
        assert_eq!(q.size(), 2);
        assert!(!q.is_empty());
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.size(), 0);
        assert!(q.pop().is_none());
    }

    #[test]
    fn rejects_non_finite_time_and_delay() {
        let mut q = EventQueue::new();
        assert!(matches!(
            q.schedule_at(f64::NAN, 0, "x", Payload::new()),
            Err(ScheduleError::InvalidTime(_))
        ));
        assert!(matches!(
            q.schedule_after(0.0, -1.0, 0, "x", Payload::new()),
            Err(ScheduleError::InvalidDelay(_))
        ));
    }
}
