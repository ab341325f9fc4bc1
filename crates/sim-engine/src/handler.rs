//! The handler contract (§6) and the dispatcher's registries.

use std::collections::HashMap;

use sim_events::{Event, EventSpec};

/// Consumer of events. `can_handle` gates by-type registration (a handler may
/// be registered under several types and asked about each); `handle` runs the
/// actual side effect and returns zero or more follow-up events for the
/// engine to schedule.
pub trait Handler: Send {
    fn can_handle(&self, event_type: &str) -> bool;
    fn handle(&mut self, event: &Event) -> Vec<EventSpec>;
}

/// Token identifying one registration, returned by `register_handler` so a
/// caller can later `unregister_handler` that exact registration without the
/// registry needing `Handler` to be `Eq`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct Registration {
    id: HandlerId,
    handler: Box<dyn Handler>,
}

/// Holds by-type and catch-all handler registrations in registration order,
/// the order the dispatcher (§4.2) invokes them in.
#[derive(Default)]
pub struct HandlerRegistry {
    by_type: HashMap<String, Vec<Registration>>,
    catch_all: Vec<Registration>,
    next_id: u64,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_id(&mut self) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Register a handler under a specific event type. Multiple handlers may
    /// share a type; they run in registration order.
    pub fn register(&mut self, event_type: impl Into<String>, handler: Box<dyn Handler>) -> HandlerId {
        let id = self.alloc_id();
        self.by_type
            .entry(event_type.into())
            .or_default()
            .push(Registration { id, handler });
        id
    }

    /// Register a handler invoked for every non-cancelled event, regardless
    /// of type, after all by-type handlers for that event have run.
    pub fn register_catch_all(&mut self, handler: Box<dyn Handler>) -> HandlerId {
        let id = self.alloc_id();
        self.catch_all.push(Registration { id, handler });
        id
    }

    /// Remove one registration by id, from whichever list it lives in.
    /// Returns `true` if a registration with that id was found and removed.
    pub fn unregister(&mut self, id: HandlerId) -> bool {
        for handlers in self.by_type.values_mut() {
            if let Some(pos) = handlers.iter().position(|r| r.id == id) {
                handlers.remove(pos);
                return true;
            }
        }
        if let Some(pos) = self.catch_all.iter().position(|r| r.id == id) {
            self.catch_all.remove(pos);
            return true;
        }
        false
    }

    pub fn by_type_handlers(&mut self, event_type: &str) -> impl Iterator<Item = &mut Box<dyn Handler>> {
        self.by_type
            .get_mut(event_type)
            .into_iter()
            .flat_map(|v| v.iter_mut())
            .map(|r| &mut r.handler)
    }

    pub fn catch_all_handlers(&mut self) -> impl Iterator<Item = &mut Box<dyn Handler>> {
        self.catch_all.iter_mut().map(|r| &mut r.handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_events::Payload;

    struct RecordingHandler {
        log: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
        tag: &'static str,
    }

    impl Handler for RecordingHandler {
        fn can_handle(&self, _event_type: &str) -> bool {
            true
        }
        fn handle(&mut self, _event: &Event) -> Vec<EventSpec> {
            self.log.borrow_mut().push(self.tag.to_string());
            Vec::new()
        }
    }

    fn sample_event() -> Event {
        use sim_events::EventQueue;
        let mut q = EventQueue::new();
        let id = q.schedule_at(0.0, 0, "x", Payload::new()).unwrap();
        let _ = id;
        q.pop().unwrap()
    }

    #[test]
    fn by_type_handlers_run_in_registration_order() {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        registry.register(
            "x",
            Box::new(RecordingHandler {
                log: log.clone(),
                tag: "first",
            }),
        );
        registry.register(
            "x",
            Box::new(RecordingHandler {
                log: log.clone(),
                tag: "second",
            }),
        );
        let event = sample_event();
        for handler in registry.by_type_handlers("x") {
            handler.handle(&event);
        }
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn unregister_returns_prior_behavior() {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        let id = registry.register(
            "x",
            Box::new(RecordingHandler {
                log: log.clone(),
                tag: "only",
            }),
        );
        assert!(registry.unregister(id));
        let event = sample_event();
        for handler in registry.by_type_handlers("x") {
            handler.handle(&event);
        }
        assert!(log.borrow().is_empty());
        assert!(!registry.unregister(id), "unregistering twice is a no-op");
    }
}
