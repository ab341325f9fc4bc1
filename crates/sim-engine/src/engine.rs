//! The Dispatcher & Engine (DE, §4.2): owns the TEQ, handler registry, and
//! SMP pipeline; drives the run loop to one of the terminal states.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use sim_events::{Event, EventId, EventQueue, EventSpec, Message, Payload, ScheduleError};
use sim_metrics::{ComprehensiveReport, MetricsCollector, RateSeriesPoint, TimeSeriesPoint};
use sim_strategy::Strategy;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::handler::{Handler, HandlerId, HandlerRegistry};
use crate::pipeline::{EventLabeler, Pipeline};
use crate::state::{EngineState, StopReason};
use crate::stop::StopHandle;

pub struct Engine {
    config: EngineConfig,
    queue: EventQueue,
    handlers: HandlerRegistry,
    pipeline: Pipeline,
    metrics: MetricsCollector,
    state: EngineState,
    stop_handle: StopHandle,
    stop_reason: Option<StopReason>,
    current_time: f64,
    events_processed: u64,
    last_metrics_snapshot: f64,
    run_started_at: Option<Instant>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            queue: EventQueue::new(),
            handlers: HandlerRegistry::new(),
            pipeline: Pipeline::new(),
            metrics: MetricsCollector::with_relay_window(0.0, config.relay_window),
            state: EngineState::Idle,
            stop_handle: StopHandle::new(),
            stop_reason: None,
            current_time: 0.0,
            events_processed: 0,
            last_metrics_snapshot: 0.0,
            run_started_at: None,
        })
    }

    // -- registration (§6) --------------------------------------------------

    pub fn register_handler(&mut self, event_type: impl Into<String>, handler: Box<dyn Handler>) -> HandlerId {
        self.handlers.register(event_type, handler)
    }

    pub fn register_catch_all_handler(&mut self, handler: Box<dyn Handler>) -> HandlerId {
        self.handlers.register_catch_all(handler)
    }

    pub fn unregister_handler(&mut self, id: HandlerId) -> bool {
        self.handlers.unregister(id)
    }

    pub fn register_anti_spam_strategy(&mut self, name: impl Into<String>, strategy: Box<dyn Strategy>) {
        self.pipeline.register_strategy(name, strategy);
    }

    pub fn set_event_labeler(&mut self, labeler: EventLabeler) {
        self.pipeline.set_labeler(labeler);
    }

    /// A handle that may be cloned out to a handler at construction time so
    /// it can request cooperative termination from inside `handle` (§5).
    pub fn stop_handle(&self) -> StopHandle {
        self.stop_handle.clone()
    }

    // -- scheduling (§4.1, delegated to the queue) --------------------------

    pub fn schedule_at(
        &mut self,
        time: f64,
        priority: i64,
        event_type: impl Into<String>,
        payload: Payload,
    ) -> Result<EventId, ScheduleError> {
        if time < self.current_time {
            return Err(ScheduleError::InvalidTime(time.to_string()));
        }
        self.queue.schedule_at(time, priority, event_type, payload)
    }

    pub fn schedule_after(
        &mut self,
        delay: f64,
        priority: i64,
        event_type: impl Into<String>,
        payload: Payload,
    ) -> Result<EventId, ScheduleError> {
        self.queue.schedule_after(self.current_time, delay, priority, event_type, payload)
    }

    pub fn schedule(&mut self, spec: EventSpec) -> Result<EventId, ScheduleError> {
        if spec.time < self.current_time {
            return Err(ScheduleError::InvalidTime(spec.time.to_string()));
        }
        self.queue.schedule(spec)
    }

    pub fn cancel(&mut self, id: EventId) -> bool {
        self.queue.cancel(id)
    }

    /// Inject a message directly, as if a handler had just produced it: wraps
    /// it in a `type`-tagged event scheduled immediately at `current_time()`
    /// (§6 `processMessage`).
    pub fn process_message(&mut self, message: Message, event_type: impl Into<String>, source: Option<String>) -> Result<EventId, ScheduleError> {
        let mut spec = EventSpec::new(self.current_time, event_type).with_payload(Payload::with_message(message));
        if let Some(source) = source {
            spec = spec.with_source(source);
        }
        self.schedule(spec)
    }

    // -- introspection -------------------------------------------------------

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn queue_size(&self) -> usize {
        self.queue.size()
    }

    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn comprehensive_report(&self) -> ComprehensiveReport {
        self.metrics.comprehensive_report(self.current_time)
    }

    /// Periodic queue-depth samples taken once per `metricsInterval` (§6).
    pub fn queue_size_series(&self) -> &[TimeSeriesPoint] {
        self.metrics.queue_size_series()
    }

    /// Periodic cumulative-events-processed samples, same cadence as
    /// [`Engine::queue_size_series`].
    pub fn events_processed_series(&self) -> &[TimeSeriesPoint] {
        self.metrics.events_processed_series()
    }

    /// Periodic wall-clock throughput samples (events/sec, sim-speed factor).
    pub fn rate_series(&self) -> &[RateSeriesPoint] {
        self.metrics.rate_series()
    }

    // -- resilience / extended metrics surface (§6 enhanced extensions) -----

    pub fn record_attack(&mut self, attack_type: impl Into<String>, detected: bool) {
        self.metrics.record_attack(attack_type, detected, self.current_time);
    }

    pub fn start_recovery(&mut self, attack_type: impl Into<String>) {
        self.metrics.start_recovery(attack_type, self.wall_seconds());
    }

    pub fn end_recovery(&mut self, attack_type: &str) {
        self.metrics.end_recovery(attack_type, self.wall_seconds());
    }

    pub fn record_adaptive_response(&mut self) {
        self.metrics.record_adaptive_response();
    }

    pub fn update_sybil_resistance(&mut self, score: f64) {
        self.metrics.update_sybil_resistance(score);
    }

    fn wall_seconds(&self) -> f64 {
        self.run_started_at
            .map(|start| start.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    // -- control (§4.2) ------------------------------------------------------

    /// Cooperative stop request, honored after the event currently being
    /// dispatched (if any) completes.
    pub fn stop(&mut self) {
        self.stop_handle.request_stop();
    }

    /// Transition `Idle -> Running` and drain the queue to a terminal state.
    /// Returns the reason the loop stopped, or the fatal error that moved
    /// the engine to `Failed`.
    pub fn start(&mut self) -> Result<StopReason, EngineError> {
        if self.state != EngineState::Idle {
            return Err(EngineError::AlreadyStarted(self.state.as_str()));
        }
        self.state = EngineState::Running;
        self.run_started_at = Some(Instant::now());
        info!(target: "engine", duration = self.config.duration, max_events = ?self.config.max_events, "run started");

        if self.config.max_events == Some(0) {
            return self.terminate(StopReason::EventLimit);
        }

        loop {
            if self.stop_handle.is_stop_requested() {
                return self.terminate(StopReason::CooperativeStop);
            }
            if self.current_time >= self.config.duration {
                return self.terminate(StopReason::TimeLimit);
            }
            if let Some(max) = self.config.max_events {
                if self.events_processed >= max {
                    return self.terminate(StopReason::EventLimit);
                }
            }

            let Some(event) = self.queue.pop() else {
                return self.terminate(StopReason::QueueEmpty);
            };

            if event.time >= self.config.duration {
                debug!(target: "engine", t = event.time, "event beyond duration discarded without dispatch");
                return self.terminate(StopReason::TimeLimit);
            }
            if event.time < self.current_time {
                self.state = EngineState::Failed;
                self.stop_reason = Some(StopReason::Failed);
                return Err(EngineError::ClockRegression {
                    current: self.current_time,
                    popped: event.time,
                });
            }
            self.current_time = event.time;

            let dispatch_started = Instant::now();
            let new_events = self.dispatch(&event);
            let dispatch_cpu_seconds = dispatch_started.elapsed().as_secs_f64();
            self.events_processed += 1;

            if let Some(message) = event.payload.message() {
                self.pipeline.process_message(message, self.current_time, dispatch_cpu_seconds, &mut self.metrics);
            }

            for spec in new_events {
                if let Err(err) = self.schedule(spec) {
                    warn!(target: "engine", ?err, "handler-produced event rejected");
                }
            }

            if self.current_time - self.last_metrics_snapshot >= self.config.metrics_interval {
                self.last_metrics_snapshot = self.current_time;
                self.metrics
                    .snapshot_time_series(self.current_time, self.queue.size(), self.events_processed);
                let simulation_speed_factor = if self.wall_seconds() > 0.0 {
                    self.current_time / self.wall_seconds()
                } else {
                    0.0
                };
                let events_per_second = if self.wall_seconds() > 0.0 {
                    self.events_processed as f64 / self.wall_seconds()
                } else {
                    0.0
                };
                self.metrics
                    .snapshot_rate(self.current_time, events_per_second, simulation_speed_factor);
            }
        }
    }

    fn terminate(&mut self, reason: StopReason) -> Result<StopReason, EngineError> {
        self.state = match reason {
            StopReason::Failed => EngineState::Failed,
            StopReason::CooperativeStop => EngineState::Stopped,
            StopReason::QueueEmpty | StopReason::TimeLimit | StopReason::EventLimit => EngineState::Completed,
        };
        self.stop_reason = Some(reason);
        info!(target: "engine", reason = reason.as_str(), events_processed = self.events_processed, t = self.current_time, "run terminated");
        Ok(reason)
    }

    /// Dispatch algorithm (§4.2): by-type handlers first, then catch-all,
    /// each in registration order; a failing handler is logged and skipped,
    /// its generated events discarded, and the rest of dispatch continues.
    fn dispatch(&mut self, event: &Event) -> Vec<EventSpec> {
        if event.is_cancelled() {
            debug!(target: "engine", event = %event.id, "cancelled event skipped");
            return Vec::new();
        }

        let mut produced = Vec::new();
        for handler in self.handlers.by_type_handlers(&event.event_type) {
            run_handler(handler.as_mut(), event, &mut produced, &mut self.metrics);
        }
        for handler in self.handlers.catch_all_handlers() {
            run_handler(handler.as_mut(), event, &mut produced, &mut self.metrics);
        }
        produced
    }
}

fn run_handler(handler: &mut dyn Handler, event: &Event, produced: &mut Vec<EventSpec>, metrics: &mut MetricsCollector) {
    match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(event))) {
        Ok(events) => produced.extend(events),
        Err(_) => {
            error!(target: "engine", event = %event.id, event_type = event.event_type.as_str(), "handler panicked; its generated events are discarded");
            metrics.record_error("handler");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_events::EventSpec;

    struct Appending(std::rc::Rc<std::cell::RefCell<Vec<EventId>>>);
    impl Handler for Appending {
        fn can_handle(&self, _event_type: &str) -> bool {
            true
        }
        fn handle(&mut self, event: &Event) -> Vec<EventSpec> {
            self.0.borrow_mut().push(event.id);
            Vec::new()
        }
    }

    struct AlwaysPanics;
    impl Handler for AlwaysPanics {
        fn can_handle(&self, _event_type: &str) -> bool {
            true
        }
        fn handle(&mut self, _event: &Event) -> Vec<EventSpec> {
            panic!("handler failure")
        }
    }

    #[test]
    fn empty_queue_terminates_immediately() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let reason = engine.start().unwrap();
        assert_eq!(reason, StopReason::QueueEmpty);
        assert_eq!(engine.events_processed(), 0);
        assert_eq!(engine.state(), EngineState::Completed);
    }

    #[test]
    fn max_events_zero_terminates_before_popping_anything() {
        let mut engine = Engine::new(EngineConfig {
            max_events: Some(0),
            ..EngineConfig::default()
        })
        .unwrap();
        engine.schedule_at(1.0, 0, "x", Payload::new()).unwrap();
        let reason = engine.start().unwrap();
        assert_eq!(reason, StopReason::EventLimit);
        assert_eq!(engine.events_processed(), 0);
    }

    #[test]
    fn event_scheduled_at_or_past_duration_is_not_processed() {
        let mut engine = Engine::new(EngineConfig {
            duration: 10.0,
            ..EngineConfig::default()
        })
        .unwrap();
        engine.schedule_at(5.0, 0, "early", Payload::new()).unwrap();
        engine.schedule_at(15.0, 0, "late", Payload::new()).unwrap();
        let reason = engine.start().unwrap();
        assert_eq!(reason, StopReason::TimeLimit);
        assert_eq!(engine.events_processed(), 1);
        assert!(engine.current_time() <= 10.0);
    }

    #[test]
    fn handler_failure_does_not_block_other_handlers_or_the_run() {
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.register_handler("x", Box::new(AlwaysPanics));
        engine.register_handler("x", Box::new(Appending(seen.clone())));
        engine.schedule_at(1.0, 0, "x", Payload::new()).unwrap();
        let reason = engine.start().unwrap();

        std::panic::set_hook(original_hook);

        assert_eq!(reason, StopReason::QueueEmpty);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(engine.events_processed(), 1);
        assert_eq!(engine.state(), EngineState::Completed);
    }

    #[test]
    fn cancelled_event_is_never_dispatched() {
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.register_handler("x", Box::new(Appending(seen.clone())));
        let id = engine.schedule_at(1.0, 0, "x", Payload::new()).unwrap();
        assert!(engine.cancel(id));
        let reason = engine.start().unwrap();
        assert_eq!(reason, StopReason::QueueEmpty);
        assert!(seen.borrow().is_empty());
        assert_eq!(engine.events_processed(), 1, "cancelled events still count as processed");
    }

    #[test]
    fn starting_twice_is_rejected() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.start().unwrap();
        assert!(matches!(engine.start(), Err(EngineError::AlreadyStarted(_))));
    }

    #[test]
    fn cooperative_stop_halts_after_the_current_event() {
        let mut engine = Engine::new(EngineConfig {
            duration: 1000.0,
            ..EngineConfig::default()
        })
        .unwrap();
        let stop_handle = engine.stop_handle();
        struct StopAfterFirst(StopHandle);
        impl Handler for StopAfterFirst {
            fn can_handle(&self, _event_type: &str) -> bool {
                true
            }
            fn handle(&mut self, _event: &Event) -> Vec<EventSpec> {
                self.0.request_stop();
                Vec::new()
            }
        }
        engine.register_handler("x", Box::new(StopAfterFirst(stop_handle)));
        engine.schedule_at(1.0, 0, "x", Payload::new()).unwrap();
        engine.schedule_at(2.0, 0, "x", Payload::new()).unwrap();
        let reason = engine.start().unwrap();
        assert_eq!(reason, StopReason::CooperativeStop);
        assert_eq!(engine.events_processed(), 1);
        assert_eq!(engine.state(), EngineState::Stopped);
    }
}
