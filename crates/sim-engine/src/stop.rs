//! Cooperative stop signal (§4.2, §5). The run loop polls this once per
//! dispatched event; `stop()` never preempts a handler mid-call.
//!
//! A clone of the handle can be handed to a long-lived handler at
//! construction time (outside the `Handler::handle` call, which carries no
//! engine reference by contract — §6) so that e.g. a "stop after N attacks"
//! handler can request termination from inside its own `handle` body.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
