//! Cooperative cancellation flag shared between the interrupt handler and
//! the monitor loop.
//!
//! An interrupt is only cooperative while a rollout is being watched. At any
//! other point (describe, register, a slow HTTP call) [`StopSignal::interrupt`]
//! reports that nobody will notice and the handler terminates the process.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Flags {
    stopped: AtomicBool,
    watchers: AtomicUsize,
}

#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<Flags>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.stopped.load(Ordering::SeqCst)
    }

    /// Record an interrupt. Returns `true` when a watch loop will pick it up.
    pub fn interrupt(&self) -> bool {
        self.stop();
        self.is_watching()
    }

    pub fn is_watching(&self) -> bool {
        self.0.watchers.load(Ordering::SeqCst) > 0
    }

    /// Mark a watch loop as running until the guard is dropped.
    pub fn watch(&self) -> WatchGuard {
        self.0.watchers.fetch_add(1, Ordering::SeqCst);
        WatchGuard(self.0.clone())
    }
}

#[must_use = "the watch ends when the guard is dropped"]
#[derive(Debug)]
pub struct WatchGuard(Arc<Flags>);

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.0.watchers.fetch_sub(1, Ordering::SeqCst);
    }
}
