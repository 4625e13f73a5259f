//! Stop signal shared by the coordinator, the runner and the heartbeat.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// A cloneable, idempotent stop signal.
///
/// Stopping is idempotent - only the first reason is kept. Besides the flag,
/// the signal owns a gate: [`StopSignal::run_unless_stopped`] and
/// [`StopSignal::stop_then`] are serialized against each other, so a producer
/// that checks-then-enqueues can never slip an event in after a producer that
/// stops-then-enqueues the terminal event.
#[derive(Clone, Default)]
pub struct StopSignal {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    stopped: AtomicBool,
    reason: RwLock<Option<String>>,
    gate: Mutex<()>,
    notify: Notify,
}

impl StopSignal {
    /// Creates a new, unset stop signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the signal. Returns true if this call was the one that set it.
    pub fn stop(&self, reason: impl Into<String>) -> bool {
        let _gate = self.inner.gate.lock();
        self.set(reason.into())
    }

    /// Sets the signal and runs `f` while no gated producer can interleave.
    pub fn stop_then<R>(&self, reason: impl Into<String>, f: impl FnOnce() -> R) -> R {
        let _gate = self.inner.gate.lock();
        self.set(reason.into());
        f()
    }

    /// Runs `f` only if the signal is not set, holding the gate while it runs.
    pub fn run_unless_stopped<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let _gate = self.inner.gate.lock();
        if self.is_stopped() {
            None
        } else {
            Some(f())
        }
    }

    /// Returns whether the signal has been set.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Returns the stop reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.inner.reason.read().clone()
    }

    /// Completes once the signal is set.
    pub async fn stopped(&self) {
        loop {
            // Registered for notify_waiters as soon as it is created.
            let notified = self.inner.notify.notified();
            if self.is_stopped() {
                return;
            }
            notified.await;
        }
    }

    fn set(&self, reason: String) -> bool {
        // First reason wins.
        if self
            .inner
            .stopped
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            *self.inner.reason.write() = Some(reason);
            self.inner.notify.notify_waiters();
            true
        } else {
            false
        }
    }
}

impl std::fmt::Debug for StopSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopSignal")
            .field("stopped", &self.is_stopped())
            .field("reason", &self.reason())
            .finish()
    }
}
