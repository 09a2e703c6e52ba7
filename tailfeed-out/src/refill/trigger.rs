//! Coalescing refill wake signal
//!
//! `assert` is called from the render callback: one atomic swap plus, on the
//! first assert of a batch, an unpark of the observer thread. It never takes
//! a lock and never waits. `observe` consumes the whole batch at once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::thread::Thread;

/// Single-slot "a refill is due" flag
#[derive(Debug, Default)]
pub struct RefillTrigger {
    pending: AtomicBool,
    armed: AtomicBool,
    observer: OnceLock<Thread>,
}

impl RefillTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accepting asserts.
    ///
    /// `observer` is the thread to unpark on a new batch; `None` when the
    /// host polls [`observe`](Self::observe) itself. A session is armed at
    /// most once, so only the first observer is kept.
    pub fn arm(&self, observer: Option<Thread>) {
        if let Some(thread) = observer {
            let _ = self.observer.set(thread);
        }
        self.armed.store(true, Ordering::Release);
    }

    /// Stop accepting asserts and discard any pending one
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::Release);
        self.pending.store(false, Ordering::Release);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Request a refill. Real-time safe.
    ///
    /// Returns true if this call opened a new batch, false if it coalesced
    /// into one already pending or the trigger is not armed.
    pub fn assert(&self) -> bool {
        if !self.armed.load(Ordering::Acquire) {
            return false;
        }

        if self.pending.swap(true, Ordering::AcqRel) {
            return false;
        }

        if let Some(thread) = self.observer.get() {
            thread.unpark();
        }
        true
    }

    /// Consume the pending batch, if any
    pub fn observe(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}
