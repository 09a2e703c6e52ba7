//! Render and refill counters
//!
//! Written with relaxed atomic increments only, so the render callback can
//! update them. Logging of the values happens on the refill side.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters shared by the render callback and the refill context
#[derive(Debug, Default)]
pub struct RenderStats {
    callbacks: AtomicU64,
    frames_requested: AtomicU64,
    tail_frames: AtomicU64,
    primary_frames: AtomicU64,
    silent_frames: AtomicU64,
    refills_requested: AtomicU64,
    refills_completed: AtomicU64,
    producer_failures: AtomicU64,
}

impl RenderStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one callback asking for `frames` frames
    pub fn record_callback(&self, frames: usize) {
        self.callbacks.fetch_add(1, Ordering::Relaxed);
        self.frames_requested.fetch_add(frames as u64, Ordering::Relaxed);
    }

    pub fn record_tail(&self, frames: usize) {
        self.tail_frames.fetch_add(frames as u64, Ordering::Relaxed);
    }

    pub fn record_primary(&self, frames: usize) {
        self.primary_frames.fetch_add(frames as u64, Ordering::Relaxed);
    }

    /// Record frames emitted as silence (underrun)
    pub fn record_silence(&self, frames: usize) {
        self.silent_frames.fetch_add(frames as u64, Ordering::Relaxed);
    }

    pub fn record_refill_requested(&self) {
        self.refills_requested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refill_completed(&self) {
        self.refills_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_producer_failure(&self) {
        self.producer_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy of the current counter values
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            callbacks: self.callbacks.load(Ordering::Relaxed),
            frames_requested: self.frames_requested.load(Ordering::Relaxed),
            tail_frames: self.tail_frames.load(Ordering::Relaxed),
            primary_frames: self.primary_frames.load(Ordering::Relaxed),
            silent_frames: self.silent_frames.load(Ordering::Relaxed),
            refills_requested: self.refills_requested.load(Ordering::Relaxed),
            refills_completed: self.refills_completed.load(Ordering::Relaxed),
            producer_failures: self.producer_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`RenderStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Render callbacks served
    pub callbacks: u64,

    /// Frames requested across all callbacks
    pub frames_requested: u64,

    /// Frames served from the tail store
    pub tail_frames: u64,

    /// Frames served from the primary buffer
    pub primary_frames: u64,

    /// Frames emitted as silence (underrun)
    pub silent_frames: u64,

    /// Hand-offs that asserted the refill trigger
    pub refills_requested: u64,

    /// Buffers published by the refill context (including the initial one)
    pub refills_completed: u64,

    /// Producer invocations that panicked
    pub producer_failures: u64,
}

impl StatsSnapshot {
    /// Frames emitted with real data (tail + primary)
    pub fn frames_served(&self) -> u64 {
        self.tail_frames + self.primary_frames
    }

    /// Fraction of requested frames that were silence (0.0 to 1.0)
    pub fn underrun_ratio(&self) -> f64 {
        if self.frames_requested == 0 {
            0.0
        } else {
            self.silent_frames as f64 / self.frames_requested as f64
        }
    }
}
