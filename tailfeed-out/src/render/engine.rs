//! Real-time render callback
//!
//! Serves each hardware request from the tail store first, then from the
//! held primary buffer instance, and zero-fills whatever is left. When the
//! primary buffer could not serve another request of the same size, its
//! remainder moves to the tail store, the instance goes back to the refill
//! side and the refill trigger is asserted.
//!
//! Nothing in here blocks, allocates, logs or performs I/O.

use super::stats::RenderStats;
use super::tail::TailStore;
use super::target::RenderTarget;
use crate::buffer::DrainEnd;
use crate::refill::RefillTrigger;
use std::sync::Arc;

/// Render side of a session, moved into the output stream's callback
pub struct RenderEngine {
    channels: usize,
    tail: TailStore,
    primary: DrainEnd,
    trigger: Arc<RefillTrigger>,
    stats: Arc<RenderStats>,
}

impl RenderEngine {
    pub fn new(
        channels: usize,
        primary: DrainEnd,
        trigger: Arc<RefillTrigger>,
        stats: Arc<RenderStats>,
    ) -> Self {
        let tail = TailStore::new(primary.frame_capacity(), channels);
        Self {
            channels,
            tail,
            primary,
            trigger,
            stats,
        }
    }

    /// Fill every frame of `target`.
    pub fn render<T>(&mut self, target: &mut T)
    where
        T: RenderTarget + ?Sized,
    {
        let requested = target.frames();
        if requested == 0 {
            return;
        }
        self.stats.record_callback(requested);

        // Layout mismatch is a wiring bug; never emit misaligned data
        if target.channels() != self.channels {
            target.fill_silence(0, requested);
            self.stats.record_silence(requested);
            return;
        }

        let mut need = requested;
        let mut written = 0;

        if !self.tail.is_empty() {
            let frames = self.tail.drain_into(target, written, need);
            self.stats.record_tail(frames);
            need -= frames;
            written += frames;
        }

        if need > 0 && self.primary.adopt() {
            let samples = self.primary.take(need);
            let frames = samples.len() / self.channels;
            target.write_interleaved(written, samples);
            self.stats.record_primary(frames);
            need -= frames;
            written += frames;

            // Look ahead: hand off before the buffer runs dry, not after
            if self.primary.remaining() < requested {
                self.primary.hand_off(&mut self.tail);
                if self.trigger.assert() {
                    self.stats.record_refill_requested();
                }
            }
        }

        if need > 0 {
            target.fill_silence(written, need);
            self.stats.record_silence(need);
        }
    }

    /// Frames consumed from the current (or last) primary buffer instance
    pub fn read_cursor(&self) -> usize {
        self.primary.read_cursor()
    }

    /// Frames waiting in the tail store
    pub fn tail_available(&self) -> usize {
        self.tail.available()
    }

    /// True while a primary buffer instance is held
    pub fn has_primary(&self) -> bool {
        self.primary.is_loaded()
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}
