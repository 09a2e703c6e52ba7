//! Double-buffered primary sample buffer
//!
//! Two [`PrimaryBuffer`] instances circulate between the refill context and
//! the render callback through a pair of lock-free SPSC rings:
//!
//! - `filled`: refill side → render side (freshly produced audio)
//! - `recycled`: render side → refill side (instances handed back for reuse)
//!
//! Each side only touches an instance it has popped from its inbound ring, so
//! the producer never writes memory the render callback is reading. The
//! ring's release/acquire pair publishes the producer's writes.

use crate::render::TailStore;
use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};
use tracing::debug;

/// Number of primary buffer instances per session
pub const PRIMARY_INSTANCES: usize = 2;

/// One interleaved primary buffer instance (frame_capacity × channels samples)
#[derive(Debug)]
pub struct PrimaryBuffer {
    samples: Box<[f32]>,
}

impl PrimaryBuffer {
    fn new(samples: usize) -> Self {
        Self {
            samples: vec![0.0; samples].into_boxed_slice(),
        }
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

/// Create both ends of the exchange with all instances parked on the refill side
pub fn exchange(frame_capacity: usize, channels: usize) -> (FillEnd, DrainEnd) {
    let (filled_prod, filled_cons) = HeapRb::<PrimaryBuffer>::new(PRIMARY_INSTANCES).split();
    let (mut recycled_prod, recycled_cons) =
        HeapRb::<PrimaryBuffer>::new(PRIMARY_INSTANCES).split();

    for _ in 0..PRIMARY_INSTANCES {
        // Ring capacity equals the instance count, so these cannot fail
        let _ = recycled_prod.try_push(PrimaryBuffer::new(frame_capacity * channels));
    }

    debug!(
        "Created primary buffer exchange: {} instances x {} frames x {} channels",
        PRIMARY_INSTANCES, frame_capacity, channels
    );

    let fill = FillEnd {
        filled: filled_prod,
        recycled: recycled_cons,
    };

    let drain = DrainEnd {
        filled: filled_cons,
        recycled: recycled_prod,
        current: None,
        read_cursor: 0,
        frame_capacity,
        channels,
    };

    (fill, drain)
}

/// Refill side of the exchange (non-real-time)
pub struct FillEnd {
    filled: HeapProd<PrimaryBuffer>,
    recycled: HeapCons<PrimaryBuffer>,
}

impl FillEnd {
    /// Take a spare instance, clear it to silence, let `produce` write it and
    /// publish it to the render side.
    ///
    /// Returns false without calling `produce` when no spare instance exists
    /// (a previous refill is still waiting to be adopted).
    pub fn fill_next<F>(&mut self, produce: F) -> bool
    where
        F: FnOnce(&mut [f32]),
    {
        let Some(mut buffer) = self.recycled.try_pop() else {
            return false;
        };

        buffer.samples.fill(0.0);
        produce(&mut buffer.samples);

        // At most PRIMARY_INSTANCES instances exist, so the ring has room
        let _ = self.filled.try_push(buffer);
        true
    }

    /// Published instances not yet adopted by the render side
    pub fn pending(&self) -> usize {
        self.filled.occupied_len()
    }

    /// Instances available for the next refill
    pub fn spare(&self) -> usize {
        self.recycled.occupied_len()
    }
}

/// Render side of the exchange (real-time)
///
/// Holds at most one instance at a time together with its read cursor.
pub struct DrainEnd {
    filled: HeapCons<PrimaryBuffer>,
    recycled: HeapProd<PrimaryBuffer>,
    current: Option<PrimaryBuffer>,
    read_cursor: usize,
    frame_capacity: usize,
    channels: usize,
}

impl DrainEnd {
    /// True while an instance is held
    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    /// Adopt the next published instance, resetting the read cursor.
    ///
    /// Returns false if nothing has been published.
    pub fn adopt(&mut self) -> bool {
        if self.current.is_some() {
            return true;
        }
        match self.filled.try_pop() {
            Some(buffer) => {
                self.current = Some(buffer);
                self.read_cursor = 0;
                true
            }
            None => false,
        }
    }

    /// Frames consumed from the held instance since it was adopted
    pub fn read_cursor(&self) -> usize {
        self.read_cursor
    }

    /// Unconsumed frames in the held instance (0 when none is held)
    pub fn remaining(&self) -> usize {
        if self.current.is_some() {
            self.frame_capacity - self.read_cursor
        } else {
            0
        }
    }

    /// Consume up to `frames` frames, returning their interleaved samples
    pub fn take(&mut self, frames: usize) -> &[f32] {
        let frames = frames.min(self.remaining());
        let Some(buffer) = self.current.as_ref() else {
            return &[];
        };
        let start = self.read_cursor * self.channels;
        let end = start + frames * self.channels;
        self.read_cursor += frames;
        &buffer.samples[start..end]
    }

    /// Move the unconsumed remainder into `tail` and return the instance to
    /// the refill side. Returns the number of frames captured.
    pub fn hand_off(&mut self, tail: &mut TailStore) -> usize {
        let Some(buffer) = self.current.take() else {
            return 0;
        };

        let start = self.read_cursor * self.channels;
        let captured = tail.capture(&buffer.samples[start..]);

        // The refill side only pops after this push, so it never sees a live buffer
        let _ = self.recycled.try_push(buffer);
        captured
    }

    pub fn frame_capacity(&self) -> usize {
        self.frame_capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_instances_start_spare() {
        let (fill, drain) = exchange(4, 1);
        assert_eq!(fill.spare(), PRIMARY_INSTANCES);
        assert_eq!(fill.pending(), 0);
        assert!(!drain.is_loaded());
        assert_eq!(drain.remaining(), 0);
    }

    #[test]
    fn test_fill_clears_previous_contents() {
        let (mut fill, mut drain) = exchange(2, 1);
        let mut tail = TailStore::new(2, 1);

        // Cycle both instances through once with non-zero data
        for _ in 0..PRIMARY_INSTANCES {
            assert!(fill.fill_next(|s| s.fill(9.0)));
            assert!(drain.adopt());
            drain.take(2);
            drain.hand_off(&mut tail);
        }

        // Producer that writes nothing leaves silence, not stale 9.0s
        assert!(fill.fill_next(|_| {}));
        assert!(drain.adopt());
        assert_eq!(drain.take(2), &[0.0, 0.0]);
    }

    #[test]
    fn test_fill_without_spare_returns_false() {
        let (mut fill, mut drain) = exchange(2, 1);
        assert!(fill.fill_next(|s| s.fill(1.0)));
        assert!(drain.adopt());
        assert!(fill.fill_next(|s| s.fill(2.0)));

        let mut called = false;
        assert!(!fill.fill_next(|_| called = true));
        assert!(!called);
    }

    #[test]
    fn test_take_advances_cursor_and_clamps() {
        let (mut fill, mut drain) = exchange(4, 2);
        fill.fill_next(|s| {
            for (i, v) in s.iter_mut().enumerate() {
                *v = i as f32;
            }
        });
        assert!(drain.adopt());

        assert_eq!(drain.take(1), &[0.0, 1.0]);
        assert_eq!(drain.read_cursor(), 1);
        assert_eq!(drain.take(10), &[2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(drain.read_cursor(), 4);
        assert_eq!(drain.remaining(), 0);
    }

    #[test]
    fn test_hand_off_captures_remainder_and_recycles() {
        let (mut fill, mut drain) = exchange(4, 1);
        let mut tail = TailStore::new(4, 1);
        fill.fill_next(|s| s.copy_from_slice(&[1.0, 2.0, 3.0, 4.0]));
        assert!(drain.adopt());
        drain.take(3);

        assert_eq!(drain.hand_off(&mut tail), 1);
        assert!(!drain.is_loaded());
        assert_eq!(drain.read_cursor(), 3);
        assert_eq!(tail.available(), 1);
        assert_eq!(fill.spare(), PRIMARY_INSTANCES);
    }

    #[test]
    fn test_adopt_resets_cursor() {
        let (mut fill, mut drain) = exchange(4, 1);
        let mut tail = TailStore::new(4, 1);
        fill.fill_next(|_| {});
        drain.adopt();
        drain.take(3);
        drain.hand_off(&mut tail);

        fill.fill_next(|_| {});
        assert!(drain.adopt());
        assert_eq!(drain.read_cursor(), 0);
        assert_eq!(drain.remaining(), 4);
    }
}
