//! Carry-over store for frames handed off from the primary buffer

use super::target::RenderTarget;

/// Fixed-capacity FIFO of interleaved frames captured at hand-off time.
///
/// Single owner: the render engine writes it at hand-off and drains it at
/// the start of later callbacks. Storage is allocated once up front.
#[derive(Debug)]
pub struct TailStore {
    samples: Box<[f32]>,
    channels: usize,
    length: usize,
    offset: usize,
}

impl TailStore {
    pub fn new(frame_capacity: usize, channels: usize) -> Self {
        Self {
            samples: vec![0.0; frame_capacity * channels].into_boxed_slice(),
            channels,
            length: 0,
            offset: 0,
        }
    }

    /// Frames captured by the last hand-off
    pub fn len(&self) -> usize {
        self.length
    }

    /// Frames already drained from the captured tail
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Frames still waiting to be emitted
    pub fn available(&self) -> usize {
        self.length - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.available() == 0
    }

    /// Replace the contents with `interleaved` (whole frames only).
    ///
    /// Returns the number of frames stored. Anything beyond capacity is
    /// dropped, which cannot happen for a remainder of the primary buffer.
    pub fn capture(&mut self, interleaved: &[f32]) -> usize {
        debug_assert!(self.is_empty(), "tail overwritten before it was drained");

        let frames = (interleaved.len() / self.channels).min(self.samples.len() / self.channels);
        let count = frames * self.channels;
        self.samples[..count].copy_from_slice(&interleaved[..count]);
        self.length = frames;
        self.offset = 0;
        frames
    }

    /// Emit up to `max_frames` frames into `target` starting at frame `at`.
    ///
    /// Returns the number of frames written. The store resets to empty once
    /// everything has been drained.
    pub fn drain_into<T>(&mut self, target: &mut T, at: usize, max_frames: usize) -> usize
    where
        T: RenderTarget + ?Sized,
    {
        let frames = max_frames.min(self.available());
        if frames == 0 {
            return 0;
        }

        let start = self.offset * self.channels;
        let end = start + frames * self.channels;
        target.write_interleaved(at, &self.samples[start..end]);

        self.offset += frames;
        if self.offset == self.length {
            self.length = 0;
            self.offset = 0;
        }
        frames
    }
}
