//! Output regions handed to the render callback
//!
//! Drivers deliver either one interleaved slice (cpal) or one slice per
//! channel (planar, CoreAudio-style). The engine always reads interleaved
//! source data and lets the target scatter it.

/// Destination of one render callback
pub trait RenderTarget {
    /// Frames requested by this callback
    fn frames(&self) -> usize;

    /// Channels per frame
    fn channels(&self) -> usize;

    /// Copy whole interleaved frames from `src` into frames `at..`
    fn write_interleaved(&mut self, at: usize, src: &[f32]);

    /// Zero `frames` frames starting at frame `at`
    fn fill_silence(&mut self, at: usize, frames: usize);
}

/// Interleaved output slice: `[L, R, L, R, ...]`
pub struct Interleaved<'a> {
    data: &'a mut [f32],
    channels: usize,
}

impl<'a> Interleaved<'a> {
    /// Wrap a driver slice. Trailing samples that do not form a whole frame
    /// are zeroed and never written again.
    pub fn new(data: &'a mut [f32], channels: usize) -> Self {
        let channels = channels.max(1);
        let whole = data.len() - data.len() % channels;
        data[whole..].fill(0.0);
        Self { data, channels }
    }
}

impl RenderTarget for Interleaved<'_> {
    fn frames(&self) -> usize {
        self.data.len() / self.channels
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn write_interleaved(&mut self, at: usize, src: &[f32]) {
        let start = at * self.channels;
        self.data[start..start + src.len()].copy_from_slice(src);
    }

    fn fill_silence(&mut self, at: usize, frames: usize) {
        let start = at * self.channels;
        self.data[start..start + frames * self.channels].fill(0.0);
    }
}

/// Planar output: one slice per channel, all of the same length
pub struct Planar<'a, 'b> {
    outputs: &'a mut [&'b mut [f32]],
}

impl<'a, 'b> Planar<'a, 'b> {
    pub fn new(outputs: &'a mut [&'b mut [f32]]) -> Self {
        Self { outputs }
    }
}

impl RenderTarget for Planar<'_, '_> {
    fn frames(&self) -> usize {
        self.outputs.iter().map(|ch| ch.len()).min().unwrap_or(0)
    }

    fn channels(&self) -> usize {
        self.outputs.len()
    }

    fn write_interleaved(&mut self, at: usize, src: &[f32]) {
        let channels = self.outputs.len();
        if channels == 0 {
            return;
        }
        for (frame, samples) in src.chunks_exact(channels).enumerate() {
            for (output, sample) in self.outputs.iter_mut().zip(samples) {
                output[at + frame] = *sample;
            }
        }
    }

    fn fill_silence(&mut self, at: usize, frames: usize) {
        for output in self.outputs.iter_mut() {
            output[at..at + frames].fill(0.0);
        }
    }
}
