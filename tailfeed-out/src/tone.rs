//! Sine tone producer
//!
//! Fills interleaved buffers with the same sine sample on every channel.
//! Phase carries over between fills, so consecutive buffers join without a
//! click.

use std::f64::consts::PI;

#[derive(Debug, Clone)]
pub struct SineTone {
    channels: usize,
    amplitude: f32,
    phase: f64,
    phase_increment: f64,
}

impl SineTone {
    /// `amplitude` is clamped to 0.0..=1.0
    pub fn new(frequency: f64, amplitude: f32, sample_rate: u32, channels: u16) -> Self {
        Self {
            channels: channels.max(1) as usize,
            amplitude: amplitude.clamp(0.0, 1.0),
            phase: 0.0,
            phase_increment: 2.0 * PI * frequency / sample_rate as f64,
        }
    }

    /// Write whole frames into `samples`
    pub fn fill(&mut self, samples: &mut [f32]) {
        for frame in samples.chunks_exact_mut(self.channels) {
            let sample = (self.phase.sin() * self.amplitude as f64) as f32;
            frame.fill(sample);

            self.phase += self.phase_increment;
            if self.phase >= 2.0 * PI {
                self.phase -= 2.0 * PI;
            }
        }
    }

    /// Consume the tone as a session producer
    pub fn into_producer(mut self) -> impl FnMut(&mut [f32]) + Send + 'static {
        move |samples: &mut [f32]| self.fill(samples)
    }
}
