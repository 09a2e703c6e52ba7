//! Offline output: a software stand-in for the audio device
//!
//! The host (or a test) plays the role of the driver and pulls frames
//! through [`OfflineDriver`] at whatever cadence it likes. Used for headless
//! runs and for exercising sessions without audio hardware.

use super::OutputBackend;
use crate::config::StreamParams;
use crate::error::{Error, Result};
use crate::render::{Interleaved, Planar, RenderEngine, RenderTarget};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error};

#[derive(Default)]
struct OfflineShared {
    engine: Mutex<Option<RenderEngine>>,
    channels: AtomicUsize,
    playing: AtomicBool,
    starts: AtomicUsize,
    stops: AtomicUsize,
    error: Mutex<Option<String>>,
}

/// Backend half, owned by the session
pub struct OfflineBackend {
    sample_rate: u32,
    shared: Arc<OfflineShared>,
}

/// Driver half, kept by the host to pull frames
#[derive(Clone)]
pub struct OfflineDriver {
    shared: Arc<OfflineShared>,
}

impl OfflineBackend {
    /// Create a simulated device reporting `sample_rate` as its default
    pub fn new(sample_rate: u32) -> (Self, OfflineDriver) {
        let shared = Arc::new(OfflineShared::default());
        let backend = Self {
            sample_rate,
            shared: Arc::clone(&shared),
        };
        (backend, OfflineDriver { shared })
    }
}

impl OutputBackend for OfflineBackend {
    fn name(&self) -> String {
        "offline".to_string()
    }

    fn default_sample_rate(&self) -> Result<u32> {
        Ok(self.sample_rate)
    }

    fn open(&mut self, params: &StreamParams, engine: RenderEngine) -> Result<()> {
        let mut slot = self.shared.engine.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(Error::InvalidState("Offline stream already opened".to_string()));
        }
        *slot = Some(engine);
        self.shared.channels.store(params.channels as usize, Ordering::Release);
        debug!(
            "Offline stream opened: {} Hz, {} channels",
            params.sample_rate, params.channels
        );
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if self.shared.engine.lock().unwrap_or_else(PoisonError::into_inner).is_none() {
            return Err(Error::InvalidState("Offline stream not opened".to_string()));
        }
        if let Some(message) = self.stream_error() {
            return Err(Error::AudioOutput(format!("Failed to start stream: {}", message)));
        }
        self.shared.starts.fetch_add(1, Ordering::SeqCst);
        self.shared.playing.store(true, Ordering::Release);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if self.shared.playing.swap(false, Ordering::AcqRel) {
            self.shared.stops.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn stream_error(&self) -> Option<String> {
        self.shared.error.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl OfflineDriver {
    /// Run one render callback into `target`.
    ///
    /// Returns false (target untouched) while the stream is not playing.
    pub fn render_into<T>(&self, target: &mut T) -> bool
    where
        T: RenderTarget + ?Sized,
    {
        if !self.is_playing() {
            return false;
        }
        let mut slot = self.shared.engine.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_mut() {
            Some(engine) => {
                engine.render(target);
                true
            }
            None => false,
        }
    }

    /// Pull `frames` interleaved frames, or `None` while not playing
    pub fn render(&self, frames: usize) -> Option<Vec<f32>> {
        let channels = self.channels();
        let mut out = vec![0.0; frames * channels];
        self.render_into(&mut Interleaved::new(&mut out, channels))
            .then_some(out)
    }

    /// Pull `frames` frames as one vector per channel
    pub fn render_planar(&self, frames: usize) -> Option<Vec<Vec<f32>>> {
        let mut planes = vec![vec![0.0; frames]; self.channels()];
        let rendered = {
            let mut outputs: Vec<&mut [f32]> = planes.iter_mut().map(|p| p.as_mut_slice()).collect();
            self.render_into(&mut Planar::new(&mut outputs))
        };
        rendered.then_some(planes)
    }

    /// Simulate the device failing (e.g. being unplugged)
    pub fn fail(&self, message: &str) {
        error!("Offline stream failure injected: {}", message);
        let mut slot = self.shared.error.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(message.to_string());
        }
        self.shared.playing.store(false, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        self.shared.engine.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::Acquire)
    }

    /// Channel count of the opened stream (1 before open)
    pub fn channels(&self) -> usize {
        self.shared.channels.load(Ordering::Acquire).max(1)
    }

    /// Number of successful `play` calls
    pub fn starts(&self) -> usize {
        self.shared.starts.load(Ordering::SeqCst)
    }

    /// Number of `pause` calls that stopped a playing stream
    pub fn stops(&self) -> usize {
        self.shared.stops.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_before_play_returns_none() {
        let (_backend, driver) = OfflineBackend::new(48_000);
        assert!(!driver.is_open());
        assert!(driver.render(16).is_none());
        assert!(driver.render_planar(16).is_none());
    }

    #[test]
    fn test_play_before_open_fails() {
        let (mut backend, driver) = OfflineBackend::new(48_000);
        assert!(matches!(backend.play(), Err(Error::InvalidState(_))));
        assert_eq!(driver.starts(), 0);
    }

    #[test]
    fn test_default_sample_rate_reported() {
        let (backend, _driver) = OfflineBackend::new(44_100);
        assert_eq!(backend.default_sample_rate().unwrap(), 44_100);
        assert_eq!(backend.name(), "offline");
    }

    #[test]
    fn test_fail_stops_stream_and_records_error() {
        let (backend, driver) = OfflineBackend::new(48_000);
        driver.fail("device unplugged");
        driver.fail("second error ignored");
        assert!(!driver.is_playing());
        assert_eq!(backend.stream_error().as_deref(), Some("device unplugged"));
    }
}
