//! Audio session
//!
//! Owns the output backend, the refill side of the primary buffer exchange
//! and (in [`RefillContext::Worker`] mode) the refill thread. The render side
//! is moved into the backend's stream at construction.
//!
//! Lifecycle: `Idle → Running → Stopped`. Stopped is terminal.

use crate::buffer::exchange;
use crate::config::{RefillContext, SessionConfig, StreamParams};
use crate::error::{Error, Result};
use crate::output::OutputBackend;
use crate::refill::{RefillTrigger, RefillWorker, Refiller};
use crate::render::{RenderEngine, RenderStats, StatsSnapshot};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Read-only property: output sample rate in Hz
pub const PROPERTY_SAMPLE_RATE: &str = "sampleRate";

/// Read-only property: output channel count
pub const PROPERTY_CHANNELS: &str = "channels";

/// Read-only property: frames per primary buffer fill
pub const PROPERTY_BUFFER_SIZE: &str = "bufferSize";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, stream configured but not started
    Idle,
    /// Stream running, refills active
    Running,
    /// Stream halted for good
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Running => write!(f, "running"),
            SessionState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Real-time output bridge between a pull-model device and a host producer
pub struct AudioSession {
    backend: Box<dyn OutputBackend>,
    params: StreamParams,
    refill_context: RefillContext,
    state: SessionState,
    refiller: Arc<Refiller>,
    trigger: Arc<RefillTrigger>,
    stats: Arc<RenderStats>,
    worker: Option<RefillWorker>,
}

impl AudioSession {
    /// Validate `config`, allocate both primary buffer instances and the tail
    /// store, and configure (but do not start) the backend's stream.
    pub fn new<B>(config: SessionConfig, mut backend: B) -> Result<Self>
    where
        B: OutputBackend + 'static,
    {
        let params = config.resolve(|| backend.default_sample_rate())?;

        info!(
            "Creating audio session on '{}': {} Hz, {} channels, {} frames per fill",
            backend.name(),
            params.sample_rate,
            params.channels,
            params.frame_capacity
        );

        let channels = params.channels as usize;
        let (fill, drain) = exchange(params.frame_capacity as usize, channels);
        let trigger = Arc::new(RefillTrigger::new());
        let stats = Arc::new(RenderStats::new());

        let engine = RenderEngine::new(channels, drain, Arc::clone(&trigger), Arc::clone(&stats));
        backend.open(&params, engine)?;

        Ok(Self {
            backend: Box::new(backend),
            params,
            refill_context: config.refill_context,
            state: SessionState::Idle,
            refiller: Arc::new(Refiller::new(fill, Arc::clone(&stats))),
            trigger,
            stats,
            worker: None,
        })
    }

    /// Start output. A no-op while already running.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            SessionState::Running => {
                debug!("Session already running");
                return Ok(());
            }
            SessionState::Stopped => {
                return Err(Error::InvalidState("Session has been stopped".to_string()));
            }
            SessionState::Idle => {}
        }

        match self.refill_context {
            RefillContext::Worker => {
                let worker = RefillWorker::spawn(Arc::clone(&self.refiller), Arc::clone(&self.trigger))?;
                self.worker = Some(worker);
            }
            RefillContext::Cooperative => self.trigger.arm(None),
        }

        // First buffer is in place before the device asks for audio
        self.refiller.refill();

        if let Err(e) = self.backend.play() {
            error!("Failed to start output stream: {}", e);
            self.halt_refills();
            self.state = SessionState::Stopped;
            return Err(e);
        }

        self.state = SessionState::Running;
        info!("Audio session started");
        Ok(())
    }

    /// Halt the stream and the refill context. Idempotent.
    pub fn stop(&mut self) -> Result<()> {
        match self.state {
            SessionState::Stopped => return Ok(()),
            SessionState::Idle => {
                self.state = SessionState::Stopped;
                debug!("Idle session stopped");
                return Ok(());
            }
            SessionState::Running => {}
        }

        // Stream first, so no render callback asserts after the worker is gone
        let paused = self.backend.pause();
        self.halt_refills();
        self.state = SessionState::Stopped;

        let snapshot = self.stats.snapshot();
        info!(
            "Audio session stopped: {} callbacks, {} frames served, {} silent",
            snapshot.callbacks,
            snapshot.frames_served(),
            snapshot.silent_frames
        );
        paused
    }

    fn halt_refills(&mut self) {
        self.trigger.disarm();
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
        }
    }

    /// Register the producer. Takes effect on the next refill.
    pub fn set_producer<F>(&self, producer: F)
    where
        F: FnMut(&mut [f32]) + Send + 'static,
    {
        self.refiller.set_producer(Some(Box::new(producer)));
        debug!("Refill producer registered");
    }

    /// Remove the producer; later refills publish silence
    pub fn clear_producer(&self) {
        self.refiller.set_producer(None);
        debug!("Refill producer cleared");
    }

    pub fn has_producer(&self) -> bool {
        self.refiller.has_producer()
    }

    /// Run any pending refill on the calling thread.
    ///
    /// Only does work for [`RefillContext::Cooperative`] sessions while
    /// running; worker sessions refill on their own thread. Returns the number
    /// of buffers published.
    pub fn service_refills(&self) -> usize {
        if self.refill_context != RefillContext::Cooperative || self.state != SessionState::Running {
            return 0;
        }

        let mut published = 0;
        while self.trigger.observe() {
            if self.refiller.refill() {
                published += 1;
            }
        }
        published
    }

    /// Surface a fatal stream error reported by the backend.
    ///
    /// The first time an error is seen the session is stopped; every call
    /// after that keeps returning the error.
    pub fn check_stream(&mut self) -> Result<()> {
        let Some(message) = self.backend.stream_error() else {
            return Ok(());
        };

        if self.state != SessionState::Stopped {
            error!("Output stream failed: {}", message);
            if let Err(e) = self.stop() {
                warn!("Failed to pause failed stream: {}", e);
            }
        }

        Err(Error::StreamFailed(message))
    }

    /// Read a session property by name
    pub fn property(&self, name: &str) -> Result<u32> {
        match name {
            PROPERTY_SAMPLE_RATE => Ok(self.params.sample_rate),
            PROPERTY_CHANNELS => Ok(self.params.channels as u32),
            PROPERTY_BUFFER_SIZE => Ok(self.params.frame_capacity),
            _ => Err(Error::UnknownProperty(name.to_string())),
        }
    }

    /// Every session property is fixed at construction
    pub fn set_property(&mut self, name: &str, value: u32) -> Result<()> {
        match name {
            PROPERTY_SAMPLE_RATE | PROPERTY_CHANNELS | PROPERTY_BUFFER_SIZE => {
                warn!("Rejected write of {} to read-only property '{}'", value, name);
                Err(Error::ReadOnlyProperty(name.to_string()))
            }
            _ => Err(Error::UnknownProperty(name.to_string())),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.params.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.params.channels
    }

    pub fn frame_capacity(&self) -> u32 {
        self.params.frame_capacity
    }

    pub fn params(&self) -> &StreamParams {
        &self.params
    }

    pub fn refill_context(&self) -> RefillContext {
        self.refill_context
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn backend_name(&self) -> String {
        self.backend.name()
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Error stopping audio session on drop: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{OfflineBackend, OfflineDriver};

    fn session(config: SessionConfig) -> (AudioSession, OfflineDriver) {
        let (backend, driver) = OfflineBackend::new(48_000);
        let session = AudioSession::new(config, backend).unwrap();
        (session, driver)
    }

    fn cooperative(frames: u32, channels: u16) -> SessionConfig {
        SessionConfig::default()
            .with_buffer_size(frames)
            .with_channel_count(channels)
            .with_refill_context(RefillContext::Cooperative)
    }

    #[test]
    fn test_defaults_use_device_rate() {
        let (session, driver) = session(SessionConfig::default());
        assert_eq!(session.sample_rate(), 48_000);
        assert_eq!(session.channel_count(), 2);
        assert_eq!(session.frame_capacity(), 1024);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(driver.is_open());
        assert!(!driver.is_playing());
    }

    #[test]
    fn test_invalid_config_opens_no_stream() {
        let (backend, driver) = OfflineBackend::new(48_000);
        let result = AudioSession::new(SessionConfig::default().with_channel_count(0), backend);
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(!driver.is_open());
    }

    #[test]
    fn test_properties_are_read_only() {
        let (mut session, _driver) = session(cooperative(256, 1));

        assert_eq!(session.property(PROPERTY_SAMPLE_RATE).unwrap(), 48_000);
        assert_eq!(session.property(PROPERTY_CHANNELS).unwrap(), 1);
        assert_eq!(session.property(PROPERTY_BUFFER_SIZE).unwrap(), 256);

        assert!(matches!(
            session.set_property(PROPERTY_SAMPLE_RATE, 44_100),
            Err(Error::ReadOnlyProperty(_))
        ));
        assert!(matches!(session.property("volume"), Err(Error::UnknownProperty(_))));
        assert!(matches!(session.set_property("volume", 1), Err(Error::UnknownProperty(_))));
        assert_eq!(session.sample_rate(), 48_000);
    }

    #[test]
    fn test_stop_idle_session() {
        let (mut session, driver) = session(cooperative(4, 1));
        session.stop().unwrap();
        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(driver.starts(), 0);
        assert!(matches!(session.start(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_service_refills_ignored_before_start() {
        let (session, _driver) = session(cooperative(4, 1));
        assert_eq!(session.service_refills(), 0);
    }

    #[test]
    fn test_drop_stops_stream() {
        let (mut session, driver) = session(cooperative(4, 1));
        session.start().unwrap();
        assert!(driver.is_playing());

        drop(session);
        assert!(!driver.is_playing());
        assert_eq!(driver.stops(), 1);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Idle.to_string(), "idle");
        assert_eq!(SessionState::Running.to_string(), "running");
        assert_eq!(SessionState::Stopped.to_string(), "stopped");
    }
}
