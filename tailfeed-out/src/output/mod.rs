//! Output backends
//!
//! A backend owns the hardware (or simulated) stream. The session hands it
//! the [`RenderEngine`] at construction; the backend calls
//! [`RenderEngine::render`] from its own callback thread once playing.

pub mod device;
pub mod offline;

pub use device::CpalBackend;
pub use offline::{OfflineBackend, OfflineDriver};

use crate::config::StreamParams;
use crate::error::Result;
use crate::render::RenderEngine;

/// Hardware stream owned by an [`AudioSession`](crate::AudioSession)
pub trait OutputBackend {
    /// Human-readable device name
    fn name(&self) -> String;

    /// Output sample rate the device reports by default
    fn default_sample_rate(&self) -> Result<u32>;

    /// Configure the stream with `engine` as its render callback. The stream
    /// must not be started yet.
    fn open(&mut self, params: &StreamParams, engine: RenderEngine) -> Result<()>;

    /// Start (or resume) the stream
    fn play(&mut self) -> Result<()>;

    /// Halt the stream; no render callbacks after this returns
    fn pause(&mut self) -> Result<()>;

    /// First fatal error reported by the running stream, if any
    fn stream_error(&self) -> Option<String>;
}
