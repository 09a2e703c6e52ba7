//! Session configuration
//!
//! Construction parameters for an [`AudioSession`](crate::AudioSession).
//! Every value is optional; unset values take the built-in defaults, except
//! the sample rate, which defaults to the output device's reported rate.

use crate::error::{Error, Result};
use tailfeed_common::AudioSection;

/// Default frames per primary buffer fill
pub const DEFAULT_BUFFER_SIZE: u32 = 1024;

/// Default output channel count
pub const DEFAULT_CHANNEL_COUNT: u16 = 2;

/// Accepted sample rate range (Hz)
pub const MIN_SAMPLE_RATE: u32 = 8_000;
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// Upper bound on channel count
pub const MAX_CHANNEL_COUNT: u16 = 32;

/// Upper bound on frames per primary buffer fill
pub const MAX_BUFFER_SIZE: u32 = 65_536;

/// Where the refill producer runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefillContext {
    /// Dedicated refill thread, woken by the trigger
    #[default]
    Worker,

    /// Host polls [`AudioSession::service_refills`](crate::AudioSession::service_refills)
    /// from its own loop
    Cooperative,
}

/// Requested session parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Frames per primary buffer fill (default 1024)
    pub buffer_size: Option<u32>,

    /// Output sample rate (default: device rate)
    pub sample_rate: Option<u32>,

    /// Output channel count (default 2)
    pub channel_count: Option<u16>,

    /// Hardware period hint in frames (default: device default)
    pub device_buffer_frames: Option<u32>,

    /// Refill execution context
    pub refill_context: RefillContext,
}

/// Validated, immutable stream parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    pub sample_rate: u32,
    pub channels: u16,
    pub frame_capacity: u32,
    pub device_buffer_frames: Option<u32>,
}

impl StreamParams {
    /// Samples held by one primary buffer instance
    pub fn buffer_samples(&self) -> usize {
        self.frame_capacity as usize * self.channels as usize
    }
}

impl SessionConfig {
    /// Start from the `[audio]` table of the bootstrap config
    pub fn from_toml(audio: &AudioSection) -> Self {
        Self {
            buffer_size: audio.buffer_size,
            sample_rate: audio.sample_rate,
            channel_count: audio.channels,
            ..Self::default()
        }
    }

    pub fn with_buffer_size(mut self, frames: u32) -> Self {
        self.buffer_size = Some(frames);
        self
    }

    pub fn with_sample_rate(mut self, hz: u32) -> Self {
        self.sample_rate = Some(hz);
        self
    }

    pub fn with_channel_count(mut self, channels: u16) -> Self {
        self.channel_count = Some(channels);
        self
    }

    pub fn with_device_buffer_frames(mut self, frames: u32) -> Self {
        self.device_buffer_frames = Some(frames);
        self
    }

    pub fn with_refill_context(mut self, context: RefillContext) -> Self {
        self.refill_context = context;
        self
    }

    /// Apply defaults and validate.
    ///
    /// `device_rate` is only consulted when no sample rate was requested.
    pub fn resolve<F>(&self, device_rate: F) -> Result<StreamParams>
    where
        F: FnOnce() -> Result<u32>,
    {
        let sample_rate = match self.sample_rate {
            Some(rate) => rate,
            None => device_rate()?,
        };
        let channels = self.channel_count.unwrap_or(DEFAULT_CHANNEL_COUNT);
        let frame_capacity = self.buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);

        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
            return Err(Error::Config(format!(
                "Unsupported sample rate {} Hz (expected {}-{})",
                sample_rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE
            )));
        }

        if channels == 0 || channels > MAX_CHANNEL_COUNT {
            return Err(Error::Config(format!(
                "Unsupported channel count {} (expected 1-{})",
                channels, MAX_CHANNEL_COUNT
            )));
        }

        if frame_capacity == 0 || frame_capacity > MAX_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "Unsupported buffer size {} frames (expected 1-{})",
                frame_capacity, MAX_BUFFER_SIZE
            )));
        }

        if self.device_buffer_frames == Some(0) {
            return Err(Error::Config("Device buffer size must be positive".to_string()));
        }

        Ok(StreamParams {
            sample_rate,
            channels,
            frame_capacity,
            device_buffer_frames: self.device_buffer_frames,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_48k() -> Result<u32> {
        Ok(48_000)
    }

    #[test]
    fn test_defaults() {
        let params = SessionConfig::default().resolve(device_48k).unwrap();
        assert_eq!(params.sample_rate, 48_000);
        assert_eq!(params.channels, 2);
        assert_eq!(params.frame_capacity, 1024);
        assert_eq!(params.device_buffer_frames, None);
        assert_eq!(params.buffer_samples(), 2048);
    }

    #[test]
    fn test_explicit_rate_skips_device_query() {
        let params = SessionConfig::default()
            .with_sample_rate(44_100)
            .resolve(|| Err(Error::AudioOutput("no device".to_string())))
            .unwrap();
        assert_eq!(params.sample_rate, 44_100);
    }

    #[test]
    fn test_device_query_error_propagates() {
        let result = SessionConfig::default()
            .resolve(|| Err(Error::AudioOutput("no device".to_string())));
        assert!(matches!(result, Err(Error::AudioOutput(_))));
    }

    #[test]
    fn test_rejects_zero_values() {
        let zero_rate = SessionConfig::default().with_sample_rate(0).resolve(device_48k);
        assert!(matches!(zero_rate, Err(Error::Config(_))));

        let zero_channels = SessionConfig::default().with_channel_count(0).resolve(device_48k);
        assert!(matches!(zero_channels, Err(Error::Config(_))));

        let zero_frames = SessionConfig::default().with_buffer_size(0).resolve(device_48k);
        assert!(matches!(zero_frames, Err(Error::Config(_))));

        let zero_period = SessionConfig::default().with_device_buffer_frames(0).resolve(device_48k);
        assert!(matches!(zero_period, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(SessionConfig::default().with_sample_rate(1_000_000).resolve(device_48k).is_err());
        assert!(SessionConfig::default().with_channel_count(64).resolve(device_48k).is_err());
        assert!(SessionConfig::default().with_buffer_size(1 << 20).resolve(device_48k).is_err());
    }

    #[test]
    fn test_from_toml_section() {
        let audio = AudioSection {
            buffer_size: Some(4096),
            sample_rate: None,
            channels: Some(1),
        };
        let config = SessionConfig::from_toml(&audio);
        assert_eq!(config.buffer_size, Some(4096));
        assert_eq!(config.sample_rate, None);
        assert_eq!(config.channel_count, Some(1));
        assert_eq!(config.refill_context, RefillContext::Worker);
    }
}
