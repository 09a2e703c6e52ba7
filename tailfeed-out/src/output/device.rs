//! Audio output using cpal
//!
//! Opens the default output device with an f32 stream matching the session
//! parameters exactly. No sample format conversion is performed: devices
//! without f32 support at the requested rate and channel count are rejected.

use super::OutputBackend;
use crate::config::StreamParams;
use crate::error::{Error, Result};
use crate::render::{Interleaved, RenderEngine};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info};

/// Default output device driven by cpal.
///
/// Not `Send`: `cpal::Stream` must stay on the thread that created it on
/// some platforms.
pub struct CpalBackend {
    device: Device,
    stream: Option<Stream>,
    /// Stream error reported by the error callback
    error: Arc<Mutex<Option<String>>>,
}

impl CpalBackend {
    /// Open the host's default output device
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?;

        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("Using default audio device: {}", name);

        Ok(Self {
            device,
            stream: None,
            error: Arc::new(Mutex::new(None)),
        })
    }

    /// Find an f32 configuration with the requested channel count and rate
    fn stream_config(&self, params: &StreamParams) -> Result<StreamConfig> {
        let mut supported_configs = self
            .device
            .supported_output_configs()
            .map_err(|e| Error::AudioOutput(format!("Failed to get device configs: {}", e)))?;

        let matching = supported_configs.find(|config| {
            config.channels() == params.channels
                && config.min_sample_rate().0 <= params.sample_rate
                && config.max_sample_rate().0 >= params.sample_rate
                && config.sample_format() == SampleFormat::F32
        });

        let Some(supported) = matching else {
            return Err(Error::AudioOutput(format!(
                "Device '{}' has no f32 output with {} channels at {} Hz",
                self.name(),
                params.channels,
                params.sample_rate
            )));
        };

        let mut config = supported
            .with_sample_rate(cpal::SampleRate(params.sample_rate))
            .config();

        if let Some(frames) = params.device_buffer_frames {
            config.buffer_size = cpal::BufferSize::Fixed(frames);
            debug!("Using requested device buffer size: {} frames", frames);
        } else {
            debug!("Using device default buffer size");
        }

        Ok(config)
    }
}

impl OutputBackend for CpalBackend {
    fn name(&self) -> String {
        self.device.name().unwrap_or_else(|_| "Unknown".to_string())
    }

    fn default_sample_rate(&self) -> Result<u32> {
        let config = self
            .device
            .default_output_config()
            .map_err(|e| Error::AudioOutput(format!("Failed to get default config: {}", e)))?;
        Ok(config.sample_rate().0)
    }

    fn open(&mut self, params: &StreamParams, mut engine: RenderEngine) -> Result<()> {
        let config = self.stream_config(params)?;
        let channels = config.channels as usize;
        let error_slot = Arc::clone(&self.error);

        debug!(
            "Audio config: sample_rate={}, channels={}, buffer_size={:?}",
            config.sample_rate.0, config.channels, config.buffer_size
        );

        let stream = self
            .device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    engine.render(&mut Interleaved::new(data, channels));
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                    let mut slot = error_slot.lock().unwrap_or_else(PoisonError::into_inner);
                    if slot.is_none() {
                        *slot = Some(err.to_string());
                    }
                },
                None, // No timeout
            )
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))?;

        self.stream = Some(stream);
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| Error::InvalidState("Audio stream not opened".to_string()))?;

        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;

        info!("Audio stream started");
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.as_ref() {
            stream
                .pause()
                .map_err(|e| Error::AudioOutput(format!("Failed to pause stream: {}", e)))?;
            info!("Audio stream paused");
        }
        Ok(())
    }

    fn stream_error(&self) -> Option<String> {
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for CpalBackend {
    fn drop(&mut self) {
        // Ensure stream is stopped on drop
        let _ = self.pause();
    }
}
