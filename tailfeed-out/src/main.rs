//! Tone generator (tailfeed-tone) - Main entry point
//!
//! Plays a sine tone through an [`AudioSession`], either on the default
//! output device or, with `--offline`, through the software driver pulled on
//! a timer. Useful for checking a device and for watching refill and
//! underrun behaviour in the logs.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tailfeed_common::{logging, TomlConfig};
use tailfeed_out::{
    AudioSession, CpalBackend, OfflineBackend, OfflineDriver, RefillContext, SessionConfig, SineTone,
};
use tokio::{signal, time};
use tracing::{info, warn};

/// Period pulled per offline callback when no device buffer size is given
const DEFAULT_OFFLINE_PERIOD: u32 = 512;

/// Interval between statistics reports
const STATS_INTERVAL: Duration = Duration::from_secs(5);

/// Command-line arguments for tailfeed-tone
#[derive(Parser, Debug)]
#[command(name = "tailfeed-tone")]
#[command(about = "Sine tone player for the tailfeed audio output bridge")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "TAILFEED_CONFIG")]
    config: Option<PathBuf>,

    /// Frames per primary buffer fill (overrides config)
    #[arg(short, long, env = "TAILFEED_BUFFER_SIZE")]
    buffer_size: Option<u32>,

    /// Output sample rate in Hz (overrides config; default: device rate)
    #[arg(short, long, env = "TAILFEED_SAMPLE_RATE")]
    sample_rate: Option<u32>,

    /// Output channel count (overrides config)
    #[arg(long, env = "TAILFEED_CHANNELS")]
    channels: Option<u16>,

    /// Hardware period in frames
    #[arg(long)]
    device_buffer: Option<u32>,

    /// Tone frequency in Hz
    #[arg(short, long, default_value = "440")]
    frequency: f64,

    /// Tone amplitude (0.0 - 1.0)
    #[arg(short, long, default_value = "0.2")]
    amplitude: f32,

    /// Seconds to play; runs until Ctrl+C when omitted
    #[arg(short, long)]
    duration: Option<u64>,

    /// Use the software driver instead of an audio device
    #[arg(long)]
    offline: bool,

    /// Run refills on the supervision loop instead of a worker thread
    #[arg(long)]
    cooperative: bool,

    /// Log level (overrides config)
    #[arg(long, env = "TAILFEED_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn session_config(&self, toml: &TomlConfig) -> SessionConfig {
        let mut config = SessionConfig::from_toml(&toml.audio);
        if let Some(frames) = self.buffer_size {
            config = config.with_buffer_size(frames);
        }
        if let Some(hz) = self.sample_rate {
            config = config.with_sample_rate(hz);
        }
        if let Some(channels) = self.channels {
            config = config.with_channel_count(channels);
        }
        if let Some(frames) = self.device_buffer {
            config = config.with_device_buffer_frames(frames);
        }
        if self.cooperative {
            config = config.with_refill_context(RefillContext::Cooperative);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml = TomlConfig::load_resolved(args.config.as_deref())
        .context("Failed to load configuration")?;

    let mut logging_config = toml.logging.clone();
    if let Some(level) = &args.log_level {
        logging_config.level = level.clone();
    }
    logging::init(
        &logging_config,
        &["tailfeed_tone", "tailfeed_out", "tailfeed_common"],
    )
    .context("Failed to initialize logging")?;

    info!("Starting tailfeed-tone v{}", env!("CARGO_PKG_VERSION"));

    let config = args.session_config(&toml);

    let (mut session, driver) = if args.offline {
        let (backend, driver) = OfflineBackend::new(48_000);
        let session = AudioSession::new(config, backend).context("Failed to create audio session")?;
        (session, Some(driver))
    } else {
        let backend = CpalBackend::new().context("Failed to open audio device")?;
        let session = AudioSession::new(config, backend).context("Failed to create audio session")?;
        (session, None)
    };

    info!(
        "Playing {} Hz at amplitude {} on '{}' ({} Hz, {} channels, {} frames per fill)",
        args.frequency,
        args.amplitude,
        session.backend_name(),
        session.sample_rate(),
        session.channel_count(),
        session.frame_capacity()
    );

    let tone = SineTone::new(
        args.frequency,
        args.amplitude,
        session.sample_rate(),
        session.channel_count(),
    );
    session.set_producer(tone.into_producer());
    session.start().context("Failed to start audio session")?;

    let outcome = supervise(&mut session, driver, args.duration.map(Duration::from_secs)).await;

    session.stop().context("Failed to stop audio session")?;
    let stats = session.stats();
    info!(
        "Playback finished: {} callbacks, {} frames served, {} silent ({:.3}% underrun), {} refills",
        stats.callbacks,
        stats.frames_served(),
        stats.silent_frames,
        stats.underrun_ratio() * 100.0,
        stats.refills_completed
    );

    outcome
}

/// Keep the session serviced until shutdown, the play duration, or a stream
/// failure
async fn supervise(
    session: &mut AudioSession,
    driver: Option<OfflineDriver>,
    duration: Option<Duration>,
) -> Result<()> {
    let period_frames = session
        .params()
        .device_buffer_frames
        .unwrap_or(DEFAULT_OFFLINE_PERIOD) as usize;
    let period = Duration::from_secs_f64(period_frames as f64 / session.sample_rate() as f64);

    let mut ticker = time::interval(period);
    let mut report = time::interval(STATS_INTERVAL);
    report.tick().await;

    let deadline = async {
        match duration {
            Some(d) => time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut peak = 0.0f32;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = &mut deadline => {
                info!("Play duration elapsed");
                break;
            }
            _ = ticker.tick() => {
                if let Some(driver) = &driver {
                    match driver.render(period_frames) {
                        Some(samples) => {
                            peak = samples.iter().fold(peak, |p, s| p.max(s.abs()));
                        }
                        None => warn!("Offline stream not playing"),
                    }
                }
                session.service_refills();
                session.check_stream().context("Audio stream failed")?;
            }
            _ = report.tick() => {
                let stats = session.stats();
                info!(
                    "callbacks={} served={} silent={} refills={}/{} peak={:.3}",
                    stats.callbacks,
                    stats.frames_served(),
                    stats.silent_frames,
                    stats.refills_completed,
                    stats.refills_requested,
                    peak
                );
                peak = 0.0;
            }
        }
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
