//! Logging initialization
//!
//! `RUST_LOG` takes priority; otherwise the `[logging]` level from the
//! bootstrap config is applied to the given crate targets.

use crate::config::LoggingConfig;
use crate::{Error, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Build an `EnvFilter` directive such as `tailfeed_out=info,tailfeed_common=info`
pub fn filter_directive(level: &str, targets: &[&str]) -> Result<String> {
    let level = level.trim().to_ascii_lowercase();
    if !LEVELS.contains(&level.as_str()) {
        return Err(Error::Config(format!("Unknown log level '{}'", level)));
    }

    Ok(targets
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(","))
}

/// Install the global tracing subscriber.
///
/// Logs go to stderr unless `config.file` is set, in which case they are
/// appended to that file without ANSI colors.
pub fn init(config: &LoggingConfig, targets: &[&str]) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(filter_directive(&config.level, targets)?),
    };

    let (stderr_layer, file_layer) = match &config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let layer = fmt::layer().with_ansi(false).with_writer(Mutex::new(file));
            (None, Some(layer))
        }
        None => (Some(fmt::layer().with_writer(std::io::stderr)), None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}
