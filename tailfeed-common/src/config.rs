//! Bootstrap configuration loading and config file resolution
//!
//! The TOML file only carries startup values. Command-line arguments are
//! applied on top of it by the binaries.
//!
//! ```toml
//! [audio]
//! buffer_size = 1024
//! sample_rate = 48000
//! channels = 2
//!
//! [logging]
//! level = "info"
//! ```

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TAILFEED_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Output stream parameters (all optional)
    #[serde(default)]
    pub audio: AudioSection,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[audio]` table
///
/// Unset values fall back to the session defaults (1024 frames, device
/// sample rate, 2 channels).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AudioSection {
    /// Frames per primary buffer fill
    #[serde(default)]
    pub buffer_size: Option<u32>,

    /// Output sample rate in Hz
    #[serde(default)]
    pub sample_rate: Option<u32>,

    /// Output channel count
    #[serde(default)]
    pub channels: Option<u16>,
}

/// `[logging]` table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        let config = Self::parse(&text)?;
        info!("Loaded TOML configuration from {:?}", path);
        Ok(config)
    }

    /// Resolve and load the bootstrap configuration.
    ///
    /// An explicitly requested file (command line or [`CONFIG_ENV_VAR`]) must
    /// exist. The per-user default file is optional: when it is missing the
    /// built-in defaults are returned.
    pub fn load_resolved(cli_arg: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_arg) {
            ConfigSource::Explicit(path) => Self::load(&path),
            ConfigSource::Default(path) if path.exists() => Self::load(&path),
            ConfigSource::Default(path) => {
                warn!("No config file at {:?}, using built-in defaults", path);
                Ok(Self::default())
            }
            ConfigSource::None => {
                warn!("Could not determine config directory, using built-in defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Where the bootstrap configuration comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Path given on the command line or via environment
    Explicit(PathBuf),
    /// Per-user default location (may not exist)
    Default(PathBuf),
    /// No candidate location on this platform
    None,
}

/// Config file resolution priority:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. `<config_dir>/tailfeed/config.toml`
pub fn resolve_config_path(cli_arg: Option<&Path>) -> ConfigSource {
    if let Some(path) = cli_arg {
        return ConfigSource::Explicit(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return ConfigSource::Explicit(PathBuf::from(path));
        }
    }

    match default_config_path() {
        Some(path) => ConfigSource::Default(path),
        None => ConfigSource::None,
    }
}

/// Get default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tailfeed").join("config.toml"))
}
