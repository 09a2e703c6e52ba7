//! # tailfeed Common Library
//!
//! Shared code for the tailfeed crates:
//! - Error type
//! - TOML bootstrap configuration and its resolution order
//! - Logging setup on top of tracing-subscriber

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AudioSection, LoggingConfig, TomlConfig};
pub use error::{Error, Result};
