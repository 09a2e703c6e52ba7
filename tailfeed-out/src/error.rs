//! Error types for tailfeed-out
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for tailfeed-out
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or unsupported session parameters
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bootstrap configuration / shared infrastructure errors
    #[error(transparent)]
    Common(#[from] tailfeed_common::Error),

    /// Audio output device errors (device missing, config unsupported, stream build/play)
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// The running stream reported a fatal error; the session is stopped
    #[error("Audio stream failed: {0}")]
    StreamFailed(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Attempt to change a property that is fixed at construction
    #[error("Property '{0}' is read-only")]
    ReadOnlyProperty(String),

    /// Property name not known to the session
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    /// Refill context could not be started
    #[error("Refill error: {0}")]
    Refill(String),
}

/// Convenience Result type using tailfeed-out Error
pub type Result<T> = std::result::Result<T, Error>;
