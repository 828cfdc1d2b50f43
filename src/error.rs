//! # Error Types
//!
//! Custom error types for Crest Logger using `thiserror`.

use thiserror::Error;

/// Main error type for Crest Logger
#[derive(Debug, Error)]
pub enum CrestLoggerError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors (log directory, log files, config file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client construction errors
    #[error("HTTP client error: {0}")]
    Http(String),

    /// A message arrived with a name nobody handles
    #[error("Unknown message: {0}")]
    UnknownMessage(String),

    /// A known message arrived with a payload of the wrong shape
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// The other end of a task channel went away
    #[error("Channel closed: {0}")]
    ChannelClosed(String),
}

/// Result type alias for Crest Logger
pub type Result<T> = std::result::Result<T, CrestLoggerError>;
