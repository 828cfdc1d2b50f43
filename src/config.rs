//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files, with
//! environment variable overrides for the CREST2 endpoint and log directory.
//! Overrides may also come from a `.env` file; variables already set in the
//! process environment win over the file.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::error::{CrestLoggerError, Result};

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "CREST_LOGGER_CONFIG";

/// Config file used when `CREST_LOGGER_CONFIG` is not set
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment variable overriding the CREST2 host
pub const HOST_ENV: &str = "CREST2_IP";

/// Environment variable overriding the CREST2 port
pub const PORT_ENV: &str = "CREST2_PORT";

/// Environment variable overriding the log directory
pub const LOG_DIR_ENV: &str = "CREST_LOGGER_LOG_DIR";

/// Load a `.env` file from the working directory or one of its parents
///
/// A missing file is not an error. A file that fails to parse is logged and
/// skipped; variables before the bad line may already be set.
///
/// # Returns
///
/// * `Option<PathBuf>` - Path of the loaded file
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => Some(path),
        Err(e) if e.not_found() => None,
        Err(e) => {
            warn!("Ignoring .env file: {}", e);
            None
        }
    }
}

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub crest: CrestConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
}

/// CREST2 endpoint configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CrestConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Session log configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

/// Poller to coordinator channel configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ChannelConfig {
    #[serde(default = "default_channel_capacity")]
    pub capacity: usize,
}

// Default value functions
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8990 }
fn default_timeout_ms() -> u64 { 1000 }
fn default_poll_interval_ms() -> u64 { 1000 }

fn default_log_dir() -> String { "./logs".to_string() }

fn default_channel_capacity() -> usize { 64 }

impl Default for CrestConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_ms: default_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { log_dir: default_log_dir() }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self { capacity: default_channel_capacity() }
    }
}

impl CrestConfig {
    /// Timeout applied to every fetch
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay between the end of one fetch and the start of the next
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use crest_logger::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, or use defaults if it does not exist
    ///
    /// A file that exists but fails to parse or validate is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `CREST2_IP`, `CREST2_PORT` and `CREST_LOGGER_LOG_DIR` from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())?;
        self.validate()
    }

    /// Apply overrides from an arbitrary key lookup
    ///
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value_of = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(host) = value_of(HOST_ENV) {
            self.crest.host = host.trim().to_string();
        }

        if let Some(port) = value_of(PORT_ENV) {
            self.crest.port = port.trim().parse().map_err(|_| {
                CrestLoggerError::Config(toml::de::Error::custom(format!(
                    "{} must be a port number, got '{}'",
                    PORT_ENV, port
                )))
            })?;
        }

        if let Some(log_dir) = value_of(LOG_DIR_ENV) {
            self.logging.log_dir = log_dir;
        }

        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Returns
    ///
    /// * `Result<()>` - Ok if valid, Err if invalid
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.crest.host.is_empty() {
            return Err(CrestLoggerError::Config(
                toml::de::Error::custom("crest host cannot be empty")
            ));
        }

        if self.crest.port == 0 {
            return Err(CrestLoggerError::Config(
                toml::de::Error::custom("crest port must be greater than 0")
            ));
        }

        if self.crest.timeout_ms == 0 || self.crest.timeout_ms > 60000 {
            return Err(CrestLoggerError::Config(
                toml::de::Error::custom("timeout_ms must be between 1 and 60000")
            ));
        }

        if self.crest.poll_interval_ms == 0 || self.crest.poll_interval_ms > 60000 {
            return Err(CrestLoggerError::Config(
                toml::de::Error::custom("poll_interval_ms must be between 1 and 60000")
            ));
        }

        if self.logging.log_dir.is_empty() {
            return Err(CrestLoggerError::Config(
                toml::de::Error::custom("log_dir cannot be empty")
            ));
        }

        if self.channel.capacity == 0 {
            return Err(CrestLoggerError::Config(
                toml::de::Error::custom("channel capacity must be greater than 0")
            ));
        }

        Ok(())
    }
}
