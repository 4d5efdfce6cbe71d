//! Configuration management.
//!
//! This module handles:
//! - Environment variable loading (`HARNESS_*`, `.env` via `dotenvy`)
//! - Configuration validation
//! - Default value handling
//! - Threshold override files
//! - Secure password storage via [`SecretString`]
//!
//! # Example
//!
//! ```
//! use stability_harness::backends::BackendKind;
//! use stability_harness::config::{Config, SecretString};
//!
//! let config = Config {
//!     password: Some(SecretString::new("hunter2")),
//!     ..Config::for_backend(BackendKind::Kafka)
//! };
//!
//! assert_eq!(config.endpoint(), "127.0.0.1:9092");
//! let debug = format!("{:?}", config);
//! assert!(debug.contains("<REDACTED>"));
//! assert!(!debug.contains("hunter2"));
//! ```

mod secret;
mod validation;

pub use secret::SecretString;
pub use validation::{
    load_threshold_overrides, validate_config, MAX_DURATION_SECS, MAX_OPERATIONS,
    MIN_DURATION_SECS, MIN_OPERATIONS,
};

use std::path::PathBuf;
use std::time::Duration;

use crate::backends::BackendKind;
use crate::error::ConfigError;
use crate::report::OutputFormat;

/// Default backend host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default run duration in seconds.
pub const DEFAULT_DURATION_SECS: u64 = 60;

/// Default operation budget.
pub const DEFAULT_OPERATIONS: u64 = 1000;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Harness configuration.
///
/// Use [`Config::from_env`] to load from environment variables; CLI flags
/// are applied on top by the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend flavor under test.
    pub backend: BackendKind,
    /// Backend host.
    pub host: String,
    /// Backend port.
    pub port: u16,
    /// Backend password (protected from logging via [`SecretString`]).
    pub password: Option<SecretString>,
    /// Run duration in seconds.
    pub duration_secs: u64,
    /// Operation budget.
    pub operations: u64,
    /// Report format.
    pub output_format: OutputFormat,
    /// Report destination; stdout when unset.
    pub output_path: Option<PathBuf>,
    /// JSON threshold overrides file.
    pub thresholds_path: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::for_backend(BackendKind::default())
    }
}

impl Config {
    /// Defaults for a backend, with its conventional port.
    #[must_use]
    pub fn for_backend(backend: BackendKind) -> Self {
        Self {
            backend,
            host: DEFAULT_HOST.to_string(),
            port: backend.default_port(),
            password: None,
            duration_secs: DEFAULT_DURATION_SECS,
            operations: DEFAULT_OPERATIONS,
            output_format: OutputFormat::default(),
            output_path: None,
            thresholds_path: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// All variables are optional:
    /// - `HARNESS_BACKEND`: `redis` or `kafka` (default: `redis`)
    /// - `HARNESS_HOST`: backend host (default: `127.0.0.1`)
    /// - `HARNESS_PORT`: backend port (default: `6379` for redis, `9092` for kafka)
    /// - `HARNESS_PASSWORD`: backend password
    /// - `HARNESS_DURATION_SECS`: run duration (default: `60`)
    /// - `HARNESS_OPERATIONS`: operation budget (default: `1000`)
    /// - `HARNESS_OUTPUT_FORMAT`: `text`, `json` or `markdown` (default: `text`)
    /// - `HARNESS_OUTPUT_PATH`: report file
    /// - `HARNESS_THRESHOLDS_PATH`: JSON threshold overrides
    /// - `LOG_LEVEL`: logging level (default: `info`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a variable does not parse or
    /// a value fails validation (see [`validate_config`]).
    #[must_use = "configuration should be used"]
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let backend = match env_var("HARNESS_BACKEND") {
            Some(value) => value.parse()?,
            None => BackendKind::default(),
        };
        let defaults = Self::for_backend(backend);

        let port = match env_var("HARNESS_PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                var: "HARNESS_PORT".into(),
                reason: "must be an integer between 1 and 65535".into(),
            })?,
            None => defaults.port,
        };

        let output_format = match env_var("HARNESS_OUTPUT_FORMAT") {
            Some(value) => value.parse()?,
            None => defaults.output_format,
        };

        let config = Self {
            backend,
            host: env_var("HARNESS_HOST").unwrap_or(defaults.host),
            port,
            password: env_var("HARNESS_PASSWORD").map(SecretString::new),
            duration_secs: parse_env_u64("HARNESS_DURATION_SECS", DEFAULT_DURATION_SECS)?,
            operations: parse_env_u64("HARNESS_OPERATIONS", DEFAULT_OPERATIONS)?,
            output_format,
            output_path: env_var("HARNESS_OUTPUT_PATH").map(PathBuf::from),
            thresholds_path: env_var("HARNESS_THRESHOLDS_PATH").map(PathBuf::from),
            log_level: env_var("LOG_LEVEL").unwrap_or(defaults.log_level),
        };

        validate_config(&config)?;
        Ok(config)
    }

    /// `host:port` of the backend.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Run duration.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

/// Read a variable, treating empty values as unset.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an environment variable as u64, using a default if not set.
fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    env_var(name).map_or(Ok(default), |val| {
        val.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var: name.into(),
            reason: "must be a positive integer".into(),
        })
    })
}
