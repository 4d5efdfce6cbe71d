//! Error types for the stability harness.
//!
//! This module defines a hierarchical error system:
//! - [`AppError`]: Top-level application errors
//! - [`ClientError`]: Backend client failures (connection and per-operation)
//! - [`RunError`]: Workload driver errors that abort a run
//! - [`ThresholdError`]: Invalid threshold ladders
//! - [`ReportError`]: Report rendering and output errors
//! - [`ConfigError`]: Configuration errors
//!
//! All errors implement `Send + Sync` for async compatibility.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level application error.
///
/// This is the error type returned by the binary's command handlers.
/// It wraps all subsystem errors for unified error handling.
#[derive(Debug, Error)]
pub enum AppError {
    /// Workload run error.
    #[error("Run error: {0}")]
    Run(#[from] RunError),

    /// Threshold configuration error.
    #[error("Threshold error: {0}")]
    Threshold(#[from] ThresholdError),

    /// Report generation error.
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Classification of an operation failure, used as the error histogram key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Connectivity problems (refused, reset, unreachable).
    Network,
    /// The backend did not answer in time.
    Timeout,
    /// Credentials were rejected.
    Authentication,
    /// An acknowledged write could not be read back.
    DataLoss,
    /// The client does not implement the requested operation.
    Unsupported,
    /// Anything else reported by the backend.
    Other,
}

impl ErrorKind {
    /// Returns the snake-case name used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Authentication => "authentication",
            Self::DataLoss => "data_loss",
            Self::Unsupported => "unsupported",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend client errors.
///
/// Returned by [`BackendClient`](crate::traits::BackendClient) methods and
/// carried inside failed [`OperationResult`](crate::operation::OperationResult)s.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Establishing the connection failed.
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        /// Description of the connection failure.
        message: String,
    },

    /// An operation was issued before `connect` succeeded.
    #[error("Client is not connected")]
    NotConnected,

    /// The client does not implement this operation kind.
    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation {
        /// The operation kind that was rejected.
        operation: String,
    },

    /// The operation timed out.
    #[error("Operation timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Network communication error.
    #[error("Network error: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },

    /// Authentication was rejected by the backend.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Description of the rejection.
        message: String,
    },

    /// Backend-reported error that fits no other category.
    #[error("Backend error: {message}")]
    Backend {
        /// Description of the error.
        message: String,
    },
}

impl ClientError {
    /// Classify this error for the error-kind histogram.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ConnectionFailed { .. } | Self::NotConnected | Self::Network { .. } => {
                ErrorKind::Network
            }
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::UnsupportedOperation { .. } => ErrorKind::Unsupported,
            Self::Backend { .. } => ErrorKind::Other,
        }
    }
}

/// Errors that abort a workload run.
///
/// Individual operation failures never surface here; they are measurement data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunError {
    /// The initial connection could not be established.
    #[error("Could not connect to {backend} backend: {source}")]
    Connection {
        /// Backend kind that was targeted.
        backend: String,
        /// The underlying client error.
        #[source]
        source: ClientError,
    },

    /// The workload parameters cannot produce a run.
    #[error("Invalid workload: {reason}")]
    InvalidWorkload {
        /// Why the workload was rejected.
        reason: String,
    },
}

/// Threshold ladder errors.
///
/// Raised once when an evaluator is built, never while evaluating.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ThresholdError {
    /// Tiers are not strictly graduated in the expected direction.
    #[error("Thresholds for {metric} are not monotonic: {detail}")]
    NonMonotonic {
        /// Metric whose ladder is invalid.
        metric: String,
        /// Which tiers conflict.
        detail: String,
    },

    /// A tier value lies outside the metric's domain.
    #[error("Threshold {metric} out of range: {value}")]
    OutOfRange {
        /// Metric whose ladder is invalid.
        metric: String,
        /// The offending value.
        value: f64,
    },
}

/// Report rendering errors.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Writing to the output sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the structured report failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required configuration value is missing.
    #[error("Missing required: {var}")]
    MissingRequired {
        /// The missing variable name.
        var: String,
    },

    /// Configuration value is invalid.
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue {
        /// The variable name.
        var: String,
        /// Why the value is invalid.
        reason: String,
    },
}
