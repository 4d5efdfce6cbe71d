//! Trait definitions for mockable dependencies.
//!
//! This module defines:
//! - [`BackendClient`]: the capability contract a backend adapter implements
//! - [`ClientMetrics`]: client-level connection counters and backend gauges
//!
//! # Mocking
//!
//! [`BackendClient`] is annotated with `#[cfg_attr(test, mockall::automock)]`
//! which generates `MockBackendClient` for unit tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::operation::{Operation, OperationResult};

/// Connection counters and backend gauges reported by a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientMetrics {
    /// Connections currently open.
    pub active_connections: u64,
    /// Every connect attempt, successful or not.
    pub total_connection_attempts: u64,
    /// Connect attempts that failed.
    pub failed_connection_attempts: u64,
    /// Read hit ratio for cache-like backends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_hit_rate: Option<f64>,
    /// Messages produced but not yet consumed, for stream backends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_lag: Option<u64>,
}

/// Minimal capability contract consumed by the workload driver.
///
/// Implementations own their connection and must make `connect` and
/// `disconnect` idempotent: the driver calls `disconnect` unconditionally
/// from its cleanup path.
///
/// An operation that reaches the backend and fails is reported as a failed
/// [`OperationResult`] inside `Ok`. `Err` is reserved for failures that
/// prevent producing a result at all; the driver records both the same way.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Open the connection.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the backend is unreachable or rejects
    /// the credentials.
    async fn connect(&self) -> Result<(), ClientError>;

    /// Close the connection. Calling it on a closed client is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the backend reports a shutdown failure.
    async fn disconnect(&self) -> Result<(), ClientError>;

    /// Execute one operation and time it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when no result could be produced.
    async fn execute(&self, operation: &Operation) -> Result<OperationResult, ClientError>;

    /// Probe the backend.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the backend is unhealthy or unreachable.
    async fn health_check(&self) -> Result<(), ClientError>;

    /// Snapshot of the client's counters.
    fn client_metrics(&self) -> ClientMetrics;
}
