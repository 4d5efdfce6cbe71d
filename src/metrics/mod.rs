//! Metrics collection.
//!
//! This module provides:
//! - [`MetricsCollector`]: a thread-safe recorder for operation outcomes,
//!   connection events, error kinds and read-back checks
//! - [`StabilityMetrics`]: the immutable summary derived from it
//!
//! # Example
//!
//! ```
//! use stability_harness::metrics::MetricsCollector;
//! use stability_harness::operation::OperationResult;
//! use std::time::Duration;
//!
//! let collector = MetricsCollector::new();
//! collector.record_operation(&OperationResult::success(Duration::from_millis(5)));
//! collector.record_operation(&OperationResult::success(Duration::from_millis(7)));
//!
//! let metrics = collector.snapshot();
//! assert_eq!(metrics.total_operations, 2);
//! assert!((metrics.availability - 1.0).abs() < f64::EPSILON);
//! // No reconnects were needed, which counts as full success
//! assert!((metrics.reconnect_success_rate - 1.0).abs() < f64::EPSILON);
//! ```

// Allow intentional numeric casts for metrics calculations
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

mod snapshot;

pub use snapshot::StabilityMetrics;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::time::Instant;

use crate::error::ErrorKind;
use crate::operation::OperationResult;
use crate::traits::ClientMetrics;

/// Mutable per-run state, guarded as a whole so snapshots never tear.
#[derive(Debug)]
struct CollectorState {
    started_at: Instant,
    started_at_wall: DateTime<Utc>,

    total: u64,
    successful: u64,
    failed: u64,
    latencies: Vec<Duration>,

    connection_attempts: u64,
    successful_connections: u64,
    reconnect_attempts: u64,
    successful_reconnects: u64,

    errors: BTreeMap<ErrorKind, u64>,

    data_checks: u64,
    data_lost: u64,

    failure_started: Option<DateTime<Utc>>,
    recovery_times: Vec<Duration>,

    cache_hit_rate: Option<f64>,
    message_lag: Option<u64>,
}

impl CollectorState {
    fn new() -> Self {
        Self {
            started_at: Instant::now(),
            started_at_wall: Utc::now(),
            total: 0,
            successful: 0,
            failed: 0,
            latencies: Vec::new(),
            connection_attempts: 0,
            successful_connections: 0,
            reconnect_attempts: 0,
            successful_reconnects: 0,
            errors: BTreeMap::new(),
            data_checks: 0,
            data_lost: 0,
            failure_started: None,
            recovery_times: Vec::new(),
            cache_hit_rate: None,
            message_lag: None,
        }
    }

    fn derive(&self) -> StabilityMetrics {
        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();

        let elapsed = self.started_at.elapsed();
        let elapsed_secs = elapsed.as_secs_f64();

        StabilityMetrics {
            total_operations: self.total,
            successful_operations: self.successful,
            failed_operations: self.failed,
            availability: ratio(self.successful, self.total, 0.0),
            error_rate: ratio(self.failed, self.total, 0.0),
            connection_attempts: self.connection_attempts,
            successful_connections: self.successful_connections,
            connection_success_rate: ratio(
                self.successful_connections,
                self.connection_attempts,
                1.0,
            ),
            reconnect_attempts: self.reconnect_attempts,
            successful_reconnects: self.successful_reconnects,
            reconnect_success_rate: ratio(self.successful_reconnects, self.reconnect_attempts, 1.0),
            p50_latency: percentile(&sorted, 0.50),
            p95_latency: percentile(&sorted, 0.95),
            p99_latency: percentile(&sorted, 0.99),
            avg_latency: mean(&self.latencies),
            min_latency: sorted.first().copied().unwrap_or_default(),
            max_latency: sorted.last().copied().unwrap_or_default(),
            throughput: if elapsed_secs > 0.0 {
                self.total as f64 / elapsed_secs
            } else {
                0.0
            },
            data_checks: self.data_checks,
            data_loss_rate: ratio(self.data_lost, self.data_checks, 0.0),
            mttr: mean(&self.recovery_times),
            recoveries: self.recovery_times.len() as u64,
            errors_by_kind: self.errors.clone(),
            cache_hit_rate: self.cache_hit_rate,
            message_lag: self.message_lag,
            start_time: self.started_at_wall,
            end_time: Utc::now(),
            duration: elapsed,
        }
    }
}

/// Thread-safe metrics collector.
///
/// One collector is created per run. Every recording call takes the write
/// lock for a single append or increment; [`snapshot`](Self::snapshot)
/// derives the whole summary under the read lock.
#[derive(Debug)]
pub struct MetricsCollector {
    state: RwLock<CollectorState>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    /// Create a collector; the measurement window starts now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CollectorState::new()),
        }
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CollectorState> {
        self.state.write().unwrap_or_else(|poison_error| {
            tracing::warn!(
                error = %poison_error,
                "Writing metrics through poisoned lock, using recovered data"
            );
            poison_error.into_inner()
        })
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CollectorState> {
        self.state.read().unwrap_or_else(|poison_error| {
            tracing::warn!(
                error = %poison_error,
                "Reading metrics from poisoned lock, using recovered data"
            );
            poison_error.into_inner()
        })
    }

    /// Record the outcome of one operation.
    ///
    /// Also tracks failure windows: the first failure after a success opens
    /// a window, the next success closes it and contributes to MTTR.
    pub fn record_operation(&self, result: &OperationResult) {
        let mut state = self.write_state();
        state.total += 1;
        state.latencies.push(result.duration);

        if result.is_success() {
            state.successful += 1;
            if let Some(started) = state.failure_started.take() {
                let recovery = (result.completed_at - started)
                    .to_std()
                    .unwrap_or_default();
                state.recovery_times.push(recovery);
            }
        } else {
            state.failed += 1;
            if state.failure_started.is_none() {
                state.failure_started = Some(result.completed_at);
            }
        }
    }

    /// Record an initial connection attempt.
    pub fn record_connection_attempt(&self, success: bool, duration: Duration) {
        {
            let mut state = self.write_state();
            state.connection_attempts += 1;
            if success {
                state.successful_connections += 1;
            }
        }
        tracing::debug!(
            success,
            duration_ms = duration.as_millis() as u64,
            "Connection attempt recorded"
        );
    }

    /// Record a reconnect attempt after a lost connection.
    pub fn record_reconnect_attempt(&self, success: bool, duration: Duration) {
        {
            let mut state = self.write_state();
            state.reconnect_attempts += 1;
            if success {
                state.successful_reconnects += 1;
            }
        }
        tracing::debug!(
            success,
            duration_ms = duration.as_millis() as u64,
            "Reconnect attempt recorded"
        );
    }

    /// Count one failure of the given kind.
    pub fn record_error(&self, error: &dyn std::fmt::Display, kind: ErrorKind) {
        *self.write_state().errors.entry(kind).or_insert(0) += 1;
        tracing::debug!(kind = %kind, error = %error, "Operation error recorded");
    }

    /// Record a read-back verification. A lost write also counts as a
    /// [`ErrorKind::DataLoss`] error.
    pub fn record_data_check(&self, intact: bool) {
        let mut state = self.write_state();
        state.data_checks += 1;
        if !intact {
            state.data_lost += 1;
            *state.errors.entry(ErrorKind::DataLoss).or_insert(0) += 1;
        }
    }

    /// Store the backend gauges reported by a client. Absent gauges keep
    /// their previous value.
    pub fn record_client_metrics(&self, metrics: &ClientMetrics) {
        let mut state = self.write_state();
        if metrics.cache_hit_rate.is_some() {
            state.cache_hit_rate = metrics.cache_hit_rate;
        }
        if metrics.message_lag.is_some() {
            state.message_lag = metrics.message_lag;
        }
    }

    /// Derive an owned summary of everything recorded so far.
    ///
    /// Never fails; an empty collector yields zeroed rates and latencies.
    #[must_use]
    pub fn snapshot(&self) -> StabilityMetrics {
        self.read_state().derive()
    }

    /// Clear all state and restart the measurement window.
    pub fn reset(&self) {
        *self.write_state() = CollectorState::new();
    }
}

/// Zero-guarded ratio; `empty` is returned when `whole` is zero.
fn ratio(part: u64, whole: u64, empty: f64) -> f64 {
    if whole == 0 {
        empty
    } else {
        part as f64 / whole as f64
    }
}

/// Sample at rank `floor(n * fraction)` of an ascending slice.
fn percentile(sorted: &[Duration], fraction: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let rank = ((sorted.len() as f64) * fraction).floor() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

fn mean(samples: &[Duration]) -> Duration {
    if samples.is_empty() {
        return Duration::ZERO;
    }
    let total: u128 = samples.iter().map(Duration::as_nanos).sum();
    let avg = total / samples.len() as u128;
    Duration::from_nanos(u64::try_from(avg).unwrap_or(u64::MAX))
}
