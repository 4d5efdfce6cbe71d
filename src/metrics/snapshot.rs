//! Immutable metrics snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::ErrorKind;
use crate::operation::duration_ms;

/// Point-in-time statistical summary of a run.
///
/// Produced by [`MetricsCollector::snapshot`](super::MetricsCollector::snapshot).
/// Every field is owned; nothing is shared with the collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityMetrics {
    // Operation counts
    /// Operations recorded.
    pub total_operations: u64,
    /// Operations that succeeded.
    pub successful_operations: u64,
    /// Operations that failed.
    pub failed_operations: u64,
    /// `successful / total`, zero when nothing was recorded.
    pub availability: f64,
    /// `failed / total`, zero when nothing was recorded.
    pub error_rate: f64,

    // Connections
    /// Initial connection attempts.
    pub connection_attempts: u64,
    /// Initial connection attempts that succeeded.
    pub successful_connections: u64,
    /// Success ratio of connection attempts; 1.0 when none were made.
    pub connection_success_rate: f64,
    /// Reconnect attempts.
    pub reconnect_attempts: u64,
    /// Reconnect attempts that succeeded.
    pub successful_reconnects: u64,
    /// Success ratio of reconnects; 1.0 when none were needed.
    pub reconnect_success_rate: f64,

    // Latency
    /// Median latency.
    #[serde(rename = "p50_latency_ms", with = "duration_ms")]
    pub p50_latency: Duration,
    /// 95th percentile latency.
    #[serde(rename = "p95_latency_ms", with = "duration_ms")]
    pub p95_latency: Duration,
    /// 99th percentile latency.
    #[serde(rename = "p99_latency_ms", with = "duration_ms")]
    pub p99_latency: Duration,
    /// Arithmetic mean latency.
    #[serde(rename = "avg_latency_ms", with = "duration_ms")]
    pub avg_latency: Duration,
    /// Fastest operation.
    #[serde(rename = "min_latency_ms", with = "duration_ms")]
    pub min_latency: Duration,
    /// Slowest operation.
    #[serde(rename = "max_latency_ms", with = "duration_ms")]
    pub max_latency: Duration,
    /// Operations per second over the measurement window.
    pub throughput: f64,

    // Reliability and recovery
    /// Read-back verifications performed.
    pub data_checks: u64,
    /// Fraction of verifications that found the data missing or altered.
    pub data_loss_rate: f64,
    /// Mean time from first failure to the next success.
    #[serde(rename = "mttr_ms", with = "duration_ms")]
    pub mttr: Duration,
    /// Number of completed recoveries behind [`Self::mttr`].
    pub recoveries: u64,
    /// Failure count per error kind.
    pub errors_by_kind: BTreeMap<ErrorKind, u64>,

    // Backend gauges
    /// Cache hit ratio reported by key-value clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_hit_rate: Option<f64>,
    /// Unconsumed messages reported by stream clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_lag: Option<u64>,

    // Window
    /// Start of the measurement window.
    pub start_time: DateTime<Utc>,
    /// When the snapshot was taken.
    pub end_time: DateTime<Utc>,
    /// Length of the measurement window.
    #[serde(rename = "duration_ms", with = "duration_ms")]
    pub duration: Duration,
}

impl Default for StabilityMetrics {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            total_operations: 0,
            successful_operations: 0,
            failed_operations: 0,
            availability: 0.0,
            error_rate: 0.0,
            connection_attempts: 0,
            successful_connections: 0,
            connection_success_rate: 1.0,
            reconnect_attempts: 0,
            successful_reconnects: 0,
            reconnect_success_rate: 1.0,
            p50_latency: Duration::ZERO,
            p95_latency: Duration::ZERO,
            p99_latency: Duration::ZERO,
            avg_latency: Duration::ZERO,
            min_latency: Duration::ZERO,
            max_latency: Duration::ZERO,
            throughput: 0.0,
            data_checks: 0,
            data_loss_rate: 0.0,
            mttr: Duration::ZERO,
            recoveries: 0,
            errors_by_kind: BTreeMap::new(),
            cache_hit_rate: None,
            message_lag: None,
            start_time: now,
            end_time: now,
            duration: Duration::ZERO,
        }
    }
}

impl StabilityMetrics {
    /// Total failures across all error kinds.
    #[must_use]
    pub fn total_errors(&self) -> u64 {
        self.errors_by_kind.values().sum()
    }

    /// True when the resilience section has anything to show.
    #[must_use]
    pub fn has_resilience_data(&self) -> bool {
        self.mttr > Duration::ZERO || self.reconnect_attempts > 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_treats_absent_reconnects_as_success() {
        let metrics = StabilityMetrics::default();
        assert!((metrics.reconnect_success_rate - 1.0).abs() < f64::EPSILON);
        assert!((metrics.connection_success_rate - 1.0).abs() < f64::EPSILON);
        assert!(metrics.availability.abs() < f64::EPSILON);
        assert!(!metrics.has_resilience_data());
    }

    #[test]
    fn test_serializes_latencies_in_millis() {
        let metrics = StabilityMetrics {
            p95_latency: Duration::from_millis(42),
            mttr: Duration::from_secs(3),
            ..StabilityMetrics::default()
        };
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["p95_latency_ms"], 42);
        assert_eq!(json["mttr_ms"], 3000);
        assert!(json.get("message_lag").is_none());
    }

    #[test]
    fn test_total_errors_sums_histogram() {
        let mut metrics = StabilityMetrics::default();
        metrics.errors_by_kind.insert(ErrorKind::Network, 3);
        metrics.errors_by_kind.insert(ErrorKind::Timeout, 2);
        assert_eq!(metrics.total_errors(), 5);
    }
}
