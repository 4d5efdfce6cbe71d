//! Test utilities and mock factories.
//!
//! This module provides shared testing infrastructure:
//! - Mock [`BackendClient`](crate::traits::BackendClient) factories
//! - Metrics and evaluation fixtures
//!
//! Only compiled for tests (`#[cfg(test)]`).

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::evaluator::{EvaluationResult, StabilityEvaluator};
use crate::metrics::StabilityMetrics;
use crate::operation::{Operation, OperationResult};
use crate::traits::{ClientMetrics, MockBackendClient};

/// Create a mock client whose connect and disconnect succeed.
///
/// Disconnect is expected exactly once. No `execute` expectation is set;
/// add one with [`ok_result`] or [`with_memory_store`].
///
/// # Example
///
/// ```ignore
/// let mut client = connected_mock();
/// client.expect_execute().returning(|op| Ok(ok_result(op)));
/// ```
#[must_use]
pub fn connected_mock() -> MockBackendClient {
    let mut mock = MockBackendClient::new();
    mock.expect_connect().returning(|| Ok(()));
    mock.expect_disconnect().times(1).returning(|| Ok(()));
    mock.expect_health_check().returning(|| Ok(()));
    mock.expect_client_metrics().returning(|| ClientMetrics {
        active_connections: 1,
        total_connection_attempts: 1,
        ..ClientMetrics::default()
    });
    mock
}

/// A successful 1ms result carrying no data.
#[must_use]
pub fn ok_result(_operation: &Operation) -> OperationResult {
    OperationResult::success(Duration::from_millis(1))
}

/// Make `execute` behave like a key-value store: writes are kept, reads
/// return what was written.
pub fn with_memory_store(mock: &mut MockBackendClient) {
    let store: Mutex<HashMap<String, Vec<u8>>> = Mutex::new(HashMap::new());
    mock.expect_execute().returning(move |op| {
        let mut store = store.lock().unwrap();
        let result = OperationResult::success(Duration::from_millis(1));
        Ok(match op {
            Operation::Write { key, value, .. } => {
                store.insert(key.clone(), value.clone());
                result
            }
            Operation::Read { key, .. } => match store.get(key) {
                Some(value) => result.with_data(value.clone()),
                None => result,
            },
            Operation::Delete { key } => {
                store.remove(key);
                result
            }
            Operation::Custom { .. } => result,
        })
    });
}

/// Metrics that score a perfect 100.
#[must_use]
pub fn healthy_metrics() -> StabilityMetrics {
    StabilityMetrics {
        total_operations: 1000,
        successful_operations: 1000,
        availability: 1.0,
        p50_latency: Duration::from_millis(2),
        p95_latency: Duration::from_millis(8),
        p99_latency: Duration::from_millis(10),
        avg_latency: Duration::from_millis(3),
        min_latency: Duration::from_millis(1),
        max_latency: Duration::from_millis(12),
        throughput: 100.0,
        mttr: Duration::from_secs(5),
        reconnect_attempts: 100,
        successful_reconnects: 99,
        reconnect_success_rate: 0.99,
        connection_attempts: 1,
        successful_connections: 1,
        duration: Duration::from_secs(10),
        ..StabilityMetrics::default()
    }
}

/// Metrics that fail every dimension.
#[must_use]
pub fn failing_metrics() -> StabilityMetrics {
    StabilityMetrics {
        total_operations: 1000,
        successful_operations: 500,
        failed_operations: 500,
        availability: 0.5,
        error_rate: 0.5,
        p95_latency: Duration::from_secs(1),
        p99_latency: Duration::from_secs(2),
        data_checks: 100,
        data_loss_rate: 0.1,
        mttr: Duration::from_secs(900),
        reconnect_attempts: 10,
        successful_reconnects: 5,
        reconnect_success_rate: 0.5,
        duration: Duration::from_secs(10),
        ..StabilityMetrics::default()
    }
}

/// Evaluate with default thresholds.
#[must_use]
pub fn evaluate(metrics: &StabilityMetrics) -> EvaluationResult {
    StabilityEvaluator::default().evaluate(metrics)
}
