//! Workload driver.
//!
//! Dispatches paired operations against a [`BackendClient`] at a fixed
//! cadence until the deadline passes, the operation budget runs out, or
//! shutdown is signalled. Every result is recorded into the
//! [`MetricsCollector`]; only a failed initial connect aborts the run.
//!
//! ```text
//! connect ──► ┌─ tick ─► execute ─► record ─┐ ──► fold client metrics ──► disconnect
//!             └──────────── loop ───────────┘
//! ```

use std::fmt;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use crate::backends::{BackendKind, DEFAULT_CONSUME_WAIT};
use crate::error::{ClientError, RunError};
use crate::metrics::{MetricsCollector, StabilityMetrics};
use crate::operation::{Operation, OperationResult, ReadOptions, WriteOptions};
use crate::traits::BackendClient;

/// Smallest dispatch interval; larger budgets are squeezed into this.
const MIN_INTERVAL: Duration = Duration::from_micros(1);

/// Workload parameters for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Selects the workload shape.
    pub backend: BackendKind,
    /// Run length.
    pub duration: Duration,
    /// Maximum number of operations to dispatch.
    pub operations: u64,
    /// Prefix of generated keys.
    pub key_prefix: String,
    /// Topic used by stream workloads.
    pub topic: String,
    /// Bounded wait applied to every consume.
    pub consume_wait: Duration,
}

impl DriverConfig {
    /// Config with default key prefix, topic and consume wait.
    #[must_use]
    pub fn new(backend: BackendKind, duration: Duration, operations: u64) -> Self {
        Self {
            backend,
            duration,
            operations,
            key_prefix: "stability-test:".to_string(),
            topic: "stability-test".to_string(),
            consume_wait: DEFAULT_CONSUME_WAIT,
        }
    }
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The run duration elapsed.
    Deadline,
    /// Every budgeted operation was dispatched.
    BudgetExhausted,
    /// Shutdown was signalled.
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Deadline => "deadline",
            Self::BudgetExhausted => "budget_exhausted",
            Self::Cancelled => "cancelled",
        })
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Why the loop ended.
    pub stop_reason: StopReason,
    /// Operations issued. One cut off at the deadline is recorded; one
    /// abandoned on shutdown is not.
    pub dispatched: u64,
    /// Wall time from connect to disconnect.
    pub elapsed: Duration,
    /// Collector snapshot taken after teardown.
    pub metrics: StabilityMetrics,
}

/// Last successful write awaiting its read-back.
struct PendingCheck {
    key: String,
    payload: Vec<u8>,
}

/// Fixed-cadence workload driver.
#[derive(Debug, Clone)]
pub struct WorkloadDriver {
    config: DriverConfig,
    interval: Duration,
}

impl WorkloadDriver {
    /// Create a driver.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::InvalidWorkload`] for a zero duration or budget.
    pub fn new(config: DriverConfig) -> Result<Self, RunError> {
        if config.duration.is_zero() {
            return Err(RunError::InvalidWorkload {
                reason: "duration must be greater than zero".to_string(),
            });
        }
        if config.operations == 0 {
            return Err(RunError::InvalidWorkload {
                reason: "operation budget must be greater than zero".to_string(),
            });
        }

        let nanos = config.duration.as_nanos() / u128::from(config.operations);
        let interval = Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
            .max(MIN_INTERVAL);

        Ok(Self { config, interval })
    }

    /// Dispatch interval, `duration / operations` clamped to at least 1µs.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Workload parameters.
    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Run the workload to completion.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Connection`] if the initial connect fails; nothing
    /// is dispatched in that case. Operation failures are recorded, never
    /// returned.
    pub async fn run(
        &self,
        client: &dyn BackendClient,
        collector: &MetricsCollector,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<RunSummary, RunError> {
        let started = Instant::now();
        let connected = client.connect().await;
        collector.record_connection_attempt(connected.is_ok(), started.elapsed());

        if let Err(source) = connected {
            tracing::error!(
                backend = %self.config.backend,
                error = %source,
                "Initial connection failed, aborting run"
            );
            self.disconnect(client).await;
            return Err(RunError::Connection {
                backend: self.config.backend.to_string(),
                source,
            });
        }

        tracing::info!(
            backend = %self.config.backend,
            operations = self.config.operations,
            duration_secs = self.config.duration.as_secs_f64(),
            interval_us = u64::try_from(self.interval.as_micros()).unwrap_or(u64::MAX),
            "Workload started"
        );

        let deadline = started + self.config.duration;
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut dispatched = 0u64;
        let mut pending: Option<PendingCheck> = None;

        let stop_reason = loop {
            if dispatched >= self.config.operations {
                break StopReason::BudgetExhausted;
            }

            tokio::select! {
                biased;
                () = shutdown_requested(&mut shutdown) => break StopReason::Cancelled,
                () = tokio::time::sleep_until(deadline) => break StopReason::Deadline,
                _ = interval.tick() => {}
            }

            let operation = self.operation_at(dispatched);
            dispatched += 1;

            let op_started = Instant::now();
            let outcome = tokio::select! {
                biased;
                () = shutdown_requested(&mut shutdown) => {
                    tracing::debug!(kind = %operation.kind(), "In-flight operation abandoned on shutdown");
                    break StopReason::Cancelled;
                }
                () = tokio::time::sleep_until(deadline) => None,
                outcome = client.execute(&operation) => Some(outcome),
            };

            let Some(outcome) = outcome else {
                tracing::debug!(kind = %operation.kind(), "In-flight operation cut off at deadline");
                let result = self.cut_off(&operation, op_started.elapsed());
                self.record(client, collector, &operation, &result, &mut pending)
                    .await;
                break StopReason::Deadline;
            };

            let result = outcome
                .unwrap_or_else(|err| OperationResult::failure(err, op_started.elapsed()));
            self.record(client, collector, &operation, &result, &mut pending)
                .await;
        };

        collector.record_client_metrics(&client.client_metrics());
        self.disconnect(client).await;

        let elapsed = started.elapsed();
        let metrics = collector.snapshot();
        tracing::info!(
            backend = %self.config.backend,
            stop_reason = %stop_reason,
            dispatched,
            availability = metrics.availability,
            "Workload finished"
        );

        Ok(RunSummary {
            stop_reason,
            dispatched,
            elapsed,
            metrics,
        })
    }

    /// The `index`th operation: even indices write or produce, odd indices
    /// read or consume what the previous one wrote.
    fn operation_at(&self, index: u64) -> Operation {
        let pair = index / 2;
        let key = format!("{}{pair}", self.config.key_prefix);
        let is_write = index % 2 == 0;

        match (self.config.backend, is_write) {
            (BackendKind::Redis, true) => Operation::write(key, payload(pair)),
            (BackendKind::Redis, false) => Operation::read(key),
            (BackendKind::Kafka, true) => Operation::write(key, payload(pair))
                .with_write_options(WriteOptions::default().topic(self.config.topic.clone())),
            (BackendKind::Kafka, false) => Operation::read(key).with_read_options(
                ReadOptions::default()
                    .topic(self.config.topic.clone())
                    .max_wait(self.config.consume_wait),
            ),
        }
    }

    /// Result for an operation still running when the deadline fires. A
    /// consume that saw nothing before the cut-off is an empty poll; anything
    /// else timed out.
    fn cut_off(&self, operation: &Operation, elapsed: Duration) -> OperationResult {
        match (self.config.backend, operation) {
            (BackendKind::Kafka, Operation::Read { options, .. }) => {
                let mut result =
                    OperationResult::success(elapsed).with_metadata("no_message", true);
                if let Some(topic) = &options.topic {
                    result = result.with_metadata("topic", topic.as_str());
                }
                result
            }
            _ => OperationResult::failure(
                ClientError::Timeout {
                    timeout_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                },
                elapsed,
            ),
        }
    }

    async fn record(
        &self,
        client: &dyn BackendClient,
        collector: &MetricsCollector,
        operation: &Operation,
        result: &OperationResult,
        pending: &mut Option<PendingCheck>,
    ) {
        collector.record_operation(result);

        if let Some(err) = result.error() {
            collector.record_error(err, err.kind());
            tracing::debug!(
                kind = %operation.kind(),
                key = operation.key(),
                error = %err,
                "Operation failed"
            );
            if matches!(err, ClientError::NotConnected) {
                self.reconnect(client, collector).await;
            }
        }

        if self.config.backend != BackendKind::Redis {
            return;
        }
        match operation {
            Operation::Write { key, value, .. } => {
                *pending = result.is_success().then(|| PendingCheck {
                    key: key.clone(),
                    payload: value.clone(),
                });
            }
            Operation::Read { key, .. } => {
                if let Some(check) = pending.take().filter(|c| &c.key == key) {
                    if result.is_success() {
                        let intact = result.data.as_deref() == Some(check.payload.as_slice());
                        if !intact {
                            tracing::debug!(key = %key, "Read-back does not match written payload");
                        }
                        collector.record_data_check(intact);
                    }
                }
            }
            Operation::Delete { .. } | Operation::Custom { .. } => {}
        }
    }

    async fn reconnect(&self, client: &dyn BackendClient, collector: &MetricsCollector) {
        let started = Instant::now();
        let outcome = client.connect().await;
        collector.record_reconnect_attempt(outcome.is_ok(), started.elapsed());
        match outcome {
            Ok(()) => tracing::info!(backend = %self.config.backend, "Reconnected"),
            Err(err) => tracing::warn!(
                backend = %self.config.backend,
                error = %err,
                "Reconnect failed"
            ),
        }
    }

    async fn disconnect(&self, client: &dyn BackendClient) {
        if let Err(err) = client.disconnect().await {
            tracing::warn!(
                backend = %self.config.backend,
                error = %err,
                "Disconnect failed"
            );
        }
    }
}

fn payload(pair: u64) -> Vec<u8> {
    format!("payload-{pair}").into_bytes()
}

/// Resolves once the watch value is `true`. A dropped sender never resolves.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
