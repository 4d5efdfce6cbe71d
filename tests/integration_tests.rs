//! Integration tests for the stability harness.
//!
//! These tests drive full runs against the simulated backends:
//! - Healthy key-value and stream workloads
//! - Fault injection (failed operations, lost writes)
//! - Connection failures and cancellation
//! - Threshold overrides and report output

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::sync::watch;

use stability_harness::backends::{
    simulated_client, BackendKind, SimulatedBroker, SimulatedKvStore, SimulationProfile,
};
use stability_harness::config::{load_threshold_overrides, SecretString};
use stability_harness::driver::{DriverConfig, RunSummary, StopReason, WorkloadDriver};
use stability_harness::error::{ClientError, ErrorKind, RunError, ThresholdError};
use stability_harness::evaluator::{
    EvaluationResult, Grade, IssueType, Severity, StabilityEvaluator, Status, ThresholdOverrides,
};
use stability_harness::metrics::MetricsCollector;
use stability_harness::report::{reporter_for, write_report_file, JsonReporter, OutputFormat};
use stability_harness::traits::BackendClient;

// ============================================================================
// Test Utilities
// ============================================================================

const OPERATIONS: u64 = 200;

fn driver(backend: BackendKind) -> WorkloadDriver {
    WorkloadDriver::new(DriverConfig::new(
        backend,
        Duration::from_secs(10),
        OPERATIONS,
    ))
    .expect("valid workload")
}

/// A shutdown receiver whose sender is kept alive but never used.
fn no_shutdown() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

async fn run_against(
    backend: BackendKind,
    client: &dyn BackendClient,
) -> Result<RunSummary, RunError> {
    let (_tx, rx) = no_shutdown();
    let collector = MetricsCollector::new();
    driver(backend).run(client, &collector, rx).await
}

fn evaluate(backend: BackendKind, summary: &RunSummary) -> EvaluationResult {
    StabilityEvaluator::for_backend(backend, &ThresholdOverrides::default())
        .expect("presets are valid")
        .evaluate_for(backend, &summary.metrics)
}

// ============================================================================
// Healthy Runs
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_healthy_kv_run_passes() {
    let store = SimulatedKvStore::new("127.0.0.1:6379", SimulationProfile::default(), None);

    let summary = run_against(BackendKind::Redis, &store).await.unwrap();
    let evaluation = evaluate(BackendKind::Redis, &summary);

    assert_eq!(summary.stop_reason, StopReason::BudgetExhausted);
    assert_eq!(summary.dispatched, OPERATIONS);

    let m = &summary.metrics;
    assert_eq!(m.total_operations, OPERATIONS);
    assert_eq!(m.failed_operations, 0);
    assert_eq!(m.data_checks, OPERATIONS / 2);
    assert!(m.data_loss_rate.abs() < f64::EPSILON);
    assert_eq!(m.cache_hit_rate, Some(1.0));
    assert_eq!(m.connection_attempts, 1);

    assert_eq!(evaluation.status, Status::Pass);
    assert_eq!(evaluation.grade, Grade::Excellent);
    assert!(evaluation.issues.is_empty());
    assert_eq!(store.len(), usize::try_from(OPERATIONS / 2).unwrap());
    assert_eq!(store.client_metrics().active_connections, 0);
}

#[tokio::test(start_paused = true)]
async fn test_healthy_stream_run_has_no_lag() {
    let broker = SimulatedBroker::new("127.0.0.1:9092", SimulationProfile::default(), None);

    let summary = run_against(BackendKind::Kafka, &broker).await.unwrap();
    let evaluation = evaluate(BackendKind::Kafka, &summary);

    assert_eq!(summary.metrics.total_operations, OPERATIONS);
    assert_eq!(summary.metrics.message_lag, Some(0));
    assert_eq!(summary.metrics.data_checks, 0);
    assert_eq!(evaluation.status, Status::Pass);
    assert!(!evaluation
        .issues
        .iter()
        .any(|i| i.issue_type == IssueType::HighMessageLag));
}

#[tokio::test(start_paused = true)]
async fn test_factory_client_runs_both_flavors() {
    for backend in [BackendKind::Redis, BackendKind::Kafka] {
        let client: Arc<dyn BackendClient> = simulated_client(
            backend,
            format!("127.0.0.1:{}", backend.default_port()),
            SimulationProfile::default(),
            None,
        );
        let summary = run_against(backend, client.as_ref()).await.unwrap();
        assert_eq!(summary.metrics.successful_operations, OPERATIONS, "{backend}");
    }
}

// ============================================================================
// Fault Injection
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_injected_faults_fail_the_run() {
    let profile = SimulationProfile::default().with_fail_every(10);
    let store = SimulatedKvStore::new("127.0.0.1:6379", profile, None);

    let summary = run_against(BackendKind::Redis, &store).await.unwrap();
    let evaluation = evaluate(BackendKind::Redis, &summary);

    let m = &summary.metrics;
    assert_eq!(m.total_operations, m.successful_operations + m.failed_operations);
    assert_eq!(m.failed_operations, OPERATIONS / 10);
    assert_eq!(m.errors_by_kind.get(&ErrorKind::Network), Some(&(OPERATIONS / 10)));
    assert!((m.availability - 0.9).abs() < 1e-9);

    assert_eq!(evaluation.status, Status::Fail);
    assert_eq!(evaluation.status.exit_code(), 1);
    assert!(evaluation
        .issues
        .iter()
        .any(|i| i.issue_type == IssueType::LowAvailability && i.severity == Severity::Critical));
}

#[tokio::test(start_paused = true)]
async fn test_dropped_writes_are_detected_as_data_loss() {
    let profile = SimulationProfile::default().with_drop_every(5);
    let store = SimulatedKvStore::new("127.0.0.1:6379", profile, None);

    let summary = run_against(BackendKind::Redis, &store).await.unwrap();
    let evaluation = evaluate(BackendKind::Redis, &summary);

    let m = &summary.metrics;
    assert_eq!(m.failed_operations, 0);
    assert_eq!(m.data_checks, OPERATIONS / 2);
    assert!((m.data_loss_rate - 0.2).abs() < 1e-9);
    assert_eq!(m.errors_by_kind.get(&ErrorKind::DataLoss), Some(&20));
    assert_eq!(m.cache_hit_rate, Some(0.8));

    assert_eq!(evaluation.status, Status::Fail);
    assert!(evaluation
        .issues
        .iter()
        .any(|i| i.issue_type == IssueType::DataLossDetected));
    assert!(evaluation
        .recommendations
        .iter()
        .any(|r| r.title.to_lowercase().contains("cache")));
}

#[tokio::test(start_paused = true)]
async fn test_latency_is_measured() {
    let profile = SimulationProfile::default().with_latency(Duration::from_millis(20));
    let store = SimulatedKvStore::new("127.0.0.1:6379", profile, None);

    let summary = run_against(BackendKind::Redis, &store).await.unwrap();

    let m = &summary.metrics;
    assert!(m.min_latency >= Duration::from_millis(20));
    assert!(m.min_latency <= m.p50_latency);
    assert!(m.p50_latency <= m.p95_latency);
    assert!(m.p95_latency <= m.p99_latency);
    assert!(m.p99_latency <= m.max_latency);
}

// ============================================================================
// Connection Failures and Cancellation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_refused_connection_aborts_run() {
    let profile = SimulationProfile::default().refusing_connections();
    let store = SimulatedKvStore::new("127.0.0.1:6379", profile, None);
    let collector = MetricsCollector::new();
    let (_tx, rx) = no_shutdown();

    let err = driver(BackendKind::Redis)
        .run(&store, &collector, rx)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RunError::Connection {
            source: ClientError::ConnectionFailed { .. },
            ..
        }
    ));
    let m = collector.snapshot();
    assert_eq!(m.total_operations, 0);
    assert_eq!(m.connection_attempts, 1);
    assert_eq!(m.successful_connections, 0);
}

#[tokio::test(start_paused = true)]
async fn test_wrong_password_is_an_authentication_failure() {
    let profile = SimulationProfile::default().with_required_password("correct");
    let broker = SimulatedBroker::new(
        "127.0.0.1:9092",
        profile,
        Some(SecretString::new("wrong")),
    );

    let err = run_against(BackendKind::Kafka, &broker).await.unwrap_err();

    let RunError::Connection { backend, source } = err else {
        unreachable!("expected a connection error");
    };
    assert_eq!(backend, "kafka");
    assert_eq!(source.kind(), ErrorKind::Authentication);
    assert!(!source.to_string().contains("wrong"));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_and_disconnects() {
    let store = Arc::new(SimulatedKvStore::new(
        "127.0.0.1:6379",
        SimulationProfile::default(),
        None,
    ));
    let collector = MetricsCollector::new();
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        tx.send(true).unwrap();
    });

    let summary = driver(BackendKind::Redis)
        .run(store.as_ref(), &collector, rx)
        .await
        .unwrap();

    assert_eq!(summary.stop_reason, StopReason::Cancelled);
    assert!(summary.metrics.total_operations > 0);
    assert!(summary.metrics.total_operations < OPERATIONS);
    assert_eq!(store.client_metrics().active_connections, 0);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_stops_slow_backend() {
    let profile = SimulationProfile::default().with_latency(Duration::from_millis(500));
    let store = SimulatedKvStore::new("127.0.0.1:6379", profile, None);

    let summary = run_against(BackendKind::Redis, &store).await.unwrap();

    assert_eq!(summary.stop_reason, StopReason::Deadline);
    assert!(summary.metrics.total_operations < OPERATIONS);
    assert!(summary.elapsed >= Duration::from_secs(10));
    assert_eq!(summary.metrics.total_operations, summary.dispatched);
}

#[tokio::test(start_paused = true)]
async fn test_every_dispatched_operation_is_recorded() {
    let profile = SimulationProfile::default().with_latency(Duration::from_millis(700));
    let store = SimulatedKvStore::new("127.0.0.1:6379", profile, None);
    let driver =
        WorkloadDriver::new(DriverConfig::new(BackendKind::Redis, Duration::from_secs(1), 2))
            .unwrap();

    let (_tx, rx) = no_shutdown();
    let summary = driver
        .run(&store, &MetricsCollector::new(), rx)
        .await
        .unwrap();

    assert_eq!(summary.stop_reason, StopReason::Deadline);
    assert_eq!(summary.metrics.total_operations, summary.dispatched);
    assert!(summary.metrics.errors_by_kind.get(&ErrorKind::Timeout).is_some());
}

// ============================================================================
// Thresholds
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_tightened_thresholds_flag_latency() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("thresholds.json");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        r#"{{ "p95_latency_ms": {{ "excellent": 1, "good": 2, "fair": 5, "pass": 10 }} }}"#
    )
    .unwrap();
    drop(file);

    let overrides = load_threshold_overrides(&path).unwrap();
    let evaluator = StabilityEvaluator::for_backend(BackendKind::Redis, &overrides).unwrap();

    let profile = SimulationProfile::default().with_latency(Duration::from_millis(20));
    let store = SimulatedKvStore::new("127.0.0.1:6379", profile, None);
    let summary = run_against(BackendKind::Redis, &store).await.unwrap();
    let evaluation = evaluator.evaluate_for(BackendKind::Redis, &summary.metrics);

    let p95 = evaluation
        .issues
        .iter()
        .find(|i| i.metric == "p95_latency")
        .expect("p95 issue");
    assert_eq!(p95.severity, Severity::High);
    assert_ne!(evaluation.status, Status::Pass);
}

#[test]
fn test_non_monotonic_override_rejected() {
    let overrides: ThresholdOverrides =
        serde_json::from_str(r#"{ "p95_latency_ms": { "pass": 10 } }"#).unwrap();

    let err = StabilityEvaluator::with_overrides(&overrides).unwrap_err();

    assert!(matches!(err, ThresholdError::NonMonotonic { .. }));
}

// ============================================================================
// Reports
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_reports_for_a_finished_run() {
    let profile = SimulationProfile::default().with_fail_every(25);
    let store = SimulatedKvStore::new("127.0.0.1:6379", profile, None);
    let summary = run_against(BackendKind::Redis, &store).await.unwrap();
    let evaluation = evaluate(BackendKind::Redis, &summary);

    for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Markdown] {
        let mut out = Vec::new();
        reporter_for(format)
            .generate_report(&summary.metrics, &evaluation, &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(&evaluation.status.to_string()), "{format}");
    }

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.json");
    let reporter = JsonReporter::new();
    write_report_file(&reporter, &summary.metrics, &evaluation, &path).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["test_info"]["run_id"], reporter.run_id().to_string());
    assert_eq!(
        value["metrics"]["availability"]["total_operations"],
        summary.metrics.total_operations
    );
    assert_eq!(
        value["metrics"]["reliability"]["errors_by_kind"]["network"],
        OPERATIONS / 25
    );
}
