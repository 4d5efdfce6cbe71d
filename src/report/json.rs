//! Structured JSON report.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::io::Write;
use uuid::Uuid;

use super::{OutputFormat, Reporter};
use crate::error::ReportError;
use crate::evaluator::EvaluationResult;
use crate::metrics::StabilityMetrics;

/// Pretty-printed JSON report.
///
/// Sections: `test_info`, `evaluation`, `metrics`, `issues`,
/// `recommendations`. Each reporter carries a `run_id` so reports from one
/// run can be correlated with its logs.
#[derive(Debug, Clone, Copy)]
pub struct JsonReporter {
    run_id: Uuid,
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonReporter {
    /// Reporter with a fresh random run id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
        }
    }

    /// Reporter with a caller-chosen run id.
    #[must_use]
    pub const fn with_run_id(run_id: Uuid) -> Self {
        Self { run_id }
    }

    /// Run id embedded in `test_info`.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Build the report document.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Json`] if a section fails to serialize.
    pub fn document(
        &self,
        metrics: &StabilityMetrics,
        evaluation: &EvaluationResult,
    ) -> Result<Value, ReportError> {
        let mut metric_sections = Map::new();
        metric_sections.insert(
            "availability".into(),
            json!({
                "rate": metrics.availability,
                "total_operations": metrics.total_operations,
                "successful_operations": metrics.successful_operations,
                "failed_operations": metrics.failed_operations,
                "error_rate": metrics.error_rate,
            }),
        );
        metric_sections.insert(
            "performance".into(),
            json!({
                "p50_latency_ms": millis(metrics.p50_latency),
                "p95_latency_ms": millis(metrics.p95_latency),
                "p99_latency_ms": millis(metrics.p99_latency),
                "avg_latency_ms": millis(metrics.avg_latency),
                "min_latency_ms": millis(metrics.min_latency),
                "max_latency_ms": millis(metrics.max_latency),
                "throughput": metrics.throughput,
            }),
        );
        metric_sections.insert(
            "reliability".into(),
            json!({
                "data_loss_rate": metrics.data_loss_rate,
                "data_checks": metrics.data_checks,
                "errors_by_kind": to_value(&metrics.errors_by_kind)?,
            }),
        );
        if metrics.has_resilience_data() {
            metric_sections.insert(
                "resilience".into(),
                json!({
                    "mttr_seconds": metrics.mttr.as_secs_f64(),
                    "recoveries": metrics.recoveries,
                    "reconnect_attempts": metrics.reconnect_attempts,
                    "reconnect_success_rate": metrics.reconnect_success_rate,
                }),
            );
        }
        if metrics.cache_hit_rate.is_some() || metrics.message_lag.is_some() {
            let mut backend = Map::new();
            if let Some(rate) = metrics.cache_hit_rate {
                backend.insert("cache_hit_rate".into(), json!(rate));
            }
            if let Some(lag) = metrics.message_lag {
                backend.insert("message_lag".into(), json!(lag));
            }
            metric_sections.insert("backend".into(), Value::Object(backend));
        }

        Ok(json!({
            "test_info": {
                "run_id": self.run_id.to_string(),
                "duration_ms": millis(metrics.duration),
                "completed_at": evaluation.evaluated_at.to_rfc3339(),
            },
            "evaluation": {
                "score": evaluation.score,
                "grade": to_value(&evaluation.grade)?,
                "status": to_value(&evaluation.status)?,
                "scores": to_value(&evaluation.scores)?,
                "rationale": evaluation.rationale,
            },
            "metrics": Value::Object(metric_sections),
            "issues": to_value(&evaluation.issues)?,
            "recommendations": to_value(&evaluation.recommendations)?,
        }))
    }
}

impl Reporter for JsonReporter {
    fn generate_report(
        &self,
        metrics: &StabilityMetrics,
        evaluation: &EvaluationResult,
        out: &mut dyn Write,
    ) -> Result<(), ReportError> {
        let document = self.document(metrics, evaluation)?;
        serde_json::to_writer_pretty(&mut *out, &document)?;
        writeln!(out)?;
        Ok(())
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, ReportError> {
    Ok(serde_json::to_value(value)?)
}

fn millis(d: std::time::Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
