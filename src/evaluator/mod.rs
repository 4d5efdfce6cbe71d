//! Stability evaluation.
//!
//! This module converts a [`StabilityMetrics`] snapshot into an
//! [`EvaluationResult`]:
//! - four capped dimension scores (availability 30, performance 25,
//!   reliability 25, resilience 20) summed into the aggregate score
//! - a grade and a status, where issue severity dominates the score
//! - canned recommendations, ordered and deduplicated
//! - a deterministic rationale
//!
//! # Example
//!
//! ```
//! use stability_harness::evaluator::{Grade, StabilityEvaluator, Status};
//! use stability_harness::metrics::StabilityMetrics;
//! use std::time::Duration;
//!
//! let evaluator = StabilityEvaluator::default();
//! let metrics = StabilityMetrics {
//!     availability: 1.0,
//!     p95_latency: Duration::from_millis(10),
//!     p99_latency: Duration::from_millis(10),
//!     mttr: Duration::from_secs(5),
//!     reconnect_success_rate: 0.99,
//!     ..StabilityMetrics::default()
//! };
//!
//! let result = evaluator.evaluate(&metrics);
//! assert_eq!(result.grade, Grade::Excellent);
//! assert_eq!(result.status, Status::Pass);
//! assert!(result.issues.is_empty());
//! ```

mod rationale;
mod recommendations;
mod thresholds;
mod types;

pub use thresholds::{Ladder, LadderOverride, OverrideValue, ThresholdOverrides, Thresholds, Tier};
pub use types::{
    Category, DimensionScores, EvaluationResult, Grade, Issue, IssueType, Priority,
    Recommendation, Severity, Status,
};

use chrono::Utc;
use std::time::Duration;

use crate::backends::BackendKind;
use crate::error::ThresholdError;
use crate::metrics::StabilityMetrics;

// ============================================================================
// Score tables: [excellent, good, fair, pass, breach]
// ============================================================================

const AVAILABILITY_SCORES: [f64; 4] = [30.0, 27.0, 24.0, 20.0];
const P95_SCORES: [f64; 5] = [15.0, 13.5, 12.0, 10.0, 8.0];
const P99_SCORES: [f64; 5] = [10.0, 9.0, 8.0, 6.5, 5.0];
const ERROR_RATE_SCORES: [f64; 5] = [15.0, 13.5, 12.0, 10.0, 7.0];
const MTTR_SCORES: [f64; 5] = [12.0, 10.5, 9.0, 7.0, 5.0];

/// Below this hit rate a key-value evaluation suggests cache tuning.
pub const CACHE_HIT_RATE_TARGET: f64 = 0.90;

/// Above this many unconsumed messages a stream evaluation raises an issue.
pub const MESSAGE_LAG_LIMIT: u64 = 1000;

/// Expected reconnect success rate, in percent, reported on breach.
const RECONNECT_EXPECTED_PCT: f64 = 95.0;

/// Multi-dimensional stability evaluator.
///
/// Stateless across calls; thresholds are validated once at construction.
#[derive(Debug, Clone, Default)]
pub struct StabilityEvaluator {
    thresholds: Thresholds,
}

impl StabilityEvaluator {
    /// Create an evaluator with a complete threshold table.
    ///
    /// # Errors
    ///
    /// Returns [`ThresholdError`] if any ladder is mis-ordered or out of range.
    pub fn new(thresholds: Thresholds) -> Result<Self, ThresholdError> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    /// Create an evaluator from overrides merged over the default table.
    ///
    /// # Errors
    ///
    /// Returns [`ThresholdError`] if the merged table is invalid.
    pub fn with_overrides(overrides: &ThresholdOverrides) -> Result<Self, ThresholdError> {
        Self::new(Thresholds::default().merge(overrides))
    }

    /// Create an evaluator with the preset for a backend kind, with
    /// overrides merged on top.
    ///
    /// # Errors
    ///
    /// Returns [`ThresholdError`] if the merged table is invalid.
    pub fn for_backend(
        kind: BackendKind,
        overrides: &ThresholdOverrides,
    ) -> Result<Self, ThresholdError> {
        Self::new(Self::preset(kind).merge(overrides))
    }

    /// Default threshold table.
    #[must_use]
    pub fn default_thresholds() -> Thresholds {
        Thresholds::default()
    }

    /// Threshold preset for a backend kind.
    #[must_use]
    pub fn preset(kind: BackendKind) -> Thresholds {
        match kind {
            BackendKind::Redis => Thresholds::default(),
            BackendKind::Kafka => Thresholds::stream(),
        }
    }

    /// Active thresholds.
    #[must_use]
    pub const fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Replace the thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`ThresholdError`] and keeps the previous table if the new
    /// one is invalid.
    pub fn set_thresholds(&mut self, thresholds: Thresholds) -> Result<(), ThresholdError> {
        thresholds.validate()?;
        self.thresholds = thresholds;
        Ok(())
    }

    /// Evaluate a snapshot. Never fails; degenerate inputs are defaulted.
    #[must_use]
    pub fn evaluate(&self, metrics: &StabilityMetrics) -> EvaluationResult {
        let mut issues = Vec::new();

        let scores = DimensionScores {
            availability: self.score_availability(metrics, &mut issues),
            performance: self.score_performance(metrics, &mut issues),
            reliability: self.score_reliability(metrics, &mut issues),
            resilience: self.score_resilience(metrics, &mut issues),
        };

        let mut result = EvaluationResult {
            score: scores.total(),
            grade: Grade::Failed,
            status: Status::Fail,
            scores,
            recommendations: recommendations::synthesize(&issues),
            issues,
            rationale: String::new(),
            evaluated_at: Utc::now(),
        };
        result.grade = Grade::from_score(result.score);
        refresh_verdict(&mut result);

        tracing::debug!(
            score = result.score,
            grade = %result.grade,
            status = %result.status,
            issues = result.issues.len(),
            "Evaluation complete"
        );
        result
    }

    /// Generic evaluation plus a cache-hit-rate recommendation when the
    /// reported hit rate is in `(0, 0.90)`.
    #[must_use]
    pub fn evaluate_redis(&self, metrics: &StabilityMetrics) -> EvaluationResult {
        let mut result = self.evaluate(metrics);

        if let Some(hit_rate) = metrics.cache_hit_rate {
            if hit_rate > 0.0 && hit_rate < CACHE_HIT_RATE_TARGET {
                let mut recs = std::mem::take(&mut result.recommendations);
                recs.push(recommendations::cache_hit_rate(hit_rate));
                result.recommendations = recommendations::finalize(recs);
            }
        }
        result
    }

    /// Generic evaluation plus a MEDIUM issue when message lag exceeds
    /// [`MESSAGE_LAG_LIMIT`].
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn evaluate_kafka(&self, metrics: &StabilityMetrics) -> EvaluationResult {
        let mut result = self.evaluate(metrics);

        if let Some(lag) = metrics.message_lag.filter(|lag| *lag > MESSAGE_LAG_LIMIT) {
            result.issues.push(Issue {
                issue_type: IssueType::HighMessageLag,
                severity: Severity::Medium,
                metric: "message_lag".to_string(),
                current: lag as f64,
                expected: MESSAGE_LAG_LIMIT as f64,
                message: format!("Message backlog too large: {lag} unconsumed messages"),
            });
            result.recommendations = recommendations::synthesize(&result.issues);
            refresh_verdict(&mut result);
        }
        result
    }

    /// Evaluate with the flavor matching the backend kind.
    #[must_use]
    pub fn evaluate_for(&self, kind: BackendKind, metrics: &StabilityMetrics) -> EvaluationResult {
        match kind {
            BackendKind::Redis => self.evaluate_redis(metrics),
            BackendKind::Kafka => self.evaluate_kafka(metrics),
        }
    }

    // ========================================================================
    // Dimension scorers
    // ========================================================================

    fn score_availability(&self, metrics: &StabilityMetrics, issues: &mut Vec<Issue>) -> f64 {
        let availability = sanitize_ratio(metrics.availability, 0.0);
        let ladder = &self.thresholds.availability;

        let score = match ladder.band_higher_is_better(availability) {
            Tier::Excellent => AVAILABILITY_SCORES[0],
            Tier::Good => AVAILABILITY_SCORES[1],
            Tier::Fair => AVAILABILITY_SCORES[2],
            Tier::Pass => AVAILABILITY_SCORES[3],
            Tier::Breach => {
                issues.push(Issue {
                    issue_type: IssueType::LowAvailability,
                    severity: Severity::Critical,
                    metric: "availability".to_string(),
                    current: availability * 100.0,
                    expected: ladder.pass * 100.0,
                    message: format!(
                        "Availability {:.2}% is below the required {:.2}%",
                        availability * 100.0,
                        ladder.pass * 100.0
                    ),
                });
                availability * 100.0 * 0.2
            }
        };
        score.clamp(0.0, DimensionScores::AVAILABILITY_CAP)
    }

    fn score_performance(&self, metrics: &StabilityMetrics, issues: &mut Vec<Issue>) -> f64 {
        let p95 = metrics.p95_latency;
        let p95_ladder = &self.thresholds.p95_latency;
        let p95_tier = p95_ladder.band_lower_is_better(p95);
        if p95_tier == Tier::Breach {
            issues.push(latency_issue(
                IssueType::HighP95Latency,
                Severity::High,
                "p95_latency",
                "P95",
                p95,
                p95_ladder.pass,
            ));
        }

        let p99 = metrics.p99_latency;
        let p99_ladder = &self.thresholds.p99_latency;
        let p99_tier = p99_ladder.band_lower_is_better(p99);
        if p99_tier == Tier::Breach {
            issues.push(latency_issue(
                IssueType::HighP99Latency,
                Severity::Medium,
                "p99_latency",
                "P99",
                p99,
                p99_ladder.pass,
            ));
        }

        (p95_tier.score(&P95_SCORES) + p99_tier.score(&P99_SCORES))
            .clamp(0.0, DimensionScores::PERFORMANCE_CAP)
    }

    fn score_reliability(&self, metrics: &StabilityMetrics, issues: &mut Vec<Issue>) -> f64 {
        let error_rate = sanitize_ratio(metrics.error_rate, 1.0);
        let ladder = &self.thresholds.error_rate;
        let tier = ladder.band_lower_is_better(error_rate);
        if tier == Tier::Breach {
            issues.push(Issue {
                issue_type: IssueType::HighErrorRate,
                severity: Severity::High,
                metric: "error_rate".to_string(),
                current: error_rate * 100.0,
                expected: ladder.pass * 100.0,
                message: format!(
                    "Error rate {:.4}% exceeds the threshold of {:.2}%",
                    error_rate * 100.0,
                    ladder.pass * 100.0
                ),
            });
        }
        let error_score = tier.score(&ERROR_RATE_SCORES);

        let loss_rate = sanitize_ratio(metrics.data_loss_rate, 1.0);
        let loss_score = if loss_rate <= 0.0 {
            10.0
        } else if loss_rate < 0.0001 {
            8.0
        } else if loss_rate < 0.001 {
            6.0
        } else {
            issues.push(Issue {
                issue_type: IssueType::DataLossDetected,
                severity: Severity::Critical,
                metric: "data_loss_rate".to_string(),
                current: loss_rate * 100.0,
                expected: 0.0,
                message: format!("Data loss detected, loss rate {:.4}%", loss_rate * 100.0),
            });
            3.0
        };

        (error_score + loss_score).clamp(0.0, DimensionScores::RELIABILITY_CAP)
    }

    fn score_resilience(&self, metrics: &StabilityMetrics, issues: &mut Vec<Issue>) -> f64 {
        let mttr = metrics.mttr;
        let ladder = &self.thresholds.mttr;
        let tier = ladder.band_lower_is_better(mttr);
        if tier == Tier::Breach {
            issues.push(Issue {
                issue_type: IssueType::SlowRecovery,
                severity: Severity::Medium,
                metric: "mttr".to_string(),
                current: mttr.as_secs_f64(),
                expected: ladder.pass.as_secs_f64(),
                message: format!(
                    "Mean time to recovery {}s exceeds the threshold of {}s",
                    mttr.as_secs(),
                    ladder.pass.as_secs()
                ),
            });
        }
        let mttr_score = tier.score(&MTTR_SCORES);

        let reconnect = sanitize_ratio(metrics.reconnect_success_rate, 0.0);
        let reconnect_score = if reconnect >= 0.99 {
            8.0
        } else if reconnect >= 0.95 {
            7.0
        } else if reconnect >= 0.90 {
            6.0
        } else {
            issues.push(Issue {
                issue_type: IssueType::LowReconnectRate,
                severity: Severity::Medium,
                metric: "reconnect_success_rate".to_string(),
                current: reconnect * 100.0,
                expected: RECONNECT_EXPECTED_PCT,
                message: format!(
                    "Reconnect success rate {:.2}% is below expectations",
                    reconnect * 100.0
                ),
            });
            4.0
        };

        (mttr_score + reconnect_score).clamp(0.0, DimensionScores::RESILIENCE_CAP)
    }
}

/// Status in strict priority order: critical issue, low score, high issue,
/// middling score, pass.
#[must_use]
pub fn determine_status(score: f64, issues: &[Issue]) -> Status {
    let has = |severity: Severity| issues.iter().any(|i| i.severity == severity);
    if has(Severity::Critical) || score < 70.0 {
        Status::Fail
    } else if has(Severity::High) || score < 85.0 {
        Status::Warning
    } else {
        Status::Pass
    }
}

fn refresh_verdict(result: &mut EvaluationResult) {
    result.status = determine_status(result.score, &result.issues);
    result.rationale = rationale::render(result);
}

fn latency_issue(
    issue_type: IssueType,
    severity: Severity,
    metric: &str,
    label: &str,
    observed: Duration,
    limit: Duration,
) -> Issue {
    Issue {
        issue_type,
        severity,
        metric: metric.to_string(),
        current: observed.as_secs_f64() * 1000.0,
        expected: limit.as_secs_f64() * 1000.0,
        message: format!(
            "{label} latency {}ms exceeds the threshold of {}ms",
            observed.as_millis(),
            limit.as_millis()
        ),
    }
}

/// Clamp a ratio into `[0, 1]`, replacing NaN and infinities with `worst`.
fn sanitize_ratio(value: f64, worst: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        worst
    }
}
