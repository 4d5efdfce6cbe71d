//! Evaluation result types.
//!
//! All enums serialize in `SCREAMING_SNAKE_CASE` so structured reports read
//! `"status": "WARNING"`, `"severity": "CRITICAL"` and so on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Severity
// ============================================================================

/// Severity of a detected issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Severity {
    /// Informational.
    Low = 0,
    /// Worth tuning, does not affect status on its own.
    Medium = 1,
    /// Forces at least a warning.
    High = 2,
    /// Forces a failure.
    Critical = 3,
}

impl Severity {
    /// Uppercase label used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Issues
// ============================================================================

/// Kind of finding raised by a dimension scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    /// Availability fell below the pass tier.
    LowAvailability,
    /// P95 latency breached the pass tier.
    HighP95Latency,
    /// P99 latency breached the pass tier.
    HighP99Latency,
    /// Error rate breached the pass tier.
    HighErrorRate,
    /// Read-back verification found lost writes.
    DataLossDetected,
    /// MTTR breached the pass tier.
    SlowRecovery,
    /// Reconnect success rate under 90%.
    LowReconnectRate,
    /// Stream consumer lag above the limit.
    HighMessageLag,
}

impl IssueType {
    /// Snake-case identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LowAvailability => "low_availability",
            Self::HighP95Latency => "high_p95_latency",
            Self::HighP99Latency => "high_p99_latency",
            Self::HighErrorRate => "high_error_rate",
            Self::DataLossDetected => "data_loss_detected",
            Self::SlowRecovery => "slow_recovery",
            Self::LowReconnectRate => "low_reconnect_rate",
            Self::HighMessageLag => "high_message_lag",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// What was found.
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    /// How bad it is.
    pub severity: Severity,
    /// Metric name, e.g. `p95_latency`.
    pub metric: String,
    /// Observed value, in the metric's display unit.
    pub current: f64,
    /// Limit that was crossed, in the same unit.
    pub expected: f64,
    /// Human-readable explanation.
    pub message: String,
}

// ============================================================================
// Recommendations
// ============================================================================

/// Recommendation priority. Ordering is `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Nice to have.
    Low,
    /// Should be scheduled.
    Medium,
    /// Address before production.
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        })
    }
}

/// Area a recommendation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Client or server settings.
    Configuration,
    /// Capacity and topology.
    Scaling,
    /// Tuning of hot paths.
    Optimization,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Configuration => "CONFIGURATION",
            Self::Scaling => "SCALING",
            Self::Optimization => "OPTIMIZATION",
        })
    }
}

/// Actionable advice attached to an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Priority used for ordering.
    pub priority: Priority,
    /// Area of the change.
    pub category: Category,
    /// Short title; unique within one evaluation.
    pub title: String,
    /// One-sentence context.
    pub message: String,
    /// Ordered steps.
    pub actions: Vec<String>,
    /// Further reading.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

// ============================================================================
// Verdict
// ============================================================================

/// Letter-style grade derived from the aggregate score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Grade {
    /// Score of 90 or more.
    Excellent,
    /// Score of 80 or more.
    Good,
    /// Score of 70 or more.
    Fair,
    /// Score of 60 or more.
    Poor,
    /// Anything lower.
    Failed,
}

impl Grade {
    /// Map an aggregate score onto a grade.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Self::Excellent,
            s if s >= 80.0 => Self::Good,
            s if s >= 70.0 => Self::Fair,
            s if s >= 60.0 => Self::Poor,
            _ => Self::Failed,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Fair => "FAIR",
            Self::Poor => "POOR",
            Self::Failed => "FAILED",
        })
    }
}

/// Overall verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Stable enough for production.
    Pass,
    /// Usable, with findings to address.
    Warning,
    /// Does not meet the minimum bar.
    Fail,
}

impl Status {
    /// Process exit code for this verdict: Pass 0, Fail 1, Warning 2.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Pass => 0,
            Self::Fail => 1,
            Self::Warning => 2,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pass => "PASS",
            Self::Warning => "WARNING",
            Self::Fail => "FAIL",
        })
    }
}

/// Per-dimension sub-scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionScores {
    /// Out of 30.
    pub availability: f64,
    /// Out of 25.
    pub performance: f64,
    /// Out of 25.
    pub reliability: f64,
    /// Out of 20.
    pub resilience: f64,
}

impl DimensionScores {
    /// Cap of the availability dimension.
    pub const AVAILABILITY_CAP: f64 = 30.0;
    /// Cap of the performance dimension.
    pub const PERFORMANCE_CAP: f64 = 25.0;
    /// Cap of the reliability dimension.
    pub const RELIABILITY_CAP: f64 = 25.0;
    /// Cap of the resilience dimension.
    pub const RESILIENCE_CAP: f64 = 20.0;

    /// Unweighted sum of the four sub-scores.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.availability + self.performance + self.reliability + self.resilience
    }
}

/// Complete output of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Aggregate score, 0 to 100.
    pub score: f64,
    /// Grade derived from the score.
    pub grade: Grade,
    /// Verdict derived from issues and score.
    pub status: Status,
    /// Sub-scores that add up to `score`.
    pub scores: DimensionScores,
    /// Findings in detection order.
    pub issues: Vec<Issue>,
    /// Advice ordered High, Medium, Low with unique titles.
    pub recommendations: Vec<Recommendation>,
    /// Multi-line summary of the verdict.
    pub rationale: String,
    /// When the evaluation ran.
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluationResult {
    /// True if any issue has the given severity.
    #[must_use]
    pub fn has_severity(&self, severity: Severity) -> bool {
        self.issues.iter().any(|issue| issue.severity == severity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(100.0, Grade::Excellent)]
    #[test_case(90.0, Grade::Excellent)]
    #[test_case(89.99, Grade::Good)]
    #[test_case(80.0, Grade::Good)]
    #[test_case(70.0, Grade::Fair)]
    #[test_case(60.0, Grade::Poor)]
    #[test_case(59.9, Grade::Failed)]
    #[test_case(0.0, Grade::Failed)]
    fn test_grade_from_score(score: f64, expected: Grade) {
        assert_eq!(Grade::from_score(score), expected);
    }

    #[test]
    fn test_status_exit_codes() {
        assert_eq!(Status::Pass.exit_code(), 0);
        assert_eq!(Status::Fail.exit_code(), 1);
        assert_eq!(Status::Warning.exit_code(), 2);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert!(Severity::Critical > Severity::High);
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(serde_json::to_string(&Status::Warning).unwrap(), "\"WARNING\"");
        assert_eq!(serde_json::to_string(&Grade::Fair).unwrap(), "\"FAIR\"");
        assert_eq!(
            serde_json::to_string(&IssueType::HighP95Latency).unwrap(),
            "\"high_p95_latency\""
        );
        assert_eq!(
            serde_json::to_string(&Category::Optimization).unwrap(),
            "\"OPTIMIZATION\""
        );
    }

    #[test]
    fn test_issue_serializes_type_field() {
        let issue = Issue {
            issue_type: IssueType::SlowRecovery,
            severity: Severity::Medium,
            metric: "mttr".into(),
            current: 400.0,
            expected: 300.0,
            message: "slow".into(),
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["type"], "slow_recovery");
        assert_eq!(json["severity"], "MEDIUM");
    }
}
