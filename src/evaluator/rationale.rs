//! Verdict summary text.

use std::fmt::Write as _;

use super::types::{DimensionScores, EvaluationResult, Status};

/// Render the rationale for a result. Only reads `score`, `grade`,
/// `scores`, `status` and the issue count.
#[must_use]
pub fn render(result: &EvaluationResult) -> String {
    let mut out = String::new();
    let scores = &result.scores;

    let _ = writeln!(out, "Overall score: {:.2}/100 ({})", result.score, result.grade);
    out.push('\n');
    out.push_str("Dimension scores:\n");
    let _ = writeln!(
        out,
        "- Availability: {:.2}/{} (weight 30%)",
        scores.availability,
        DimensionScores::AVAILABILITY_CAP
    );
    let _ = writeln!(
        out,
        "- Performance: {:.2}/{} (weight 25%)",
        scores.performance,
        DimensionScores::PERFORMANCE_CAP
    );
    let _ = writeln!(
        out,
        "- Reliability: {:.2}/{} (weight 25%)",
        scores.reliability,
        DimensionScores::RELIABILITY_CAP
    );
    let _ = writeln!(
        out,
        "- Resilience: {:.2}/{} (weight 20%)",
        scores.resilience,
        DimensionScores::RESILIENCE_CAP
    );
    out.push('\n');

    out.push_str(match result.status {
        Status::Pass => "PASS: stability meets expectations and is ready for production.\n",
        Status::Warning => {
            "WARNING: there are findings that need attention before deploying.\n"
        }
        Status::Fail => "FAIL: stability does not meet the minimum bar for production.\n",
    });

    match result.issues.len() {
        0 => {}
        1 => out.push_str("\n1 issue needs attention.\n"),
        n => {
            let _ = writeln!(out, "\n{n} issues need attention.");
        }
    }

    out
}
