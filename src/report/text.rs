//! Console report.

use std::fmt::Write as _;
use std::io::Write;

use super::{check, human_duration, share, status_marker, OutputFormat, Reporter};
use crate::error::ReportError;
use crate::evaluator::{DimensionScores, EvaluationResult};
use crate::metrics::StabilityMetrics;

const RULE: &str = "------------------------------------------";
const BANNER: &str = "==========================================";

/// Plain-text report for terminals.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReporter;

impl TextReporter {
    fn render(metrics: &StabilityMetrics, evaluation: &EvaluationResult) -> String {
        let mut s = String::new();

        let _ = writeln!(s, "{BANNER}");
        let _ = writeln!(s, "   Stability Test Report");
        let _ = writeln!(s, "{BANNER}\n");
        let _ = writeln!(s, "Duration:  {}", human_duration(metrics.duration));
        let _ = writeln!(
            s,
            "Completed: {}\n",
            evaluation.evaluated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        let _ = writeln!(s, "{RULE}");
        let _ = writeln!(
            s,
            "  Overall score: {:.1}/100 ({}) {}",
            evaluation.score,
            evaluation.grade,
            status_marker(evaluation.status)
        );
        let _ = writeln!(s, "{RULE}\n");

        let scores = &evaluation.scores;
        let _ = writeln!(s, "Dimension scores:");
        for (label, score, cap, weight) in [
            ("Availability", scores.availability, DimensionScores::AVAILABILITY_CAP, 30),
            ("Performance", scores.performance, DimensionScores::PERFORMANCE_CAP, 25),
            ("Reliability", scores.reliability, DimensionScores::RELIABILITY_CAP, 25),
            ("Resilience", scores.resilience, DimensionScores::RESILIENCE_CAP, 20),
        ] {
            let pct = share(score, cap);
            let _ = writeln!(
                s,
                "  [{}] {label:<13}{score:>5.1}/{cap:<3} ({pct:.1}%)  weight {weight}%",
                check(pct >= 70.0)
            );
        }
        s.push('\n');

        Self::core_metrics(&mut s, metrics);
        Self::issues(&mut s, evaluation);
        Self::recommendations(&mut s, evaluation);

        let _ = writeln!(s, "{RULE}");
        let _ = writeln!(s, "  Conclusion");
        let _ = writeln!(s, "{RULE}");
        s.push_str(&evaluation.rationale);
        let _ = writeln!(s, "{BANNER}");
        s
    }

    fn core_metrics(s: &mut String, m: &StabilityMetrics) {
        let _ = writeln!(s, "{RULE}");
        let _ = writeln!(s, "  Core metrics");
        let _ = writeln!(s, "{RULE}");

        let _ = writeln!(
            s,
            "Availability: {:.2}% [{}]",
            m.availability * 100.0,
            check(m.availability >= 0.95)
        );
        let _ = writeln!(s, "  - Total operations:      {}", m.total_operations);
        let _ = writeln!(s, "  - Successful operations: {}", m.successful_operations);
        let _ = writeln!(s, "  - Failed operations:     {}", m.failed_operations);
        let _ = writeln!(s, "  - Error rate:            {:.2}%\n", m.error_rate * 100.0);

        let _ = writeln!(s, "Performance:");
        let _ = writeln!(s, "  - P50 latency: {}", human_duration(m.p50_latency));
        let _ = writeln!(s, "  - P95 latency: {}", human_duration(m.p95_latency));
        let _ = writeln!(s, "  - P99 latency: {}", human_duration(m.p99_latency));
        let _ = writeln!(
            s,
            "  - Min/avg/max: {} / {} / {}",
            human_duration(m.min_latency),
            human_duration(m.avg_latency),
            human_duration(m.max_latency)
        );
        let _ = writeln!(s, "  - Throughput:  {:.0} ops/s\n", m.throughput);

        let _ = writeln!(s, "Reliability:");
        let _ = writeln!(
            s,
            "  - Data loss rate: {:.4}% [{}] ({} checks)",
            m.data_loss_rate * 100.0,
            check(m.data_loss_rate <= 0.0),
            m.data_checks
        );
        for (kind, count) in &m.errors_by_kind {
            let _ = writeln!(s, "  - {kind} errors: {count}");
        }

        if m.has_resilience_data() {
            let _ = writeln!(s, "\nResilience:");
            let _ = writeln!(
                s,
                "  - MTTR: {} over {} recoveries",
                human_duration(m.mttr),
                m.recoveries
            );
            let _ = writeln!(
                s,
                "  - Reconnect success rate: {:.0}% [{}]",
                m.reconnect_success_rate * 100.0,
                check(m.reconnect_success_rate >= 0.95)
            );
        }

        if m.cache_hit_rate.is_some() || m.message_lag.is_some() {
            let _ = writeln!(s, "\nBackend:");
            if let Some(rate) = m.cache_hit_rate {
                let _ = writeln!(s, "  - Cache hit rate: {:.2}%", rate * 100.0);
            }
            if let Some(lag) = m.message_lag {
                let _ = writeln!(s, "  - Message lag: {lag}");
            }
        }
        s.push('\n');
    }

    fn issues(s: &mut String, evaluation: &EvaluationResult) {
        if evaluation.issues.is_empty() {
            return;
        }
        let _ = writeln!(s, "{RULE}");
        let _ = writeln!(s, "  Issues ({})", evaluation.issues.len());
        let _ = writeln!(s, "{RULE}");
        for issue in &evaluation.issues {
            let _ = writeln!(s, "[{}] {}", issue.severity, issue.issue_type);
            let _ = writeln!(s, "  Metric:   {}", issue.metric);
            let _ = writeln!(s, "  Current:  {:.2}", issue.current);
            let _ = writeln!(s, "  Expected: {:.2}", issue.expected);
            let _ = writeln!(s, "  {}\n", issue.message);
        }
    }

    fn recommendations(s: &mut String, evaluation: &EvaluationResult) {
        if evaluation.recommendations.is_empty() {
            return;
        }
        let _ = writeln!(s, "{RULE}");
        let _ = writeln!(s, "  Recommendations (by priority)");
        let _ = writeln!(s, "{RULE}\n");
        for rec in &evaluation.recommendations {
            let _ = writeln!(s, "[{}] {}", rec.priority, rec.title);
            let _ = writeln!(s, "Category: {}", rec.category);
            if !rec.message.is_empty() {
                let _ = writeln!(s, "{}", rec.message);
            }
            for (i, action) in rec.actions.iter().enumerate() {
                let _ = writeln!(s, "  {}. {action}", i + 1);
            }
            if !rec.references.is_empty() {
                let _ = writeln!(s, "References:");
                for reference in &rec.references {
                    let _ = writeln!(s, "  - {reference}");
                }
            }
            s.push('\n');
        }
    }
}

impl Reporter for TextReporter {
    fn generate_report(
        &self,
        metrics: &StabilityMetrics,
        evaluation: &EvaluationResult,
        out: &mut dyn Write,
    ) -> Result<(), ReportError> {
        out.write_all(Self::render(metrics, evaluation).as_bytes())?;
        Ok(())
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Text
    }
}
