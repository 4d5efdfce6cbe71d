//! Markdown report.

use std::fmt::Write as _;
use std::io::Write;

use super::{human_duration, share, status_marker, OutputFormat, Reporter};
use crate::error::ReportError;
use crate::evaluator::{DimensionScores, EvaluationResult};
use crate::metrics::StabilityMetrics;

/// Markdown document with the same content as the text report.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownReporter;

impl MarkdownReporter {
    fn render(m: &StabilityMetrics, evaluation: &EvaluationResult) -> String {
        let mut s = String::new();

        s.push_str("# Stability Test Report\n\n");
        s.push_str("## Test information\n\n");
        let _ = writeln!(s, "- **Duration**: {}", human_duration(m.duration));
        let _ = writeln!(
            s,
            "- **Completed**: {}\n",
            evaluation.evaluated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        s.push_str("## Overall score\n\n");
        let _ = writeln!(
            s,
            "**{:.1}/100** ({}) {}\n",
            evaluation.score,
            evaluation.grade,
            status_marker(evaluation.status)
        );

        let scores = &evaluation.scores;
        s.push_str("### Dimension scores\n\n");
        s.push_str("| Dimension | Score | Share | Weight |\n");
        s.push_str("|-----------|-------|-------|--------|\n");
        for (label, score, cap, weight) in [
            ("Availability", scores.availability, DimensionScores::AVAILABILITY_CAP, 30),
            ("Performance", scores.performance, DimensionScores::PERFORMANCE_CAP, 25),
            ("Reliability", scores.reliability, DimensionScores::RELIABILITY_CAP, 25),
            ("Resilience", scores.resilience, DimensionScores::RESILIENCE_CAP, 20),
        ] {
            let _ = writeln!(
                s,
                "| {label} | {score:.1}/{cap} | {:.1}% | {weight}% |",
                share(score, cap)
            );
        }
        s.push('\n');

        s.push_str("## Core metrics\n\n");
        s.push_str("### Availability\n\n");
        let _ = writeln!(s, "- **Availability**: {:.2}%", m.availability * 100.0);
        let _ = writeln!(s, "- **Total operations**: {}", m.total_operations);
        let _ = writeln!(s, "- **Successful operations**: {}", m.successful_operations);
        let _ = writeln!(s, "- **Failed operations**: {}", m.failed_operations);
        let _ = writeln!(s, "- **Error rate**: {:.2}%\n", m.error_rate * 100.0);

        s.push_str("### Performance\n\n");
        let _ = writeln!(s, "- **P50 latency**: {}", human_duration(m.p50_latency));
        let _ = writeln!(s, "- **P95 latency**: {}", human_duration(m.p95_latency));
        let _ = writeln!(s, "- **P99 latency**: {}", human_duration(m.p99_latency));
        let _ = writeln!(s, "- **Throughput**: {:.0} ops/s\n", m.throughput);

        s.push_str("### Reliability\n\n");
        let _ = writeln!(s, "- **Data loss rate**: {:.4}%", m.data_loss_rate * 100.0);
        let _ = writeln!(s, "- **Data checks**: {}\n", m.data_checks);

        if m.has_resilience_data() {
            s.push_str("### Resilience\n\n");
            let _ = writeln!(s, "- **MTTR**: {}", human_duration(m.mttr));
            let _ = writeln!(
                s,
                "- **Reconnect success rate**: {:.0}%\n",
                m.reconnect_success_rate * 100.0
            );
        }

        if m.cache_hit_rate.is_some() || m.message_lag.is_some() {
            s.push_str("### Backend\n\n");
            if let Some(rate) = m.cache_hit_rate {
                let _ = writeln!(s, "- **Cache hit rate**: {:.2}%", rate * 100.0);
            }
            if let Some(lag) = m.message_lag {
                let _ = writeln!(s, "- **Message lag**: {lag}");
            }
            s.push('\n');
        }

        if !evaluation.issues.is_empty() {
            let _ = writeln!(s, "## Issues ({})\n", evaluation.issues.len());
            for issue in &evaluation.issues {
                let _ = writeln!(s, "### [{}] {}\n", issue.severity, issue.issue_type);
                let _ = writeln!(s, "- **Metric**: {}", issue.metric);
                let _ = writeln!(s, "- **Current**: {:.2}", issue.current);
                let _ = writeln!(s, "- **Expected**: {:.2}", issue.expected);
                let _ = writeln!(s, "- **Details**: {}\n", issue.message);
            }
        }

        if !evaluation.recommendations.is_empty() {
            s.push_str("## Recommendations\n\n");
            for rec in &evaluation.recommendations {
                let _ = writeln!(s, "### [{}] {}\n", rec.priority, rec.title);
                let _ = writeln!(s, "**Category**: {}\n", rec.category);
                if !rec.message.is_empty() {
                    let _ = writeln!(s, "{}\n", rec.message);
                }
                if !rec.actions.is_empty() {
                    s.push_str("**Actions**:\n\n");
                    for action in &rec.actions {
                        let _ = writeln!(s, "- {action}");
                    }
                    s.push('\n');
                }
                if !rec.references.is_empty() {
                    s.push_str("**References**:\n\n");
                    for reference in &rec.references {
                        let _ = writeln!(s, "- {reference}");
                    }
                    s.push('\n');
                }
            }
        }

        s.push_str("## Conclusion\n\n");
        s.push_str("```\n");
        s.push_str(&evaluation.rationale);
        s.push_str("```\n");
        s
    }
}

impl Reporter for MarkdownReporter {
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
        OutputFormat::Markdown
    }
}
