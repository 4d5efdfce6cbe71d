//! Report rendering.
//!
//! Three interchangeable renderers share the [`Reporter`] contract:
//! - [`TextReporter`]: console report
//! - [`JsonReporter`]: structured, pretty-printed JSON
//! - [`MarkdownReporter`]: headings, a dimension table and bullet lists
//!
//! # Example
//!
//! ```
//! use stability_harness::evaluator::StabilityEvaluator;
//! use stability_harness::metrics::StabilityMetrics;
//! use stability_harness::report::{reporter_for, OutputFormat};
//!
//! let metrics = StabilityMetrics::default();
//! let evaluation = StabilityEvaluator::default().evaluate(&metrics);
//!
//! let format: OutputFormat = "md".parse().unwrap();
//! let mut out = Vec::new();
//! reporter_for(format).generate_report(&metrics, &evaluation, &mut out).unwrap();
//! assert!(String::from_utf8(out).unwrap().starts_with("# Stability Test Report"));
//! ```

mod json;
mod markdown;
mod text;

pub use json::JsonReporter;
pub use markdown::MarkdownReporter;
pub use text::TextReporter;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, ReportError};
use crate::evaluator::{EvaluationResult, Status};
use crate::metrics::StabilityMetrics;

/// Renders a finished run.
pub trait Reporter: Send + Sync {
    /// Write the report for `metrics` and `evaluation` to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if serialization or the write fails.
    fn generate_report(
        &self,
        metrics: &StabilityMetrics,
        evaluation: &EvaluationResult,
        out: &mut dyn Write,
    ) -> Result<(), ReportError>;

    /// Format this reporter produces.
    fn format(&self) -> OutputFormat;
}

/// Report format selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Console text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
    /// Markdown document.
    Markdown,
}

impl OutputFormat {
    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Markdown => "markdown",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "console" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(ConfigError::InvalidValue {
                var: "HARNESS_OUTPUT_FORMAT".to_string(),
                reason: format!("unknown format '{other}', expected text, json or markdown"),
            }),
        }
    }
}

/// Reporter for a format.
#[must_use]
pub fn reporter_for(format: OutputFormat) -> Box<dyn Reporter> {
    match format {
        OutputFormat::Text => Box::new(TextReporter),
        OutputFormat::Json => Box::new(JsonReporter::new()),
        OutputFormat::Markdown => Box::new(MarkdownReporter),
    }
}

/// Render a report into a file, creating or truncating it.
///
/// # Errors
///
/// Returns [`ReportError::Io`] if the file cannot be written.
pub fn write_report_file(
    reporter: &dyn Reporter,
    metrics: &StabilityMetrics,
    evaluation: &EvaluationResult,
    path: &Path,
) -> Result<(), ReportError> {
    let mut out = BufWriter::new(File::create(path)?);
    reporter.generate_report(metrics, evaluation, &mut out)?;
    out.flush()?;
    tracing::info!(path = %path.display(), format = %reporter.format(), "Report written");
    Ok(())
}

// ============================================================================
// Shared formatting
// ============================================================================

/// Human-readable duration: `850µs`, `42ms`, `1.50s`, `2m 5s`.
pub(crate) fn human_duration(d: Duration) -> String {
    let micros = d.as_micros();
    if micros < 1_000 {
        format!("{micros}µs")
    } else if micros < 1_000_000 {
        format!("{}ms", d.as_millis())
    } else if d.as_secs() < 60 {
        format!("{:.2}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", d.as_secs() / 60, d.as_secs() % 60)
    }
}

pub(crate) const fn status_marker(status: Status) -> &'static str {
    match status {
        Status::Pass => "[PASS]",
        Status::Warning => "[WARNING]",
        Status::Fail => "[FAIL]",
    }
}

pub(crate) const fn check(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "!!"
    }
}

/// Sub-score as a percentage of its cap.
pub(crate) fn share(score: f64, cap: f64) -> f64 {
    if cap > 0.0 {
        score / cap * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::test_utils::{evaluate, failing_metrics, healthy_metrics};
    use static_assertions::assert_obj_safe;
    use test_case::test_case;

    assert_obj_safe!(Reporter);

    #[test_case("text", OutputFormat::Text)]
    #[test_case("console", OutputFormat::Text)]
    #[test_case("JSON", OutputFormat::Json)]
    #[test_case("markdown", OutputFormat::Markdown)]
    #[test_case("md", OutputFormat::Markdown)]
    fn test_output_format_parse(input: &str, expected: OutputFormat) {
        assert_eq!(input.parse::<OutputFormat>().unwrap(), expected);
    }

    #[test]
    fn test_output_format_parse_unknown() {
        assert!(matches!(
            "html".parse::<OutputFormat>(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_reporter_for_matches_format() {
        for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Markdown] {
            assert_eq!(reporter_for(format).format(), format);
        }
    }

    #[test_case(Duration::from_micros(850), "850µs")]
    #[test_case(Duration::from_millis(42), "42ms")]
    #[test_case(Duration::from_millis(1500), "1.50s")]
    #[test_case(Duration::from_secs(125), "2m 5s")]
    fn test_human_duration(d: Duration, expected: &str) {
        assert_eq!(human_duration(d), expected);
    }

    #[test]
    fn test_write_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let metrics = failing_metrics();
        let evaluation = evaluate(&metrics);

        write_report_file(&JsonReporter::new(), &metrics, &evaluation, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["evaluation"]["status"], "FAIL");
    }

    #[test]
    fn test_write_report_file_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.txt");
        let metrics = healthy_metrics();
        let err = write_report_file(&TextReporter, &metrics, &evaluate(&metrics), &path)
            .unwrap_err();
        assert!(matches!(err, ReportError::Io(_)));
    }

    #[test]
    fn test_every_format_renders_every_issue() {
        let metrics = failing_metrics();
        let evaluation = evaluate(&metrics);
        for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Markdown] {
            let mut out = Vec::new();
            reporter_for(format)
                .generate_report(&metrics, &evaluation, &mut out)
                .unwrap();
            let text = String::from_utf8(out).unwrap();
            for issue in &evaluation.issues {
                assert!(
                    text.contains(issue.issue_type.as_str()),
                    "{format} report misses {}",
                    issue.issue_type
                );
            }
        }
    }
}
