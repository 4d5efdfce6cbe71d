//! Graduated threshold ladders.
//!
//! Every scored metric is banded against a four-tier [`Ladder`]. Callers
//! tune individual tiers through [`ThresholdOverrides`]; any field left
//! unset (or set to zero) keeps its default.
//!
//! # Example
//!
//! ```
//! use stability_harness::evaluator::{ThresholdOverrides, Thresholds};
//! use std::time::Duration;
//!
//! let mut overrides = ThresholdOverrides::default();
//! overrides.p95_latency_ms.pass = Some(300);
//! overrides.p95_latency_ms.fair = Some(0); // zero keeps the default
//!
//! let merged = Thresholds::default().merge(&overrides);
//! assert_eq!(merged.p95_latency.pass, Duration::from_millis(300));
//! assert_eq!(merged.p95_latency.fair, Duration::from_millis(100));
//! assert!(merged.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

use crate::error::ThresholdError;

/// Band a value landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Within the excellent limit.
    Excellent,
    /// Within the good limit.
    Good,
    /// Within the fair limit.
    Fair,
    /// Within the pass limit (inclusive).
    Pass,
    /// Outside every limit.
    Breach,
}

impl Tier {
    /// Pick the score for this tier from an
    /// `[excellent, good, fair, pass, breach]` table.
    #[must_use]
    pub const fn score(self, table: &[f64; 5]) -> f64 {
        match self {
            Self::Excellent => table[0],
            Self::Good => table[1],
            Self::Fair => table[2],
            Self::Pass => table[3],
            Self::Breach => table[4],
        }
    }
}

/// Four graduated limits for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ladder<T> {
    /// Best tier.
    pub excellent: T,
    /// Second tier.
    pub good: T,
    /// Third tier.
    pub fair: T,
    /// Minimum acceptable value.
    pub pass: T,
}

impl<T: PartialOrd + Copy + Debug> Ladder<T> {
    /// Create a ladder.
    pub const fn new(excellent: T, good: T, fair: T, pass: T) -> Self {
        Self {
            excellent,
            good,
            fair,
            pass,
        }
    }

    /// Band a value where smaller is better. Limits are inclusive.
    pub fn band_lower_is_better(&self, value: T) -> Tier {
        if value <= self.excellent {
            Tier::Excellent
        } else if value <= self.good {
            Tier::Good
        } else if value <= self.fair {
            Tier::Fair
        } else if value <= self.pass {
            Tier::Pass
        } else {
            Tier::Breach
        }
    }

    /// Band a value where larger is better. Limits are inclusive.
    pub fn band_higher_is_better(&self, value: T) -> Tier {
        if value >= self.excellent {
            Tier::Excellent
        } else if value >= self.good {
            Tier::Good
        } else if value >= self.fair {
            Tier::Fair
        } else if value >= self.pass {
            Tier::Pass
        } else {
            Tier::Breach
        }
    }

    fn tiers(&self) -> [(&'static str, T); 4] {
        [
            ("excellent", self.excellent),
            ("good", self.good),
            ("fair", self.fair),
            ("pass", self.pass),
        ]
    }

    fn check_order(&self, metric: &str, ascending: bool) -> Result<(), ThresholdError> {
        for pair in self.tiers().windows(2) {
            let (upper_name, upper) = pair[0];
            let (lower_name, lower) = pair[1];
            let ordered = if ascending { lower > upper } else { lower < upper };
            if !ordered {
                let relation = if ascending { "above" } else { "below" };
                return Err(ThresholdError::NonMonotonic {
                    metric: metric.to_string(),
                    detail: format!(
                        "{lower_name} ({lower:?}) must be {relation} {upper_name} ({upper:?})"
                    ),
                });
            }
        }
        Ok(())
    }
}

impl Ladder<f64> {
    fn check_range(&self, metric: &str, min: f64, max: f64) -> Result<(), ThresholdError> {
        for (_, value) in self.tiers() {
            if !value.is_finite() || value < min || value > max {
                return Err(ThresholdError::OutOfRange {
                    metric: metric.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Complete threshold table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Success ratio; higher is better.
    pub availability: Ladder<f64>,
    /// P95 latency; lower is better.
    pub p95_latency: Ladder<Duration>,
    /// P99 latency; lower is better.
    pub p99_latency: Ladder<Duration>,
    /// Failure ratio; lower is better.
    pub error_rate: Ladder<f64>,
    /// Mean time to recovery; lower is better.
    pub mttr: Ladder<Duration>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            availability: Ladder::new(0.9999, 0.999, 0.99, 0.95),
            p95_latency: Ladder::new(
                Duration::from_millis(10),
                Duration::from_millis(50),
                Duration::from_millis(100),
                Duration::from_millis(200),
            ),
            p99_latency: Ladder::new(
                Duration::from_millis(20),
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(500),
            ),
            error_rate: Ladder::new(0.0001, 0.001, 0.005, 0.01),
            mttr: Ladder::new(
                Duration::from_secs(5),
                Duration::from_secs(30),
                Duration::from_secs(60),
                Duration::from_secs(300),
            ),
        }
    }
}

impl Thresholds {
    /// Preset for message brokers, with relaxed latency ladders.
    #[must_use]
    pub fn stream() -> Self {
        Self {
            p95_latency: Ladder::new(
                Duration::from_millis(50),
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(500),
            ),
            p99_latency: Ladder::new(
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(500),
                Duration::from_millis(1000),
            ),
            ..Self::default()
        }
    }

    /// Merge overrides onto this table. Unset and zero fields are ignored.
    #[must_use]
    pub fn merge(&self, overrides: &ThresholdOverrides) -> Self {
        Self {
            availability: overrides.availability.apply(self.availability, |v| v),
            p95_latency: overrides
                .p95_latency_ms
                .apply(self.p95_latency, Duration::from_millis),
            p99_latency: overrides
                .p99_latency_ms
                .apply(self.p99_latency, Duration::from_millis),
            error_rate: overrides.error_rate.apply(self.error_rate, |v| v),
            mttr: overrides.mttr_secs.apply(self.mttr, Duration::from_secs),
        }
    }

    /// Check that every ladder is strictly graduated and in range.
    ///
    /// # Errors
    ///
    /// Returns [`ThresholdError::OutOfRange`] for ratios outside `[0, 1]`
    /// and [`ThresholdError::NonMonotonic`] for mis-ordered tiers.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        self.availability.check_range("availability", 0.0, 1.0)?;
        self.availability.check_order("availability", false)?;
        self.p95_latency.check_order("p95_latency", true)?;
        self.p99_latency.check_order("p99_latency", true)?;
        self.error_rate.check_range("error_rate", 0.0, 1.0)?;
        self.error_rate.check_order("error_rate", true)?;
        self.mttr.check_order("mttr", true)?;
        Ok(())
    }

    /// Express this table as a fully populated override document.
    #[must_use]
    pub fn to_overrides(&self) -> ThresholdOverrides {
        fn millis(d: Duration) -> u64 {
            u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
        }
        ThresholdOverrides {
            availability: LadderOverride::from_ladder(self.availability, |v| v),
            p95_latency_ms: LadderOverride::from_ladder(self.p95_latency, millis),
            p99_latency_ms: LadderOverride::from_ladder(self.p99_latency, millis),
            error_rate: LadderOverride::from_ladder(self.error_rate, |v| v),
            mttr_secs: LadderOverride::from_ladder(self.mttr, |d| d.as_secs()),
        }
    }
}

// ============================================================================
// Overrides
// ============================================================================

/// Values that can appear in an override; zero means "not set".
pub trait OverrideValue: Copy {
    /// True if this value should leave the default in place.
    fn is_unset(self) -> bool;
}

impl OverrideValue for f64 {
    fn is_unset(self) -> bool {
        self == 0.0
    }
}

impl OverrideValue for u64 {
    fn is_unset(self) -> bool {
        self == 0
    }
}

/// Partial ladder; `None` or zero keeps the default tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LadderOverride<T> {
    /// Excellent tier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excellent: Option<T>,
    /// Good tier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub good: Option<T>,
    /// Fair tier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fair: Option<T>,
    /// Pass tier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass: Option<T>,
}

impl<U: OverrideValue> LadderOverride<U> {
    fn apply<T: Copy>(&self, base: Ladder<T>, convert: impl Fn(U) -> T) -> Ladder<T> {
        let pick = |value: Option<U>, default: T| match value {
            Some(v) if !v.is_unset() => convert(v),
            _ => default,
        };
        Ladder {
            excellent: pick(self.excellent, base.excellent),
            good: pick(self.good, base.good),
            fair: pick(self.fair, base.fair),
            pass: pick(self.pass, base.pass),
        }
    }

    fn from_ladder<T: Copy>(ladder: Ladder<T>, convert: impl Fn(T) -> U) -> Self {
        Self {
            excellent: Some(convert(ladder.excellent)),
            good: Some(convert(ladder.good)),
            fair: Some(convert(ladder.fair)),
            pass: Some(convert(ladder.pass)),
        }
    }
}

/// Partial threshold table, typically loaded from a JSON file.
///
/// ```json
/// { "p95_latency_ms": { "pass": 300 }, "availability": { "pass": 0.9 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdOverrides {
    /// Availability ratios.
    pub availability: LadderOverride<f64>,
    /// P95 latency in milliseconds.
    pub p95_latency_ms: LadderOverride<u64>,
    /// P99 latency in milliseconds.
    pub p99_latency_ms: LadderOverride<u64>,
    /// Error ratios.
    pub error_rate: LadderOverride<f64>,
    /// MTTR in seconds.
    pub mttr_secs: LadderOverride<u64>,
}
