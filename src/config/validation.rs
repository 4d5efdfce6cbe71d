//! Configuration validation.
//!
//! This module provides validation logic for configuration values,
//! ensuring they are within acceptable ranges, and loads threshold
//! override files.

use std::path::Path;

use super::Config;
use crate::error::ConfigError;
use crate::evaluator::ThresholdOverrides;

/// Minimum run duration in seconds.
pub const MIN_DURATION_SECS: u64 = 1;

/// Maximum run duration in seconds (24 hours).
pub const MAX_DURATION_SECS: u64 = 86_400;

/// Minimum operation budget.
pub const MIN_OPERATIONS: u64 = 1;

/// Maximum operation budget.
pub const MAX_OPERATIONS: u64 = 10_000_000;

/// Validate configuration values.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] if any value is out of range:
/// - `HARNESS_HOST` must not be empty
/// - `HARNESS_PORT` must not be 0
/// - `HARNESS_DURATION_SECS` must be between 1 and 86400
/// - `HARNESS_OPERATIONS` must be between 1 and 10000000
#[must_use = "validation result should be checked"]
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.host.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            var: "HARNESS_HOST".into(),
            reason: "must not be empty".into(),
        });
    }

    if config.port == 0 {
        return Err(ConfigError::InvalidValue {
            var: "HARNESS_PORT".into(),
            reason: "must not be 0".into(),
        });
    }

    if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&config.duration_secs) {
        return Err(ConfigError::InvalidValue {
            var: "HARNESS_DURATION_SECS".into(),
            reason: format!("must be between {MIN_DURATION_SECS} and {MAX_DURATION_SECS} seconds"),
        });
    }

    if !(MIN_OPERATIONS..=MAX_OPERATIONS).contains(&config.operations) {
        return Err(ConfigError::InvalidValue {
            var: "HARNESS_OPERATIONS".into(),
            reason: format!("must be between {MIN_OPERATIONS} and {MAX_OPERATIONS}"),
        });
    }

    Ok(())
}

/// Read a JSON threshold overrides file.
///
/// Unknown keys are rejected so typos surface instead of silently keeping
/// defaults. Ladder ordering is checked later, when the evaluator is built.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] if the file cannot be read or is
/// not a valid overrides document.
pub fn load_threshold_overrides(path: &Path) -> Result<ThresholdOverrides, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        var: "HARNESS_THRESHOLDS_PATH".into(),
        reason,
    };

    let raw = std::fs::read_to_string(path)
        .map_err(|e| invalid(format!("cannot read {}: {e}", path.display())))?;
    let overrides: ThresholdOverrides = serde_json::from_str(&raw)
        .map_err(|e| invalid(format!("{} is not a valid overrides file: {e}", path.display())))?;

    tracing::debug!(path = %path.display(), "Loaded threshold overrides");
    Ok(overrides)
}
