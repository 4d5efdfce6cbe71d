//! Timed outcome of a single executed operation.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::ClientError;

/// Exactly one of success or failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The backend acknowledged the operation.
    Success,
    /// The operation failed with the carried error.
    Failure(ClientError),
}

/// Result of executing one [`Operation`](super::Operation).
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    /// Success or failure.
    pub outcome: Outcome,
    /// Wall time spent inside the client.
    pub duration: Duration,
    /// Payload returned by reads, if any.
    pub data: Option<Vec<u8>>,
    /// Backend-specific annotations (e.g. `no_message`, `partition`).
    pub metadata: BTreeMap<String, Value>,
    /// When the operation completed.
    pub completed_at: DateTime<Utc>,
}

impl OperationResult {
    /// A successful result completed now.
    #[must_use]
    pub fn success(duration: Duration) -> Self {
        Self {
            outcome: Outcome::Success,
            duration,
            data: None,
            metadata: BTreeMap::new(),
            completed_at: Utc::now(),
        }
    }

    /// A failed result completed now.
    #[must_use]
    pub fn failure(error: ClientError, duration: Duration) -> Self {
        Self {
            outcome: Outcome::Failure(error),
            duration,
            data: None,
            metadata: BTreeMap::new(),
            completed_at: Utc::now(),
        }
    }

    /// Attach a data payload.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Override the completion timestamp.
    #[must_use]
    pub const fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = at;
        self
    }

    /// True when the outcome is [`Outcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success)
    }

    /// The failure error, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&ClientError> {
        match &self.outcome {
            Outcome::Success => None,
            Outcome::Failure(err) => Some(err),
        }
    }

    /// Boolean metadata lookup; absent or non-boolean entries read as false.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.metadata
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_success_has_no_error() {
        let result = OperationResult::success(Duration::from_millis(3)).with_data(b"v".to_vec());
        assert!(result.is_success());
        assert!(result.error().is_none());
        assert_eq!(result.data.as_deref(), Some(&b"v"[..]));
    }

    #[test]
    fn test_failure_carries_error() {
        let err = ClientError::Timeout { timeout_ms: 100 };
        let result = OperationResult::failure(err.clone(), Duration::from_millis(100));
        assert!(!result.is_success());
        assert_eq!(result.error(), Some(&err));
    }

    #[test]
    fn test_flag_lookup() {
        let result = OperationResult::success(Duration::ZERO)
            .with_metadata("no_message", true)
            .with_metadata("partition", 3);
        assert!(result.flag("no_message"));
        assert!(!result.flag("partition"));
        assert!(!result.flag("missing"));
    }
}
