//! Operation and result model.
//!
//! This module defines the value types exchanged between the workload
//! driver and a backend client:
//! - [`Operation`]: one typed request, exhaustively matched by clients
//! - [`ReadOptions`] / [`WriteOptions`]: per-call overrides
//! - [`OperationResult`]: the timed outcome of executing an operation
//!
//! # Example
//!
//! ```
//! use stability_harness::operation::{Operation, OperationKind, ReadOptions};
//! use std::time::Duration;
//!
//! let op = Operation::read("user:1")
//!     .with_read_options(ReadOptions::default().max_wait(Duration::from_millis(100)));
//! assert_eq!(op.kind(), OperationKind::Read);
//! assert_eq!(op.key(), "user:1");
//! assert!(op.value().is_none());
//! ```

mod result;

pub use result::{Outcome, OperationResult};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Operation kind, as reported by [`Operation::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Read a key, or consume from a stream.
    Read,
    /// Write a key, or produce to a stream.
    Write,
    /// Delete a key.
    Delete,
    /// Backend-specific command.
    Custom,
}

impl OperationKind {
    /// Returns the lowercase name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overrides accepted by a read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Maximum time a consume may wait for a message before returning empty.
    pub max_wait: Option<Duration>,
    /// Topic to consume from, when the backend is a stream.
    pub topic: Option<String>,
}

impl ReadOptions {
    /// Set the bounded wait.
    #[must_use]
    pub const fn max_wait(mut self, wait: Duration) -> Self {
        self.max_wait = Some(wait);
        self
    }

    /// Set the target topic.
    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }
}

/// Overrides accepted by a write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Topic to produce to, when the backend is a stream.
    pub topic: Option<String>,
}

impl WriteOptions {
    /// Set the target topic.
    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }
}

/// A single typed request issued against a backend.
///
/// Clients match on this exhaustively; adding a variant is a compile error
/// in every client until it is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Read a key (or consume a message).
    Read {
        /// Key to read; the message key for streams.
        key: String,
        /// Per-call overrides.
        options: ReadOptions,
    },
    /// Write a value (or produce a message).
    Write {
        /// Key to write.
        key: String,
        /// Payload.
        value: Vec<u8>,
        /// Per-call overrides.
        options: WriteOptions,
    },
    /// Delete a key.
    Delete {
        /// Key to delete.
        key: String,
    },
    /// Backend-specific command carried through untouched.
    Custom {
        /// Command name.
        name: String,
        /// Key the command applies to.
        key: String,
        /// Optional argument payload.
        value: Option<Vec<u8>>,
    },
}

impl Operation {
    /// Create a read with default options.
    #[must_use]
    pub fn read(key: impl Into<String>) -> Self {
        Self::Read {
            key: key.into(),
            options: ReadOptions::default(),
        }
    }

    /// Create a write with default options.
    #[must_use]
    pub fn write(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self::Write {
            key: key.into(),
            value: value.into(),
            options: WriteOptions::default(),
        }
    }

    /// Create a delete.
    #[must_use]
    pub fn delete(key: impl Into<String>) -> Self {
        Self::Delete { key: key.into() }
    }

    /// Create a custom command.
    #[must_use]
    pub fn custom(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Custom {
            name: name.into(),
            key: key.into(),
            value: None,
        }
    }

    /// Replace the options of a read. Other variants are returned unchanged.
    #[must_use]
    pub fn with_read_options(self, new_options: ReadOptions) -> Self {
        match self {
            Self::Read { key, .. } => Self::Read {
                key,
                options: new_options,
            },
            other => other,
        }
    }

    /// Replace the options of a write. Other variants are returned unchanged.
    #[must_use]
    pub fn with_write_options(self, new_options: WriteOptions) -> Self {
        match self {
            Self::Write { key, value, .. } => Self::Write {
                key,
                value,
                options: new_options,
            },
            other => other,
        }
    }

    /// The kind of this operation.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::Read { .. } => OperationKind::Read,
            Self::Write { .. } => OperationKind::Write,
            Self::Delete { .. } => OperationKind::Delete,
            Self::Custom { .. } => OperationKind::Custom,
        }
    }

    /// The key this operation targets.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Read { key, .. }
            | Self::Write { key, .. }
            | Self::Delete { key }
            | Self::Custom { key, .. } => key,
        }
    }

    /// The payload carried by this operation, if any.
    #[must_use]
    pub fn value(&self) -> Option<&[u8]> {
        match self {
            Self::Write { value, .. } => Some(value),
            Self::Custom { value, .. } => value.as_deref(),
            Self::Read { .. } | Self::Delete { .. } => None,
        }
    }
}

/// Serialize a [`Duration`] as integer milliseconds.
pub mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    /// Serialize as milliseconds.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    /// Deserialize from milliseconds.
    ///
    /// # Errors
    ///
    /// Propagates deserializer errors.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
