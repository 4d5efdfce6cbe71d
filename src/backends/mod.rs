//! In-process simulated backends.
//!
//! Two [`BackendClient`] implementations that need no external service:
//! - [`SimulatedKvStore`]: key-value store flavored after Redis
//! - [`SimulatedBroker`]: per-topic FIFO broker flavored after Kafka
//!
//! Both share a [`SimulationProfile`] for fault injection, so a run can be
//! steered into any verdict deterministically.
//!
//! # Example
//!
//! ```
//! use stability_harness::backends::{simulated_client, BackendKind, SimulationProfile};
//! use stability_harness::operation::Operation;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = simulated_client(
//!     BackendKind::Redis,
//!     "127.0.0.1:6379",
//!     SimulationProfile::default(),
//!     None,
//! );
//! client.connect().await?;
//! let result = client.execute(&Operation::write("k", b"v".to_vec())).await?;
//! assert!(result.is_success());
//! # Ok(())
//! # }
//! ```

mod connection;
mod simulated_broker;
mod simulated_kv;

pub use simulated_broker::{SimulatedBroker, DEFAULT_CONSUME_WAIT};
pub use simulated_kv::SimulatedKvStore;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SecretString;
use crate::error::ConfigError;
use crate::traits::BackendClient;

/// Backend family under test. Selects the workload shape, threshold preset
/// and evaluation flavor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Key-value store; write-then-read workload.
    #[default]
    Redis,
    /// Message stream; produce-then-consume workload.
    Kafka,
}

impl BackendKind {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Redis => "redis",
            Self::Kafka => "kafka",
        }
    }

    /// Conventional port of this backend.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Redis => 6379,
            Self::Kafka => 9092,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "kafka" => Ok(Self::Kafka),
            other => Err(ConfigError::InvalidValue {
                var: "HARNESS_BACKEND".to_string(),
                reason: format!("unknown backend '{other}', expected redis or kafka"),
            }),
        }
    }
}

/// Fault injection knobs shared by the simulated backends.
#[derive(Debug, Clone, Default)]
pub struct SimulationProfile {
    /// Added to every operation.
    pub latency: Duration,
    /// Every Nth operation fails with a network error.
    pub fail_every: Option<u64>,
    /// Every Nth write is acknowledged but not stored. Key-value only.
    pub drop_every: Option<u64>,
    /// Reject every connect attempt.
    pub refuse_connections: bool,
    /// Password the backend demands; a mismatch fails the connect.
    pub required_password: Option<SecretString>,
}

impl SimulationProfile {
    /// Set the per-operation latency.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail every Nth operation. Zero disables.
    #[must_use]
    pub fn with_fail_every(mut self, every: u64) -> Self {
        self.fail_every = nonzero(every);
        self
    }

    /// Drop every Nth write. Zero disables.
    #[must_use]
    pub fn with_drop_every(mut self, every: u64) -> Self {
        self.drop_every = nonzero(every);
        self
    }

    /// Reject all connections.
    #[must_use]
    pub fn refusing_connections(mut self) -> Self {
        self.refuse_connections = true;
        self
    }

    /// Require a password on connect.
    #[must_use]
    pub fn with_required_password(mut self, password: impl Into<SecretString>) -> Self {
        self.required_password = Some(password.into());
        self
    }
}

const fn nonzero(every: u64) -> Option<u64> {
    if every == 0 {
        None
    } else {
        Some(every)
    }
}

/// True when the `n`th event (1-based) is selected by an every-Nth knob.
pub(crate) const fn hits_every(n: u64, every: Option<u64>) -> bool {
    match every {
        Some(every) if every > 0 => n % every == 0,
        _ => false,
    }
}

/// Build the simulated client for a backend kind.
#[must_use]
pub fn simulated_client(
    kind: BackendKind,
    endpoint: impl Into<String>,
    profile: SimulationProfile,
    password: Option<SecretString>,
) -> Arc<dyn BackendClient> {
    match kind {
        BackendKind::Redis => Arc::new(SimulatedKvStore::new(endpoint, profile, password)),
        BackendKind::Kafka => Arc::new(SimulatedBroker::new(endpoint, profile, password)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use static_assertions::assert_impl_all;
    use test_case::test_case;

    assert_impl_all!(SimulatedKvStore: Send, Sync);
    assert_impl_all!(SimulatedBroker: Send, Sync);
    assert_impl_all!(BackendKind: Send, Sync, Copy);

    #[test_case("redis", BackendKind::Redis)]
    #[test_case("Kafka", BackendKind::Kafka)]
    #[test_case(" REDIS ", BackendKind::Redis)]
    fn test_backend_kind_parse(input: &str, expected: BackendKind) {
        assert_eq!(input.parse::<BackendKind>().unwrap(), expected);
    }

    #[test]
    fn test_backend_kind_parse_unknown() {
        let err = "memcached".parse::<BackendKind>().unwrap_err();
        assert!(err.to_string().contains("memcached"));
    }

    #[test]
    fn test_default_ports() {
        assert_eq!(BackendKind::Redis.default_port(), 6379);
        assert_eq!(BackendKind::Kafka.default_port(), 9092);
    }

    #[test]
    fn test_hits_every() {
        assert!(!hits_every(1, None));
        assert!(!hits_every(1, Some(3)));
        assert!(hits_every(3, Some(3)));
        assert!(hits_every(6, Some(3)));
        assert!(hits_every(7, Some(1)));
    }

    #[test]
    fn test_profile_builders_treat_zero_as_disabled() {
        let profile = SimulationProfile::default()
            .with_fail_every(0)
            .with_drop_every(5);
        assert_eq!(profile.fail_every, None);
        assert_eq!(profile.drop_every, Some(5));
    }
}
