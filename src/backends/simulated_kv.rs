//! Simulated key-value store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::connection::Connection;
use super::{hits_every, SimulationProfile};
use crate::config::SecretString;
use crate::error::ClientError;
use crate::operation::{Operation, OperationResult};
use crate::traits::{BackendClient, ClientMetrics};

/// In-memory key-value store behind the [`BackendClient`] contract.
///
/// Reads report `hit` in their metadata and feed the cache hit rate.
/// With [`SimulationProfile::drop_every`] set, selected writes are
/// acknowledged without being stored, which the driver's read-back check
/// surfaces as data loss.
#[derive(Debug)]
pub struct SimulatedKvStore {
    profile: SimulationProfile,
    connection: Connection,
    store: Mutex<HashMap<String, Vec<u8>>>,
    writes: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SimulatedKvStore {
    /// Create a disconnected store.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        profile: SimulationProfile,
        password: Option<SecretString>,
    ) -> Self {
        Self {
            profile,
            connection: Connection::new(endpoint.into(), password),
            store: Mutex::new(HashMap::new()),
            writes: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Number of keys currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if no key is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.store.lock().unwrap_or_else(|poisoned| {
            tracing::warn!(
                endpoint = self.connection.endpoint(),
                "Store lock was poisoned, recovering"
            );
            poisoned.into_inner()
        })
    }

    fn apply(&self, operation: &Operation) -> Result<OperationResult, ClientError> {
        let result = match operation {
            Operation::Read { key, .. } => {
                let value = self.lock().get(key).cloned();
                let hit = value.is_some();
                if hit {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                }
                let result = OperationResult::success(Duration::ZERO).with_metadata("hit", hit);
                match value {
                    Some(value) => result.with_data(value),
                    None => result,
                }
            }
            Operation::Write { key, value, .. } => {
                let n = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
                let dropped = hits_every(n, self.profile.drop_every);
                if dropped {
                    tracing::debug!(key = %key, "Dropping acknowledged write");
                } else {
                    self.lock().insert(key.clone(), value.clone());
                }
                OperationResult::success(Duration::ZERO)
            }
            Operation::Delete { key } => {
                let existed = self.lock().remove(key).is_some();
                OperationResult::success(Duration::ZERO).with_metadata("existed", existed)
            }
            Operation::Custom { name, .. } => {
                return Err(ClientError::UnsupportedOperation {
                    operation: format!("custom:{name}"),
                })
            }
        };
        Ok(result)
    }
}

#[async_trait]
impl BackendClient for SimulatedKvStore {
    async fn connect(&self) -> Result<(), ClientError> {
        self.connection.connect(&self.profile)
    }

    async fn disconnect(&self) -> Result<(), ClientError> {
        self.connection.disconnect();
        Ok(())
    }

    async fn execute(&self, operation: &Operation) -> Result<OperationResult, ClientError> {
        self.connection.ensure_connected()?;
        let (start, fault) = self.connection.begin_operation(&self.profile).await;

        let outcome = match fault {
            Some(err) => Err(err),
            None => self.apply(operation),
        };
        let elapsed = start.elapsed();

        Ok(match outcome {
            Ok(mut result) => {
                result.duration = elapsed;
                result
            }
            Err(err) => OperationResult::failure(err, elapsed),
        })
    }

    async fn health_check(&self) -> Result<(), ClientError> {
        self.connection.ensure_connected()
    }

    fn client_metrics(&self) -> ClientMetrics {
        let hits = self.hits.load(Ordering::Relaxed);
        let reads = hits + self.misses.load(Ordering::Relaxed);
        #[allow(clippy::cast_precision_loss)]
        let cache_hit_rate = (reads > 0).then(|| hits as f64 / reads as f64);

        ClientMetrics {
            cache_hit_rate,
            ..self.connection.metrics()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::operation::Outcome;

    async fn connected(profile: SimulationProfile) -> SimulatedKvStore {
        let store = SimulatedKvStore::new("127.0.0.1:6379", profile, None);
        store.connect().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = connected(SimulationProfile::default()).await;
        let write = store
            .execute(&Operation::write("k1", b"hello".to_vec()))
            .await
            .unwrap();
        assert!(write.is_success());

        let read = store.execute(&Operation::read("k1")).await.unwrap();
        assert!(read.is_success());
        assert_eq!(read.data.as_deref(), Some(&b"hello"[..]));
        assert!(read.flag("hit"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_read_miss_is_success_without_data() {
        let store = connected(SimulationProfile::default()).await;
        let read = store.execute(&Operation::read("missing")).await.unwrap();
        assert!(read.is_success());
        assert!(read.data.is_none());
        assert!(!read.flag("hit"));
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let store = connected(SimulationProfile::default()).await;
        store
            .execute(&Operation::write("k", b"v".to_vec()))
            .await
            .unwrap();
        let first = store.execute(&Operation::delete("k")).await.unwrap();
        let second = store.execute(&Operation::delete("k")).await.unwrap();
        assert!(first.flag("existed"));
        assert!(!second.flag("existed"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_custom_is_unsupported_failure() {
        let store = connected(SimulationProfile::default()).await;
        let result = store
            .execute(&Operation::custom("INCR", "counter"))
            .await
            .unwrap();
        let err = result.error().unwrap();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert!(err.to_string().contains("custom:INCR"));
    }

    #[tokio::test]
    async fn test_execute_before_connect_is_err() {
        let store = SimulatedKvStore::new("local", SimulationProfile::default(), None);
        let err = store.execute(&Operation::read("k")).await.unwrap_err();
        assert_eq!(err, ClientError::NotConnected);
        assert!(store.health_check().await.is_err());
    }

    #[tokio::test]
    async fn test_dropped_write_is_acknowledged_but_lost() {
        let store = connected(SimulationProfile::default().with_drop_every(2)).await;
        store
            .execute(&Operation::write("a", b"1".to_vec()))
            .await
            .unwrap();
        let dropped = store
            .execute(&Operation::write("b", b"2".to_vec()))
            .await
            .unwrap();
        assert!(dropped.is_success());

        let read = store.execute(&Operation::read("b")).await.unwrap();
        assert!(read.data.is_none());
    }

    #[tokio::test]
    async fn test_injected_fault_is_network_failure() {
        let store = connected(SimulationProfile::default().with_fail_every(1)).await;
        let result = store.execute(&Operation::read("k")).await.unwrap();
        assert!(matches!(
            result.outcome,
            Outcome::Failure(ClientError::Network { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_measured() {
        let profile =
            SimulationProfile::default().with_latency(std::time::Duration::from_millis(25));
        let store = connected(profile).await;
        let result = store.execute(&Operation::read("k")).await.unwrap();
        assert!(result.duration >= std::time::Duration::from_millis(25));
    }

    #[tokio::test]
    async fn test_cache_hit_rate() {
        let store = connected(SimulationProfile::default()).await;
        assert!(store.client_metrics().cache_hit_rate.is_none());

        store
            .execute(&Operation::write("k", b"v".to_vec()))
            .await
            .unwrap();
        store.execute(&Operation::read("k")).await.unwrap();
        store.execute(&Operation::read("nope")).await.unwrap();

        let metrics = store.client_metrics();
        assert!((metrics.cache_hit_rate.unwrap() - 0.5).abs() < f64::EPSILON);
        assert_eq!(metrics.active_connections, 1);
        assert!(metrics.message_lag.is_none());
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let store = connected(SimulationProfile::default()).await;
        store.disconnect().await.unwrap();
        store.disconnect().await.unwrap();
        assert_eq!(store.client_metrics().active_connections, 0);
    }
}
