//! Simulated message broker.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

use super::connection::Connection;
use super::SimulationProfile;
use crate::config::SecretString;
use crate::error::ClientError;
use crate::operation::{Operation, OperationResult};
use crate::traits::{BackendClient, ClientMetrics};

/// Wait applied to a consume that carries no `max_wait`.
pub const DEFAULT_CONSUME_WAIT: Duration = Duration::from_millis(100);

const DEFAULT_TOPIC: &str = "stability-test";

#[derive(Debug)]
struct Message {
    key: String,
    payload: Vec<u8>,
    offset: u64,
}

#[derive(Debug, Default)]
struct Topic {
    queue: VecDeque<Message>,
    next_offset: u64,
}

/// Per-topic FIFO broker behind the [`BackendClient`] contract.
///
/// `Write` produces, `Read` consumes with a bounded wait. A consume that
/// finds nothing within the wait succeeds with `no_message = true`.
/// `Delete` and `Custom` are not part of a stream's vocabulary and fail as
/// unsupported.
#[derive(Debug)]
pub struct SimulatedBroker {
    profile: SimulationProfile,
    connection: Connection,
    topics: Mutex<HashMap<String, Topic>>,
    arrivals: Notify,
    produced: AtomicU64,
    consumed: AtomicU64,
}

impl SimulatedBroker {
    /// Create a disconnected broker.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        profile: SimulationProfile,
        password: Option<SecretString>,
    ) -> Self {
        Self {
            profile,
            connection: Connection::new(endpoint.into(), password),
            topics: Mutex::new(HashMap::new()),
            arrivals: Notify::new(),
            produced: AtomicU64::new(0),
            consumed: AtomicU64::new(0),
        }
    }

    /// Produced minus consumed.
    #[must_use]
    pub fn lag(&self) -> u64 {
        self.produced
            .load(Ordering::Relaxed)
            .saturating_sub(self.consumed.load(Ordering::Relaxed))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Topic>> {
        self.topics.lock().unwrap_or_else(|poisoned| {
            tracing::warn!(
                endpoint = self.connection.endpoint(),
                "Topic lock was poisoned, recovering"
            );
            poisoned.into_inner()
        })
    }

    fn produce(&self, topic: &str, key: &str, payload: &[u8]) -> OperationResult {
        let offset = {
            let mut topics = self.lock();
            let topic = topics.entry(topic.to_string()).or_default();
            let offset = topic.next_offset;
            topic.next_offset += 1;
            topic.queue.push_back(Message {
                key: key.to_string(),
                payload: payload.to_vec(),
                offset,
            });
            offset
        };
        self.produced.fetch_add(1, Ordering::Relaxed);
        self.arrivals.notify_waiters();

        OperationResult::success(Duration::ZERO)
            .with_metadata("topic", topic)
            .with_metadata("partition", 0)
            .with_metadata("offset", offset)
    }

    fn try_pop(&self, topic: &str) -> Option<Message> {
        self.lock().get_mut(topic).and_then(|t| t.queue.pop_front())
    }

    async fn consume(&self, topic: &str, wait: Duration) -> OperationResult {
        let deadline = Instant::now() + wait;
        loop {
            let arrival = self.arrivals.notified();
            tokio::pin!(arrival);
            arrival.as_mut().enable();

            if let Some(message) = self.try_pop(topic) {
                self.consumed.fetch_add(1, Ordering::Relaxed);
                return OperationResult::success(Duration::ZERO)
                    .with_data(message.payload)
                    .with_metadata("topic", topic)
                    .with_metadata("key", message.key)
                    .with_metadata("offset", message.offset);
            }

            if tokio::time::timeout_at(deadline, arrival).await.is_err() {
                return OperationResult::success(Duration::ZERO)
                    .with_metadata("topic", topic)
                    .with_metadata("no_message", true);
            }
        }
    }

    async fn apply(&self, operation: &Operation) -> Result<OperationResult, ClientError> {
        match operation {
            Operation::Write {
                key,
                value,
                options,
            } => {
                let topic = options.topic.as_deref().unwrap_or(DEFAULT_TOPIC);
                Ok(self.produce(topic, key, value))
            }
            Operation::Read { options, .. } => {
                let topic = options.topic.as_deref().unwrap_or(DEFAULT_TOPIC);
                let wait = options.max_wait.unwrap_or(DEFAULT_CONSUME_WAIT);
                Ok(self.consume(topic, wait).await)
            }
            Operation::Delete { .. } => Err(ClientError::UnsupportedOperation {
                operation: "delete".to_string(),
            }),
            Operation::Custom { name, .. } => Err(ClientError::UnsupportedOperation {
                operation: format!("custom:{name}"),
            }),
        }
    }
}

#[async_trait]
impl BackendClient for SimulatedBroker {
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
            None => self.apply(operation).await,
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
        ClientMetrics {
            message_lag: Some(self.lag()),
            ..self.connection.metrics()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::operation::{ReadOptions, WriteOptions};
    use std::sync::Arc;

    async fn connected() -> SimulatedBroker {
        let broker = SimulatedBroker::new("127.0.0.1:9092", SimulationProfile::default(), None);
        broker.connect().await.unwrap();
        broker
    }

    #[tokio::test]
    async fn test_produce_then_consume_fifo() {
        let broker = connected().await;
        for i in 0..3 {
            broker
                .execute(&Operation::write(format!("k{i}"), vec![i]))
                .await
                .unwrap();
        }
        assert_eq!(broker.lag(), 3);

        for i in 0..3u8 {
            let result = broker.execute(&Operation::read("any")).await.unwrap();
            assert!(result.is_success());
            assert_eq!(result.data, Some(vec![i]));
            assert_eq!(result.metadata["offset"], u64::from(i));
        }
        assert_eq!(broker.lag(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consume_on_empty_topic_is_successful_no_op() {
        let broker = connected().await;
        let op = Operation::read("k")
            .with_read_options(ReadOptions::default().max_wait(Duration::from_millis(50)));

        let result = broker.execute(&op).await.unwrap();
        assert!(result.is_success());
        assert!(result.flag("no_message"));
        assert!(result.data.is_none());
        assert!(result.duration >= Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_consume_wakes_on_produce() {
        let broker = Arc::new(connected().await);
        let consumer = {
            let broker = Arc::clone(&broker);
            tokio::spawn(async move {
                let op = Operation::read("k")
                    .with_read_options(ReadOptions::default().max_wait(Duration::from_secs(5)));
                broker.execute(&op).await
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        broker
            .execute(&Operation::write("k", b"late".to_vec()))
            .await
            .unwrap();

        let result = consumer.await.unwrap().unwrap();
        assert_eq!(result.data.as_deref(), Some(&b"late"[..]));
        assert!(result.duration < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let broker = connected().await;
        let write = Operation::write("k", b"x".to_vec())
            .with_write_options(WriteOptions::default().topic("orders"));
        broker.execute(&write).await.unwrap();

        let other = Operation::read("k").with_read_options(
            ReadOptions::default()
                .topic("payments")
                .max_wait(Duration::from_millis(1)),
        );
        assert!(broker.execute(&other).await.unwrap().flag("no_message"));

        let same = Operation::read("k").with_read_options(ReadOptions::default().topic("orders"));
        assert_eq!(
            broker.execute(&same).await.unwrap().data,
            Some(b"x".to_vec())
        );
    }

    #[tokio::test]
    async fn test_delete_and_custom_unsupported() {
        let broker = connected().await;
        for op in [Operation::delete("k"), Operation::custom("COMPACT", "t")] {
            let result = broker.execute(&op).await.unwrap();
            assert_eq!(result.error().unwrap().kind(), ErrorKind::Unsupported);
        }
    }

    #[tokio::test]
    async fn test_metrics_report_lag() {
        let broker = connected().await;
        broker
            .execute(&Operation::write("k", b"1".to_vec()))
            .await
            .unwrap();
        let metrics = broker.client_metrics();
        assert_eq!(metrics.message_lag, Some(1));
        assert!(metrics.cache_hit_rate.is_none());
        assert_eq!(metrics.total_connection_attempts, 1);
    }
}
