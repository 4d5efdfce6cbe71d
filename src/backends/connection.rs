//! Connection lifecycle shared by the simulated clients.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::time::Instant;

use super::{hits_every, SimulationProfile};
use crate::config::SecretString;
use crate::error::ClientError;
use crate::traits::ClientMetrics;

/// Connection state and counters. All fields are atomics so the clients
/// need no lock for the lifecycle path.
#[derive(Debug)]
pub(super) struct Connection {
    endpoint: String,
    password: Option<SecretString>,
    connected: AtomicBool,
    attempts: AtomicU64,
    failed: AtomicU64,
    operations: AtomicU64,
}

impl Connection {
    pub(super) fn new(endpoint: String, password: Option<SecretString>) -> Self {
        Self {
            endpoint,
            password,
            connected: AtomicBool::new(false),
            attempts: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            operations: AtomicU64::new(0),
        }
    }

    pub(super) fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Open the connection. A no-op when already connected.
    pub(super) fn connect(&self, profile: &SimulationProfile) -> Result<(), ClientError> {
        if self.connected.load(Ordering::Acquire) {
            return Ok(());
        }
        self.attempts.fetch_add(1, Ordering::Relaxed);

        if profile.refuse_connections {
            self.failed.fetch_add(1, Ordering::Relaxed);
            return Err(ClientError::ConnectionFailed {
                message: format!("connection refused by {}", self.endpoint),
            });
        }

        if let Some(required) = &profile.required_password {
            if !required.accepts(self.password.as_ref()) {
                self.failed.fetch_add(1, Ordering::Relaxed);
                return Err(ClientError::Authentication {
                    message: format!("invalid credentials for {}", self.endpoint),
                });
            }
        }

        self.connected.store(true, Ordering::Release);
        tracing::debug!(endpoint = %self.endpoint, "Simulated backend connected");
        Ok(())
    }

    /// Close the connection. Returns true if it was open.
    pub(super) fn disconnect(&self) -> bool {
        let was_open = self.connected.swap(false, Ordering::AcqRel);
        if was_open {
            tracing::debug!(endpoint = %self.endpoint, "Simulated backend disconnected");
        }
        was_open
    }

    pub(super) fn ensure_connected(&self) -> Result<(), ClientError> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(ClientError::NotConnected)
        }
    }

    /// Apply the configured latency, then decide whether this operation is
    /// an injected fault. Returns the start instant for timing.
    pub(super) async fn begin_operation(
        &self,
        profile: &SimulationProfile,
    ) -> (Instant, Option<ClientError>) {
        let start = Instant::now();
        if !profile.latency.is_zero() {
            tokio::time::sleep(profile.latency).await;
        }
        let n = self.operations.fetch_add(1, Ordering::Relaxed) + 1;
        let fault = hits_every(n, profile.fail_every).then(|| ClientError::Network {
            message: format!("injected fault on operation {n}"),
        });
        (start, fault)
    }

    pub(super) fn metrics(&self) -> ClientMetrics {
        ClientMetrics {
            active_connections: u64::from(self.connected.load(Ordering::Acquire)),
            total_connection_attempts: self.attempts.load(Ordering::Relaxed),
            failed_connection_attempts: self.failed.load(Ordering::Relaxed),
            cache_hit_rate: None,
            message_lag: None,
        }
    }
}
