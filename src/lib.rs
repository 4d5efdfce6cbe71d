//! Stability Harness
//!
//! Drives a synthetic workload against a key-value or stream backend,
//! measures how it behaves, and grades the result.
//!
//! # Features
//!
//! - Thread-safe metrics collection with latency percentiles, MTTR and
//!   connection/reconnect tracking
//! - Weighted 100-point evaluation across availability, performance,
//!   reliability and resilience, with issues and recommendations
//! - Fixed-cadence workload driver with deadline, budget and cancellation
//! - Text, JSON and Markdown reports
//! - Simulated Redis-like and Kafka-like backends with fault injection
//!
//! # Quick Start
//!
//! ```bash
//! stability-harness run --backend redis --duration 30 --operations 5000
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐  Operation   ┌───────────────┐
//! │ WorkloadDriver │─────────────▶│ BackendClient │
//! │                │◀─────────────│  (simulated)  │
//! └───────┬────────┘   Result     └───────────────┘
//!         │ record_*
//!         ▼
//! ┌──────────────────┐ snapshot ┌────────────────────┐ evaluation ┌──────────┐
//! │ MetricsCollector │─────────▶│ StabilityEvaluator │───────────▶│ Reporter │
//! └──────────────────┘          └────────────────────┘            └──────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod backends;
pub mod config;
pub mod driver;
pub mod error;
pub mod evaluator;
pub mod metrics;
pub mod operation;
pub mod report;
pub mod traits;

#[cfg(test)]
mod test_utils;
