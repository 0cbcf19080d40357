//! Prometheus metrics backend for flotilla batches.
//!
//! [`PrometheusMetrics`] implements [`flotilla_core::MetricsBackend`]; hand it to a
//! [`flotilla_core::BatchContext`] and expose [`PrometheusMetrics::gather`] however the
//! host application serves metrics.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use flotilla_core::BatchContext;
//! use flotilla_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let ctx = BatchContext::new().with_metrics(Arc::new(metrics.clone()));
//! # let _ = ctx;
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `flotilla_creates_total` - Counter
//! - `flotilla_deletes_total` - Counter
//! - `flotilla_poll_cycles_total` - Counter
//! - `flotilla_sweeps_total{phase}` - Counter
//! - `flotilla_failures_total{phase}` - Counter

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
