//! Prometheus metrics for the capture-and-validate loop.
//!
//! # Metrics Exposed
//!
//! ## Scheduling
//! - `facegate_ticks_total` - Scheduler ticks observed
//! - `facegate_ticks_skipped_in_flight_total` - Ticks skipped while a request was outstanding
//! - `facegate_ticks_skipped_throttled_total` - Ticks skipped by the minimum gap
//! - `facegate_capture_not_ready_total` - Captures skipped because the video was not ready
//! - `facegate_validation_in_flight` - 1 while a request is outstanding
//!
//! ## Outcomes
//! - `facegate_validation_attempts_total` - Snapshots dispatched
//! - `facegate_validation_granted_total` / `facegate_validation_denied_total`
//! - `facegate_validation_rejected_total` - Service-reported failures
//! - `facegate_validation_transport_errors_total` - Network or parse failures
//!
//! The HTTP exporter (`/metrics`, `/health`, `/status`) is only built
//! with the `metrics` feature.

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, ServerError};
