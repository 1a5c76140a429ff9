//! Metrics collection and registry.

use crate::scheduler::Admission;
use crate::transport::{TransportError, ValidationOutcome};
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    /// Registration or encoding failed.
    Prometheus(#[from] prometheus::Error),
}

/// Point-in-time copy of the loop counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Timer ticks while active.
    pub ticks: u64,
    /// Ticks skipped behind an outstanding request.
    pub skipped_in_flight: u64,
    /// Ticks skipped by the minimum gap.
    pub skipped_throttled: u64,
    /// Admitted ticks whose capture yielded nothing.
    pub capture_not_ready: u64,
    /// Snapshots dispatched.
    pub attempts: u64,
    /// Completed validations that granted access.
    pub granted: u64,
    /// Completed validations that denied access.
    pub denied: u64,
    /// Service-reported failures.
    pub rejected: u64,
    /// Network and parse failures.
    pub transport_errors: u64,
    /// Whether a request is outstanding.
    pub in_flight: bool,
}

/// Prometheus metrics for the capture-and-validate loop.
///
/// Cloning is cheap and every clone updates the same counters.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,

    // Scheduling
    ticks_total: IntCounter,
    skipped_in_flight_total: IntCounter,
    skipped_throttled_total: IntCounter,
    capture_not_ready_total: IntCounter,
    in_flight: IntGauge,

    // Outcomes
    attempts_total: IntCounter,
    granted_total: IntCounter,
    denied_total: IntCounter,
    rejected_total: IntCounter,
    transport_errors_total: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new registry with all loop metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let ticks_total = IntCounter::new("facegate_ticks_total", "Scheduler ticks observed")?;
        let skipped_in_flight_total = IntCounter::new(
            "facegate_ticks_skipped_in_flight_total",
            "Ticks skipped because a validation request was outstanding",
        )?;
        let skipped_throttled_total = IntCounter::new(
            "facegate_ticks_skipped_throttled_total",
            "Ticks skipped because the minimum gap had not elapsed",
        )?;
        let capture_not_ready_total = IntCounter::new(
            "facegate_capture_not_ready_total",
            "Capture attempts where the video was not ready",
        )?;
        let in_flight = IntGauge::new(
            "facegate_validation_in_flight",
            "Whether a validation request is outstanding (1=yes)",
        )?;

        let attempts_total = IntCounter::new(
            "facegate_validation_attempts_total",
            "Snapshots dispatched to the validation endpoint",
        )?;
        let granted_total =
            IntCounter::new("facegate_validation_granted_total", "Access granted results")?;
        let denied_total =
            IntCounter::new("facegate_validation_denied_total", "Access denied results")?;
        let rejected_total = IntCounter::new(
            "facegate_validation_rejected_total",
            "Service-reported validation failures",
        )?;
        let transport_errors_total = IntCounter::new(
            "facegate_validation_transport_errors_total",
            "Network or parse failures talking to the endpoint",
        )?;

        registry.register(Box::new(ticks_total.clone()))?;
        registry.register(Box::new(skipped_in_flight_total.clone()))?;
        registry.register(Box::new(skipped_throttled_total.clone()))?;
        registry.register(Box::new(capture_not_ready_total.clone()))?;
        registry.register(Box::new(in_flight.clone()))?;
        registry.register(Box::new(attempts_total.clone()))?;
        registry.register(Box::new(granted_total.clone()))?;
        registry.register(Box::new(denied_total.clone()))?;
        registry.register(Box::new(rejected_total.clone()))?;
        registry.register(Box::new(transport_errors_total.clone()))?;

        Ok(Self {
            registry,
            ticks_total,
            skipped_in_flight_total,
            skipped_throttled_total,
            capture_not_ready_total,
            in_flight,
            attempts_total,
            granted_total,
            denied_total,
            rejected_total,
            transport_errors_total,
        })
    }

    /// Records one tick and its admission decision.
    pub fn record_tick(&self, admission: Admission) {
        self.ticks_total.inc();
        match admission {
            Admission::InFlight => self.skipped_in_flight_total.inc(),
            Admission::Throttled => self.skipped_throttled_total.inc(),
            Admission::Proceed | Admission::Inactive => {}
        }
    }

    /// Counts an admitted tick whose capture yielded nothing.
    pub fn record_capture_not_ready(&self) {
        self.capture_not_ready_total.inc();
    }

    /// Counts a dispatched snapshot.
    pub fn record_attempt(&self) {
        self.attempts_total.inc();
    }

    /// Counts the outcome of one transport call.
    pub fn record_outcome(&self, outcome: &Result<ValidationOutcome, TransportError>) {
        match outcome {
            Ok(ValidationOutcome::Completed(result)) if result.granted => self.granted_total.inc(),
            Ok(ValidationOutcome::Completed(_)) => self.denied_total.inc(),
            Ok(ValidationOutcome::Rejected { .. }) => self.rejected_total.inc(),
            Err(_) => self.transport_errors_total.inc(),
        }
    }

    /// Updates the in-flight gauge.
    pub fn set_in_flight(&self, in_flight: bool) {
        self.in_flight.set(if in_flight { 1 } else { 0 });
    }

    /// Reads every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ticks: self.ticks_total.get(),
            skipped_in_flight: self.skipped_in_flight_total.get(),
            skipped_throttled: self.skipped_throttled_total.get(),
            capture_not_ready: self.capture_not_ready_total.get(),
            attempts: self.attempts_total.get(),
            granted: self.granted_total.get(),
            denied: self.denied_total.get(),
            rejected: self.rejected_total.get(),
            transport_errors: self.transport_errors_total.get(),
            in_flight: self.in_flight.get() != 0,
        }
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ValidationResult;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_tick_admissions() {
        let registry = MetricsRegistry::new().unwrap();

        registry.record_tick(Admission::Proceed);
        registry.record_tick(Admission::InFlight);
        registry.record_tick(Admission::Throttled);
        registry.record_tick(Admission::Throttled);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.ticks, 4);
        assert_eq!(snapshot.skipped_in_flight, 1);
        assert_eq!(snapshot.skipped_throttled, 2);
    }

    #[test]
    fn test_outcomes() {
        let registry = MetricsRegistry::new().unwrap();
        let granted = ValidationResult {
            granted: true,
            liveness_passed: true,
            confidence: 0.9,
            user_id: None,
            user_name: None,
            passage_count: None,
            message: None,
        };

        registry.record_outcome(&Ok(ValidationOutcome::Completed(granted)));
        registry.record_outcome(&Ok(ValidationOutcome::Rejected { message: None }));
        registry.record_outcome(&Err(TransportError::Request("refused".into())));
        registry.set_in_flight(true);

        let output = registry.encode().unwrap();
        assert!(output.contains("facegate_validation_granted_total 1"));
        assert!(output.contains("facegate_validation_rejected_total 1"));
        assert!(output.contains("facegate_validation_transport_errors_total 1"));
        assert!(output.contains("facegate_validation_in_flight 1"));
    }

    #[test]
    fn test_clones_share_counters() {
        let registry = MetricsRegistry::new().unwrap();
        let clone = registry.clone();
        clone.record_attempt();
        assert_eq!(registry.snapshot().attempts, 1);
    }
}
