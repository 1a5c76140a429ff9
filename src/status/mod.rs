//! Validation status state machine.
//!
//! Converts transport outcomes into the single status value shown to the
//! user. A granted access is displayed for a fixed period and then falls
//! back to `Waiting`; every other state stays until the next outcome
//! overwrites it.

mod view;

pub use view::StatusView;

use crate::transport::{TransportError, ValidationOutcome, ValidationResult};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Message shown when a granted result expires.
pub const CONTINUOUS_DETECTION_MESSAGE: &str = "continuous detection active";
/// Fallback for a completed but denied validation.
pub const ACCESS_DENIED_MESSAGE: &str = "access denied";
/// Shown for network and parse failures.
pub const CONNECTION_ERROR_MESSAGE: &str = "connection error";
/// Fallback for a service-reported failure.
pub const VALIDATION_ERROR_MESSAGE: &str = "validation error";

/// Default display time for a granted result.
pub const DEFAULT_SUCCESS_RESET: Duration = Duration::from_millis(3000);

/// UI-facing validation status.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationStatus {
    /// Idle, waiting for the next result.
    Waiting {
        /// Hint shown while waiting.
        message: Option<String>,
    },
    /// A request is outstanding.
    Processing,
    /// Access granted; reverts to `Waiting` after the reset period.
    Success(ValidationResult),
    /// Denial, service failure or connection error, with its message.
    Error(String),
}

impl Default for ValidationStatus {
    fn default() -> Self {
        ValidationStatus::Waiting { message: None }
    }
}

impl ValidationStatus {
    /// Whether this is a `Waiting` status.
    pub fn is_waiting(&self) -> bool {
        matches!(self, ValidationStatus::Waiting { .. })
    }
}

/// Owns the current [`ValidationStatus`] and publishes every transition.
pub struct StatusStateMachine {
    status: watch::Sender<ValidationStatus>,
    reset_after: Duration,
    reset_at: Option<Instant>,
}

impl StatusStateMachine {
    /// Starts in `Waiting`; granted results reset after `reset_after`.
    pub fn new(reset_after: Duration) -> Self {
        let (status, _) = watch::channel(ValidationStatus::default());
        Self {
            status,
            reset_after,
            reset_at: None,
        }
    }

    /// Subscribes to transitions.
    pub fn subscribe(&self) -> watch::Receiver<ValidationStatus> {
        self.status.subscribe()
    }

    /// The status currently shown.
    pub fn current(&self) -> ValidationStatus {
        self.status.borrow().clone()
    }

    /// When the pending success reset fires, if one is scheduled.
    pub fn reset_deadline(&self) -> Option<Instant> {
        self.reset_at
    }

    /// Shows `Processing` while a request is outstanding.
    pub fn mark_processing(&mut self) {
        self.transition(ValidationStatus::Processing);
    }

    /// Applies the outcome of one transport call.
    pub fn apply(
        &mut self,
        outcome: Result<ValidationOutcome, TransportError>,
        now: Instant,
    ) {
        let next = match outcome {
            Ok(ValidationOutcome::Completed(result)) if result.granted => {
                tracing::info!(
                    user = result.user_name.as_deref().unwrap_or("-"),
                    confidence = result.confidence,
                    passages = ?result.passage_count,
                    "Access granted"
                );
                self.transition(ValidationStatus::Success(result));
                self.reset_at = Some(now + self.reset_after);
                return;
            }
            Ok(ValidationOutcome::Completed(result)) => {
                tracing::debug!(
                    liveness = result.liveness_passed,
                    confidence = result.confidence,
                    "Access denied"
                );
                ValidationStatus::Error(
                    result
                        .message
                        .unwrap_or_else(|| ACCESS_DENIED_MESSAGE.to_string()),
                )
            }
            Ok(ValidationOutcome::Rejected { message }) => {
                tracing::debug!(message = ?message, "Validation rejected by service");
                ValidationStatus::Error(
                    message.unwrap_or_else(|| VALIDATION_ERROR_MESSAGE.to_string()),
                )
            }
            Err(e) => {
                tracing::warn!(error = %e, "Validation error");
                ValidationStatus::Error(CONNECTION_ERROR_MESSAGE.to_string())
            }
        };
        self.transition(next);
    }

    /// Fires the success reset if its deadline has passed.
    ///
    /// Returns `true` when the status went back to `Waiting`.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.reset_at {
            Some(deadline) if deadline <= now => {
                self.transition(ValidationStatus::Waiting {
                    message: Some(CONTINUOUS_DETECTION_MESSAGE.to_string()),
                });
                true
            }
            _ => false,
        }
    }

    /// Any transition cancels a pending success reset.
    fn transition(&mut self, next: ValidationStatus) {
        self.reset_at = None;
        self.status.send_replace(next);
    }
}

impl Default for StatusStateMachine {
    fn default() -> Self {
        Self::new(DEFAULT_SUCCESS_RESET)
    }
}
