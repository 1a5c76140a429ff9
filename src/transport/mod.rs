//! Validation transport.
//!
//! Sends one encoded snapshot to the recognition service and returns a
//! structured outcome. The recognition algorithm itself is opaque: this
//! module only knows the wire contract of `POST /api/validate`.
//!
//! Outcomes are split three ways, matching how the status display treats
//! them:
//!
//! - [`ValidationOutcome::Completed`] - the service ran and answered
//!   granted or denied
//! - [`ValidationOutcome::Rejected`] - the service answered with
//!   `success: false` (no face found, bad request, internal error)
//! - [`TransportError`] - the answer never arrived or could not be parsed

mod http;
mod wire;

pub use http::{HttpTransport, TransportConfig};
pub use wire::{ValidateRequest, ValidateResponse};

use crate::capture::CaptureFrame;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while talking to the validation endpoint.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    /// The request could not be sent or the body read.
    Request(String),
    #[error("endpoint returned HTTP {status}")]
    /// Non-2xx reply without a parseable body.
    Status {
        /// HTTP status code.
        status: u16,
    },
    #[error("malformed response: {0}")]
    /// The body was not the expected JSON.
    Malformed(#[from] serde_json::Error),
    #[error("transport worker failed: {0}")]
    /// The blocking worker panicked or was cancelled.
    Worker(String),
}

/// Result of one recognition attempt, as reported by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether access was granted.
    pub granted: bool,
    /// Whether the subject passed the liveness check.
    pub liveness_passed: bool,
    /// Match confidence in `[0, 1]`.
    pub confidence: f64,
    /// Matched user, if any.
    pub user_id: Option<u64>,
    /// Display name of the matched user.
    pub user_name: Option<String>,
    /// Passages recorded for the user, including this one.
    pub passage_count: Option<u32>,
    /// Free-form message from the service.
    pub message: Option<String>,
}

/// What the service answered.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// The service ran and decided.
    Completed(ValidationResult),
    /// The service reported `success: false`.
    Rejected {
        /// Reason given by the service, if any.
        message: Option<String>,
    },
}

/// Sends snapshots to the validation endpoint.
#[async_trait]
pub trait ValidationTransport: Send + Sync {
    /// Submits one snapshot. No retries; the next scheduler tick is the retry.
    async fn validate(&self, frame: CaptureFrame) -> Result<ValidationOutcome, TransportError>;
}
