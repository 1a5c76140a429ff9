//! JSON bodies of the validation endpoint.

use super::{ValidationOutcome, ValidationResult};
use crate::capture::CaptureFrame;
use serde::{Deserialize, Serialize};

/// Request body: `{"image": "<data URI>"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    /// `data:image/jpeg;base64,...` snapshot.
    pub image: String,
}

impl ValidateRequest {
    /// Encodes a snapshot as a data URI body.
    pub fn from_frame(frame: &CaptureFrame) -> Self {
        Self {
            image: frame.to_data_uri(),
        }
    }
}

/// Response body.
///
/// Every field is defaulted: error replies such as `{"detail": "..."}`
/// deserialize as `success == false` with no message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateResponse {
    /// `false` when the service could not validate.
    pub success: bool,
    /// Access decision.
    pub access_granted: bool,
    /// Liveness decision.
    pub liveness_passed: bool,
    /// Match confidence, nominally in `[0, 1]`.
    pub confidence: f64,
    /// Matched user id.
    pub user_id: Option<u64>,
    /// Matched user name.
    pub user_name: Option<String>,
    /// Passages recorded for the user.
    pub passage_count: Option<u32>,
    /// Service message.
    pub message: Option<String>,
}

impl From<ValidateResponse> for ValidationOutcome {
    fn from(response: ValidateResponse) -> Self {
        if !response.success {
            return ValidationOutcome::Rejected {
                message: response.message,
            };
        }
        let confidence = if response.confidence.is_finite() {
            response.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        ValidationOutcome::Completed(ValidationResult {
            granted: response.access_granted,
            liveness_passed: response.liveness_passed,
            confidence,
            user_id: response.user_id,
            user_name: response.user_name,
            passage_count: response.passage_count,
            message: response.message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> ValidationOutcome {
        serde_json::from_str::<ValidateResponse>(body).unwrap().into()
    }

    #[test]
    fn test_granted_response() {
        let outcome = parse(
            r#"{"success":true,"access_granted":true,"liveness_passed":true,
                "confidence":0.92,"user_id":7,"user_name":"Ana","passage_count":4}"#,
        );
        let ValidationOutcome::Completed(result) = outcome else {
            panic!("expected completed outcome");
        };
        assert!(result.granted);
        assert_eq!(result.confidence, 0.92);
        assert_eq!(result.user_id, Some(7));
        assert_eq!(result.user_name.as_deref(), Some("Ana"));
        assert_eq!(result.passage_count, Some(4));
    }

    #[test]
    fn test_null_user_id_is_none() {
        let outcome = parse(
            r#"{"success":true,"access_granted":false,"liveness_passed":false,
                "confidence":0.0,"user_id":null,"message":"Unknown user"}"#,
        );
        let ValidationOutcome::Completed(result) = outcome else {
            panic!("expected completed outcome");
        };
        assert!(!result.granted);
        assert_eq!(result.user_id, None);
        assert_eq!(result.message.as_deref(), Some("Unknown user"));
    }

    #[test]
    fn test_unsuccessful_response_is_rejected() {
        let outcome = parse(r#"{"success":false,"message":"No face detected"}"#);
        assert_eq!(
            outcome,
            ValidationOutcome::Rejected {
                message: Some("No face detected".to_string())
            }
        );
    }

    #[test]
    fn test_error_detail_body_is_rejected_without_message() {
        let outcome = parse(r#"{"detail":"Image not provided"}"#);
        assert_eq!(outcome, ValidationOutcome::Rejected { message: None });
    }

    #[test]
    fn test_confidence_is_clamped() {
        let outcome = parse(r#"{"success":true,"confidence":1.7}"#);
        let ValidationOutcome::Completed(result) = outcome else {
            panic!("expected completed outcome");
        };
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_request_serializes_data_uri() {
        let frame = CaptureFrame::new(vec![1, 2, 3], 480, 360);
        let body = serde_json::to_string(&ValidateRequest::from_frame(&frame)).unwrap();
        assert_eq!(body, r#"{"image":"data:image/jpeg;base64,AQID"}"#);
    }
}
