//! HTTP client for the validation endpoint.
//!
//! Requests go through a blocking `ureq` agent on tokio's blocking pool;
//! the completion is delivered back to the caller's task, so the capture
//! loop itself never blocks.

use super::{
    TransportError, ValidateRequest, ValidateResponse, ValidationOutcome, ValidationTransport,
};
use crate::capture::CaptureFrame;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Scheme, host and port of the recognition service.
    pub base_url: String,
    /// Path of the validation endpoint.
    pub validate_path: String,
    /// Cheap GET used by the connection check.
    pub probe_path: String,
    /// Overall per-request timeout.
    pub timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            validate_path: "/api/validate".to_string(),
            probe_path: "/api/stats".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl TransportConfig {
    /// Default paths against another service.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Full URL of the validation endpoint.
    pub fn validate_url(&self) -> String {
        join_url(&self.base_url, &self.validate_path)
    }

    /// Full URL used by the connection check.
    pub fn probe_url(&self) -> String {
        join_url(&self.base_url, &self.probe_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// [`ValidationTransport`] over HTTP/JSON.
#[derive(Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
    validate_url: String,
    probe_url: String,
}

impl HttpTransport {
    /// Builds the agent with the configured timeout.
    pub fn new(config: &TransportConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build();
        Self {
            agent,
            validate_url: config.validate_url(),
            probe_url: config.probe_url(),
        }
    }

    /// URL snapshots are posted to.
    pub fn validate_url(&self) -> &str {
        &self.validate_url
    }

    /// Issues a GET against the probe path and returns the HTTP status.
    ///
    /// Any 2xx is success; other statuses come back as
    /// [`TransportError::Status`].
    pub async fn probe(&self) -> Result<u16, TransportError> {
        let agent = self.agent.clone();
        let url = self.probe_url.clone();
        tokio::task::spawn_blocking(move || match agent.get(&url).call() {
            Ok(response) => Ok(response.status()),
            Err(ureq::Error::Status(status, _)) => Err(TransportError::Status { status }),
            Err(ureq::Error::Transport(e)) => Err(TransportError::Request(e.to_string())),
        })
        .await
        .map_err(|e| TransportError::Worker(e.to_string()))?
    }
}

/// Performs the POST and interprets the body.
///
/// Non-2xx replies are still parsed: the service reports some failures
/// with an error status and a JSON body, and those count as a service
/// rejection rather than a transport failure.
fn post_validate(
    agent: &ureq::Agent,
    url: &str,
    body: &str,
) -> Result<ValidationOutcome, TransportError> {
    let response = agent
        .post(url)
        .set("Content-Type", "application/json")
        .send_string(body);

    match response {
        Ok(response) => {
            let text = response
                .into_string()
                .map_err(|e| TransportError::Request(e.to_string()))?;
            let parsed: ValidateResponse = serde_json::from_str(&text)?;
            Ok(parsed.into())
        }
        Err(ureq::Error::Status(status, response)) => {
            let text = response.into_string().unwrap_or_default();
            serde_json::from_str::<ValidateResponse>(&text)
                .map(Into::into)
                .map_err(|_| TransportError::Status { status })
        }
        Err(ureq::Error::Transport(e)) => Err(TransportError::Request(e.to_string())),
    }
}

#[async_trait]
impl ValidationTransport for HttpTransport {
    async fn validate(&self, frame: CaptureFrame) -> Result<ValidationOutcome, TransportError> {
        let body = serde_json::to_string(&ValidateRequest::from_frame(&frame))?;
        drop(frame);

        let agent = self.agent.clone();
        let url = self.validate_url.clone();
        tokio::task::spawn_blocking(move || post_validate(&agent, &url, &body))
            .await
            .map_err(|e| TransportError::Worker(e.to_string()))?
    }
}
