//! HTTP exporter for the validation loop.
//!
//! - `GET /metrics`: Prometheus text format
//! - `GET /health`: JSON summary of the loop counters
//! - `GET /status`: the current validation status as one display line

use crate::metrics::MetricsRegistry;
use crate::status::{StatusView, ValidationStatus};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;

/// Exporter failures.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind metrics listener: {0}")]
    /// The listen address could not be bound.
    Bind(#[from] std::io::Error),

    #[error("metrics server stopped: {0}")]
    /// The server stopped with an error.
    Server(String),
}

#[derive(Clone)]
struct ExporterState {
    metrics: MetricsRegistry,
    status: Option<watch::Receiver<ValidationStatus>>,
}

/// Serves the loop's metrics and status over HTTP.
pub struct MetricsServer {
    bind_addr: SocketAddr,
    state: ExporterState,
}

impl MetricsServer {
    /// Exporter for `metrics` listening on `bind_addr`.
    pub fn new(bind_addr: SocketAddr, metrics: MetricsRegistry) -> Self {
        Self {
            bind_addr,
            state: ExporterState {
                metrics,
                status: None,
            },
        }
    }

    /// Also serve `/status` from the given status subscription.
    pub fn with_status(mut self, status: watch::Receiver<ValidationStatus>) -> Self {
        self.state.status = Some(status);
        self
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .route("/status", get(status_handler))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Serves until the listener fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(self.bind_addr).await?;
        tracing::info!(addr = %self.bind_addr, "Metrics exporter listening");

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Server(e.to_string()))
    }
}

async fn metrics_handler(State(state): State<ExporterState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {}", e),
        ),
    }
}

async fn health_handler(State(state): State<ExporterState>) -> Json<serde_json::Value> {
    let totals = state.metrics.snapshot();
    Json(serde_json::json!({
        "ok": true,
        "in_flight": totals.in_flight,
        "attempts": totals.attempts,
        "granted": totals.granted,
        "transport_errors": totals.transport_errors,
    }))
}

async fn status_handler(State(state): State<ExporterState>) -> (StatusCode, String) {
    match state.status {
        Some(status) => {
            let view = StatusView::from_status(&status.borrow());
            (StatusCode::OK, view.to_string())
        }
        None => (StatusCode::NOT_FOUND, "status not exported".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{TransportError, ValidationResult};

    fn exporter_state(status: Option<watch::Receiver<ValidationStatus>>) -> ExporterState {
        ExporterState {
            metrics: MetricsRegistry::new().unwrap(),
            status,
        }
    }

    #[tokio::test]
    async fn test_metrics_handler_encodes_registry() {
        let state = exporter_state(None);
        state.metrics.record_attempt();

        let response = metrics_handler(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_reports_counters() {
        let state = exporter_state(None);
        state.metrics.record_attempt();
        state
            .metrics
            .record_outcome(&Err(TransportError::Request("refused".into())));

        let Json(body) = health_handler(State(state)).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["attempts"], 1);
        assert_eq!(body["transport_errors"], 1);
        assert_eq!(body["granted"], 0);
    }

    #[tokio::test]
    async fn test_status_route_renders_current_status() {
        let (tx, rx) = watch::channel(ValidationStatus::default());
        tx.send_replace(ValidationStatus::Success(ValidationResult {
            granted: true,
            liveness_passed: true,
            confidence: 0.92,
            user_id: Some(1),
            user_name: Some("Ana".to_string()),
            passage_count: Some(4),
            message: None,
        }));

        let (code, body) = status_handler(State(exporter_state(Some(rx)))).await;
        assert_eq!(code, StatusCode::OK);
        assert!(body.contains("user=Ana"), "{}", body);
        assert!(body.contains("92.0%"), "{}", body);
    }

    #[tokio::test]
    async fn test_status_route_without_subscription() {
        let (code, _) = status_handler(State(exporter_state(None))).await;
        assert_eq!(code, StatusCode::NOT_FOUND);
    }
}
