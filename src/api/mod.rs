//! Thin HTTP surface over [`crate::pipeline::Pipeline`].
//!
//! This is the system's own boundary, not the advertiser-facing web app that
//! would sit in front of it in production — it exists so the core is
//! independently operable and testable over HTTP, standing alone in front of
//! the diagnostic pipeline the same way an edge function fronts an agent.

mod handlers;

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::domain::RcaError;
use crate::observability::{ComponentHealth, HealthCheck, HealthChecker, MetricsRegistry};
use crate::pipeline::Pipeline;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<Pipeline>,
    pub metrics: Arc<MetricsRegistry>,
    pub health: Arc<HealthChecker>,
    pub start_time: Instant,
}

impl ApiState {
    /// Builds state with the session-store health check registered at
    /// startup, the same way any other dependency health check is wired in.
    pub async fn new(
        pipeline: Arc<Pipeline>,
        metrics: Arc<MetricsRegistry>,
        health: Arc<HealthChecker>,
    ) -> Self {
        health
            .register(Arc::new(SessionStoreHealthCheck {
                pipeline: pipeline.clone(),
            }))
            .await;
        Self {
            pipeline,
            metrics,
            health,
            start_time: Instant::now(),
        }
    }
}

struct SessionStoreHealthCheck {
    pipeline: Arc<Pipeline>,
}

#[async_trait::async_trait]
impl HealthCheck for SessionStoreHealthCheck {
    fn name(&self) -> &str {
        "session_store"
    }

    async fn check(&self) -> ComponentHealth {
        let count = self.pipeline.sessions().len().await;
        ComponentHealth::healthy("session_store").with_detail("active_sessions", serde_json::json!(count))
    }

    fn is_critical(&self) -> bool {
        false
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

impl ErrorResponse {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Maps `RcaError` (and a small set of request-shape errors) onto an HTTP
/// status and a structured body.
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse::new("bad_request", message),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorResponse::new("not_found", message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<RcaError> for ApiError {
    fn from(err: RcaError) -> Self {
        let status = match &err {
            RcaError::WindowOutOfRange(_) | RcaError::Validation(_) => StatusCode::BAD_REQUEST,
            RcaError::UnknownTenant(_) | RcaError::SessionExpired(_) => StatusCode::NOT_FOUND,
            RcaError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RcaError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RcaError::InsufficientData(_)
            | RcaError::ModelProtocolViolation(_)
            | RcaError::ProbeInconclusive(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RcaError::Config(_)
            | RcaError::Internal(_)
            | RcaError::Json(_)
            | RcaError::Io(_)
            | RcaError::TomlDe(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let code = match &err {
            RcaError::WindowOutOfRange(_) => "window_out_of_range",
            RcaError::Validation(_) => "validation_failed",
            RcaError::UnknownTenant(_) => "unknown_tenant",
            RcaError::SessionExpired(_) => "session_expired",
            RcaError::Timeout(_) => "timeout",
            RcaError::UpstreamUnavailable(_) => "upstream_unavailable",
            RcaError::InsufficientData(_) => "insufficient_data",
            RcaError::ModelProtocolViolation(_) => "model_protocol_violation",
            RcaError::ProbeInconclusive(_) => "probe_inconclusive",
            _ => "internal_error",
        };
        ApiError {
            status,
            body: ErrorResponse::new(code, err.to_string()),
        }
    }
}

async fn healthz(State(state): State<ApiState>) -> impl IntoResponse {
    let health = state.health.check_health().await;
    let status = if health.status == crate::observability::HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status, Json(health))
}

async fn metrics(State(state): State<ApiState>) -> impl IntoResponse {
    state.metrics.uptime_seconds.set(state.start_time.elapsed().as_secs_f64());
    match state.metrics.export() {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Builds the router without attaching state, so tests can attach a
/// fixture state instead.
pub fn create_router() -> Router<ApiState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/v1/analyze", post(handlers::analyze))
        .route("/v1/sessions/:id/recommend", post(handlers::recommend))
        .route("/v1/sessions/:id/execute", post(handlers::execute))
}

pub fn create_app(state: ApiState) -> Router {
    create_router().with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RcaConfig;
    use crate::observability::config::MetricsConfig;
    use crate::observability::HealthConfig;
    use crate::rca::{DeterministicModelClient, TenantEntry, TenantRegistry};
    use crate::storage::InMemoryMetricStore;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_state() -> ApiState {
        let store = Arc::new(InMemoryMetricStore::new());
        let tenant_registry = TenantRegistry::from_entries(vec![TenantEntry {
            short_code: "acme".into(),
            warehouse_view_id: "view_acme".into(),
        }]);
        let pipeline = Arc::new(Pipeline::new(
            store,
            Arc::new(DeterministicModelClient),
            RcaConfig::default(),
            tenant_registry,
        ));
        ApiState::new(
            pipeline,
            Arc::new(MetricsRegistry::new(MetricsConfig::default()).unwrap()),
            Arc::new(HealthChecker::new(HealthConfig::default())),
        )
        .await
    }

    #[tokio::test]
    async fn healthz_reports_ok_with_no_components() {
        let app = create_app(test_state().await);
        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_prometheus_text() {
        let app = create_app(test_state().await);
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn analyze_rejects_out_of_range_window() {
        let app = create_app(test_state().await);
        let body = serde_json::json!({"tenant": "acme", "window_days": 0});
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/analyze")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn recommend_rejects_unknown_session() {
        let app = create_app(test_state().await);
        let body = serde_json::json!({"use_model_reasoning": false});
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/v1/sessions/{}/recommend", uuid::Uuid::new_v4()))
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
