//! HTTP surface for the queue monitor.
//!
//! Routes:
//! - `GET /health`, `GET /health/queues`
//! - `GET /metrics`
//! - everything under `/monitoring` (see [`monitoring`])

pub mod health;
pub mod middleware;
pub mod monitoring;

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::metrics::AppMetrics;
use crate::monitoring::{MonitorError, QueueMonitor};

/// Shared state for every route.
#[derive(Clone)]
pub struct ApiState {
    pub monitor: Arc<QueueMonitor>,
    pub metrics: Arc<AppMetrics>,
}

/// Error shape returned by every fallible handler.
pub type ApiError = (StatusCode, Json<Value>);

/// Map a monitor error onto a status code and `{"error": ...}` body.
pub fn error_response(err: MonitorError) -> ApiError {
    let status = match &err {
        MonitorError::UnknownQueue { .. } => StatusCode::NOT_FOUND,
        MonitorError::InvalidInterval | MonitorError::InvalidSample { .. } => {
            StatusCode::BAD_REQUEST
        }
        MonitorError::Provider(_) => StatusCode::BAD_GATEWAY,
    };

    if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
    }

    (status, Json(serde_json::json!({ "error": err.to_string() })))
}

/// Build the full application router.
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/queues", get(health::queue_health))
        .route("/metrics", get(render_metrics))
        .merge(monitoring::create_monitoring_router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::track_http_metrics,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `GET /metrics` - Prometheus text exposition.
async fn render_metrics(State(state): State<ApiState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            Body::from(body),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics error").into_response()
        }
    }
}
