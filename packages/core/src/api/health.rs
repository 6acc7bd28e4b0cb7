use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::ApiState;
use crate::monitoring::HealthStatus;

/// Liveness of the monitor process itself.
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))],
        "ok",
    )
}

/// System health across every monitored queue. Answers 503 when the
/// system is critical so load balancers can act on it.
pub async fn queue_health(State(state): State<ApiState>) -> Response {
    let health = state.monitor.get_system_health().await;
    let status = if health.overall_status == HealthStatus::Critical {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        status,
        [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))],
        Json(health),
    )
        .into_response()
}
