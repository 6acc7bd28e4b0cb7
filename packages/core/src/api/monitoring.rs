//! Monitoring API endpoints
//!
//! Routes:
//! - `GET    /monitoring/report`
//! - `GET    /monitoring/dashboard`
//! - `GET    /monitoring/realtime`
//! - `GET    /monitoring/queues/:name/health`
//! - `GET    /monitoring/queues/:name/metrics?hours=`
//! - `POST   /monitoring/queues/:name/pause` and `/resume`
//! - `POST   /monitoring/queues/:name/clean`
//! - `GET    /monitoring/alerts?queue=&limit=`
//! - `DELETE /monitoring/alerts?queue=`
//! - `POST   /monitoring/jobs`
//! - `POST   /monitoring/start`, `POST /monitoring/stop`

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{error_response, ApiError, ApiState};
use crate::monitoring::types::*;

/// Default window for `GET /monitoring/queues/:name/metrics`.
const DEFAULT_METRICS_HOURS: u64 = 24;

pub fn create_monitoring_router() -> Router<ApiState> {
    Router::new()
        .route("/monitoring/report", get(get_report))
        .route("/monitoring/dashboard", get(get_dashboard))
        .route("/monitoring/realtime", get(get_realtime))
        .route("/monitoring/queues/:name/health", get(get_queue_health))
        .route("/monitoring/queues/:name/metrics", get(get_queue_metrics))
        .route("/monitoring/queues/:name/pause", post(pause_queue))
        .route("/monitoring/queues/:name/resume", post(resume_queue))
        .route("/monitoring/queues/:name/clean", post(clean_queue))
        .route("/monitoring/alerts", get(get_alerts).delete(clear_alerts))
        .route("/monitoring/jobs", post(record_job))
        .route("/monitoring/start", post(start_monitoring))
        .route("/monitoring/stop", post(stop_monitoring))
}

// ---- Request / response shapes ----

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    pub hours: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct QueueMetricsResponse {
    pub queue_name: String,
    pub window_hours: u64,
    pub performance: PerformanceSummary,
    pub samples: Vec<PerformanceSample>,
}

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    pub queue: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RecordJobRequest {
    pub queue_name: String,
    pub job_name: String,
    pub duration_ms: u64,
    pub success: bool,
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    pub timestamp: Option<DateTime<Utc>>,
}

fn default_attempts() -> u32 {
    1
}

#[derive(Debug, Serialize)]
pub struct RecordJobResponse {
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    pub interval_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct MonitoringStateResponse {
    pub monitoring_active: bool,
    pub started: bool,
}

#[derive(Debug, Deserialize)]
pub struct CleanRequest {
    #[serde(default)]
    pub grace_ms: u64,
    pub status: String,
}

// ---- Reports ----

async fn get_report(State(state): State<ApiState>) -> Json<MonitoringReport> {
    Json(state.monitor.get_monitoring_report().await)
}

async fn get_dashboard(State(state): State<ApiState>) -> Json<DashboardData> {
    Json(state.monitor.get_dashboard_data().await)
}

async fn get_realtime(State(state): State<ApiState>) -> Json<RealTimeMetrics> {
    Json(state.monitor.get_real_time_metrics().await)
}

// ---- Per-queue ----

async fn get_queue_health(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<Json<HealthCheck>, ApiError> {
    state
        .monitor
        .get_queue_health(&name)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn get_queue_metrics(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Query(params): Query<MetricsQuery>,
) -> Result<Json<QueueMetricsResponse>, ApiError> {
    let window_hours = params.hours.unwrap_or(DEFAULT_METRICS_HOURS);

    let (samples, performance) = tokio::try_join!(
        state.monitor.get_queue_metrics(&name, window_hours),
        state.monitor.get_queue_performance(&name),
    )
    .map_err(error_response)?;

    Ok(Json(QueueMetricsResponse {
        queue_name: name,
        window_hours,
        performance,
        samples,
    }))
}

async fn pause_queue(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.monitor.pause_queue(&name).await.map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn resume_queue(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.monitor.resume_queue(&name).await.map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clean_queue(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Json(body): Json<CleanRequest>,
) -> Result<Json<Value>, ApiError> {
    let removed = state
        .monitor
        .clean_queue(&name, body.grace_ms, &body.status)
        .await
        .map_err(error_response)?;
    Ok(Json(serde_json::json!({ "removed": removed })))
}

// ---- Alerts ----

async fn get_alerts(
    State(state): State<ApiState>,
    Query(params): Query<AlertsQuery>,
) -> Result<Json<Vec<Alert>>, ApiError> {
    state
        .monitor
        .get_queue_alerts(params.queue.as_deref(), params.limit)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn clear_alerts(
    State(state): State<ApiState>,
    Query(params): Query<AlertsQuery>,
) -> Result<Json<Value>, ApiError> {
    let cleared = state
        .monitor
        .clear_alerts(params.queue.as_deref())
        .await
        .map_err(error_response)?;
    Ok(Json(serde_json::json!({ "cleared": cleared })))
}

// ---- Job samples ----

async fn record_job(
    State(state): State<ApiState>,
    Json(body): Json<RecordJobRequest>,
) -> Result<(StatusCode, Json<RecordJobResponse>), ApiError> {
    let sample = PerformanceSample {
        queue_name: body.queue_name,
        job_name: body.job_name,
        duration_ms: body.duration_ms,
        success: body.success,
        attempts: body.attempts,
        timestamp: body.timestamp.unwrap_or_else(Utc::now),
    };

    let alerts = state
        .monitor
        .record_job_metric(sample)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::ACCEPTED, Json(RecordJobResponse { alerts })))
}

// ---- Monitoring loop ----

async fn start_monitoring(
    State(state): State<ApiState>,
    Json(body): Json<StartRequest>,
) -> Result<Json<MonitoringStateResponse>, ApiError> {
    let interval_ms = body
        .interval_ms
        .unwrap_or(state.monitor.config().default_interval_ms);

    let started = state
        .monitor
        .start_monitoring(interval_ms)
        .await
        .map_err(error_response)?;

    Ok(Json(MonitoringStateResponse {
        monitoring_active: state.monitor.is_monitoring().await,
        started,
    }))
}

async fn stop_monitoring(State(state): State<ApiState>) -> Json<MonitoringStateResponse> {
    state.monitor.stop_monitoring().await;
    Json(MonitoringStateResponse {
        monitoring_active: false,
        started: false,
    })
}
