//! Integration tests for the HTTP surface.
//!
//! Each test boots the full Axum router (same assembly as `main.rs`) using
//! `tower::ServiceExt::oneshot` - no live server or live queue backend needed.
//!
//! `build_test_app()` wires together:
//! - A wiremocked queue admin API serving `email` (busy but healthy) and
//!   `reports` (500 on every call)
//! - A `QueueApiClient` pointed at it
//! - A `QueueMonitor` over both queues
//! - Prometheus `AppMetrics`
//! - The complete `Router<()>` returned ready for `oneshot`

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use queue_monitor::{
    api::{self, ApiState},
    metrics::AppMetrics,
    monitoring::{MonitorConfig, QueueMonitor},
    services::QueueApiClient,
};

// ---- Helpers ----------------------------------------------------------------

async fn mount_backend() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/queues/email/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "waiting": 40, "active": 3, "completed": 950, "failed": 10, "delayed": 2, "paused": 0
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/queues/email/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "healthy": true })))
        .mount(&server)
        .await;
    Mock::given(path("/queues/reports/stats"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(path("/queues/reports/health"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    server
}

async fn build_test_app() -> (Router, Arc<QueueMonitor>, MockServer) {
    let server = mount_backend().await;
    let metrics = Arc::new(AppMetrics::new().unwrap());
    let monitor = Arc::new(
        QueueMonitor::new(
            Arc::new(QueueApiClient::new(server.uri())),
            vec!["email".to_string(), "reports".to_string()],
            MonitorConfig::default(),
        )
        .with_metrics(metrics.clone()),
    );

    let app = api::create_router(ApiState {
        monitor: monitor.clone(),
        metrics,
    });
    (app, monitor, server)
}

async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// ---- GET /health ------------------------------------------------------------

#[tokio::test]
async fn health_returns_200_with_ok_body() {
    let (app, _monitor, _server) = build_test_app().await;
    let resp = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["cache-control"], "no-store");
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"ok");
}

// ---- GET /health/queues -----------------------------------------------------

#[tokio::test]
async fn queue_health_reports_each_queue_in_order() {
    let (app, _monitor, _server) = build_test_app().await;
    let resp = app.oneshot(get("/health/queues")).await.unwrap();

    // email 100 + reports 33 -> 67, warning
    assert_eq!(resp.status(), StatusCode::OK);
    let json = json_body(resp.into_body()).await;
    assert_eq!(json["overall_status"], "warning");
    assert_eq!(json["queues"][0]["queue_name"], "email");
    assert_eq!(json["queues"][0]["status"], "healthy");
    assert_eq!(json["queues"][1]["queue_name"], "reports");
    assert_eq!(json["queues"][1]["status"], "critical");
    assert_eq!(json["system_metrics"]["critical_queues"], 1);
    assert_eq!(json["system_metrics"]["total_jobs"], 1005);
}

#[tokio::test]
async fn queue_health_is_503_when_system_is_critical() {
    let server = mount_backend().await;
    let monitor = Arc::new(QueueMonitor::new(
        Arc::new(QueueApiClient::new(server.uri())),
        vec!["reports".to_string()],
        MonitorConfig::default(),
    ));
    let app = api::create_router(ApiState {
        monitor,
        metrics: Arc::new(AppMetrics::new().unwrap()),
    });

    let resp = app.oneshot(get("/health/queues")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = json_body(resp.into_body()).await;
    assert_eq!(json["overall_status"], "critical");
}

// ---- GET /monitoring/report -------------------------------------------------

#[tokio::test]
async fn report_includes_connection_alert_after_probe() {
    let (app, monitor, _server) = build_test_app().await;
    monitor.probe_once().await;

    let resp = app.oneshot(get("/monitoring/report")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = json_body(resp.into_body()).await;
    assert_eq!(json["monitoring_active"], false);
    assert_eq!(json["alert_counts"]["critical"], 1);
    assert_eq!(json["recent_alerts"][0]["type"], "ConnectionError");
    assert_eq!(json["recent_alerts"][0]["queue_name"], "reports");
    assert_eq!(json["performance"].as_array().unwrap().len(), 2);
}

// ---- GET /monitoring/dashboard ----------------------------------------------

#[tokio::test]
async fn dashboard_returns_all_sections() {
    let (app, _monitor, _server) = build_test_app().await;
    let resp = app.oneshot(get("/monitoring/dashboard")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = json_body(resp.into_body()).await;
    assert_eq!(json["overview"]["total_queues"], 2);
    assert_eq!(json["overview"]["waiting_jobs"], 40);
    assert_eq!(json["performance_trends"].as_array().unwrap().len(), 24);
    assert_eq!(json["top_performers"][0]["queue_name"], "email");
    assert_eq!(json["problematic_queues"][0]["queue_name"], "reports");
    assert_eq!(json["queues"][1]["stats"], Value::Null);
}

// ---- GET /monitoring/realtime -----------------------------------------------

#[tokio::test]
async fn realtime_marks_unreachable_queue_disconnected() {
    let (app, _monitor, _server) = build_test_app().await;
    let resp = app.oneshot(get("/monitoring/realtime")).await.unwrap();

    let json = json_body(resp.into_body()).await;
    assert_eq!(json["queues"][0]["connected"], true);
    assert_eq!(json["queues"][1]["connected"], false);
    assert_eq!(json["total_waiting"], 40);
}

// ---- POST /monitoring/jobs --------------------------------------------------

#[tokio::test]
async fn recorded_jobs_feed_queue_performance() {
    let (app, _monitor, _server) = build_test_app().await;

    for (duration, success) in [(200, true), (400, true), (600, false)] {
        let body = json!({
            "queue_name": "email",
            "job_name": "send-welcome",
            "duration_ms": duration,
            "success": success,
        });
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/monitoring/jobs")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
    }

    let resp = app
        .oneshot(get("/monitoring/queues/email/metrics"))
        .await
        .unwrap();
    let json = json_body(resp.into_body()).await;
    assert_eq!(json["window_hours"], 24);
    assert_eq!(json["samples"].as_array().unwrap().len(), 3);
    assert_eq!(json["performance"]["avg_processing_time_ms"], 400.0);
    assert_eq!(json["performance"]["sample_count"], 3);
}

// ---- /monitoring/alerts -----------------------------------------------------

#[tokio::test]
async fn alerts_for_unknown_queue_return_404() {
    let (app, _monitor, _server) = build_test_app().await;
    let resp = app
        .oneshot(get("/monitoring/alerts?queue=ghost"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json = json_body(resp.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("ghost"));
}

// ---- GET /metrics -----------------------------------------------------------

#[tokio::test]
async fn metrics_endpoint_exposes_health_and_http_series() {
    let (app, _monitor, _server) = build_test_app().await;
    app.clone().oneshot(get("/health/queues")).await.unwrap();

    let resp = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()["content-type"],
        "text/plain; version=0.0.4"
    );

    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("queue_monitor_system_health_score 67"));
    assert!(text.contains(r#"queue_monitor_queue_health_score{queue="reports"} 33"#));
    assert!(text.contains(r#"path="/health/queues""#));
}
