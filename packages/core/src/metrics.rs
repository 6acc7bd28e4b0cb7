//! Prometheus metrics registry for the queue monitor.
//!
//! [`AppMetrics`] owns all registered metrics and the [`Registry`] they
//! belong to. Construct it once at startup, wrap in `Arc`, and pass it
//! to the monitor and HTTP middleware.
//!
//! Exposed at `GET /metrics` in Prometheus text exposition format
//! (`text/plain; version=0.0.4`).

use prometheus::{
    Counter, CounterVec, Gauge, GaugeVec, Histogram, HistogramOpts, Opts, Registry,
};

use crate::monitoring::types::{Alert, SystemHealth};

/// All application-level Prometheus metrics.
pub struct AppMetrics {
    /// Total number of queue probes (success + failure).
    pub probes_total: Counter,
    /// Total number of failed or timed-out queue probes.
    pub probe_errors_total: Counter,
    /// Current number of job samples held in the metric store.
    pub samples_stored: Gauge,
    /// Alerts raised, labelled by severity.
    pub alerts_raised_total: CounterVec,
    /// Latest system-wide health score (0-100).
    pub system_health_score: Gauge,
    /// Latest per-queue health score, labelled by queue.
    pub queue_health_score: GaugeVec,
    /// HTTP request count, labelled by method, path, and status code.
    pub http_requests_total: CounterVec,
    /// HTTP request latency histogram in seconds.
    pub http_request_duration: Histogram,
    /// The registry that owns all of the above metrics.
    pub registry: Registry,
}

impl AppMetrics {
    /// Create and register all metrics. Returns an error if any metric
    /// name is invalid or duplicated (should not happen in practice).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let probes_total = Counter::with_opts(Opts::new(
            "queue_monitor_probes_total",
            "Total queue probes",
        ))?;

        let probe_errors_total = Counter::with_opts(Opts::new(
            "queue_monitor_probe_errors_total",
            "Failed or timed-out queue probes",
        ))?;

        let samples_stored = Gauge::with_opts(Opts::new(
            "queue_monitor_samples_stored",
            "Current size of the job metric store",
        ))?;

        let alerts_raised_total = CounterVec::new(
            Opts::new("queue_monitor_alerts_raised_total", "Alerts raised by severity"),
            &["severity"],
        )?;

        let system_health_score = Gauge::with_opts(Opts::new(
            "queue_monitor_system_health_score",
            "Latest system-wide health score",
        ))?;

        let queue_health_score = GaugeVec::new(
            Opts::new("queue_monitor_queue_health_score", "Latest health score per queue"),
            &["queue"],
        )?;

        let http_requests_total = CounterVec::new(
            Opts::new(
                "queue_monitor_http_requests_total",
                "HTTP requests by method, path, and status",
            ),
            &["method", "path", "status"],
        )?;

        let http_request_duration = Histogram::with_opts(
            HistogramOpts::new(
                "queue_monitor_http_request_duration_seconds",
                "HTTP request latency in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;

        registry.register(Box::new(probes_total.clone()))?;
        registry.register(Box::new(probe_errors_total.clone()))?;
        registry.register(Box::new(samples_stored.clone()))?;
        registry.register(Box::new(alerts_raised_total.clone()))?;
        registry.register(Box::new(system_health_score.clone()))?;
        registry.register(Box::new(queue_health_score.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration.clone()))?;

        Ok(Self {
            probes_total,
            probe_errors_total,
            samples_stored,
            alerts_raised_total,
            system_health_score,
            queue_health_score,
            http_requests_total,
            http_request_duration,
            registry,
        })
    }

    pub fn observe_alerts(&self, alerts: &[Alert]) {
        for alert in alerts {
            self.alerts_raised_total
                .with_label_values(&[alert.severity.as_str()])
                .inc();
        }
    }

    pub fn observe_health(&self, health: &SystemHealth) {
        self.system_health_score.set(f64::from(health.overall_score));
        for check in &health.queues {
            self.queue_health_score
                .with_label_values(&[check.queue_name.as_str()])
                .set(f64::from(check.score));
        }
    }

    /// Render all metrics as Prometheus text format (for the `/metrics` endpoint).
    pub fn render(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap_or_default())
    }
}
