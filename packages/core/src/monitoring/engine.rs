//! Queue Monitor - the reporting surface over the monitoring core

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::{Mutex, RwLock};

use crate::alerts::{AlertEngine, SharedAlertEngine};
use crate::metrics::AppMetrics;
use crate::monitoring::{
    aggregator::SystemAggregator,
    config::MonitorConfig,
    dashboard::DashboardReporter,
    error::{MonitorError, MonitorResult},
    provider::{with_timeout, SharedProvider},
    scorer::HealthScorer,
    types::*,
};
use crate::scheduler::{self, MonitoringLoop, ProbeContext, ProbeOutcome};
use crate::store::{MetricStore, SharedMetricStore};

/// Alerts included in a monitoring report.
const REPORT_ALERT_LIMIT: usize = 50;

/// Owns the monitoring state for one process and exposes every read and
/// control operation callers need.
///
/// State is in memory only and starts empty; `reset` returns it to that
/// state without touching the registered queues.
pub struct QueueMonitor {
    config: MonitorConfig,
    provider: SharedProvider,
    queues: Arc<RwLock<Vec<String>>>,
    store: SharedMetricStore,
    alerts: SharedAlertEngine,
    scorer: HealthScorer,
    aggregator: SystemAggregator,
    reporter: DashboardReporter,
    monitoring_loop: Mutex<MonitoringLoop>,
    metrics: Option<Arc<AppMetrics>>,
}

impl QueueMonitor {
    /// Create a monitor over `queues`, kept in the given registration order.
    pub fn new(provider: SharedProvider, queues: Vec<String>, config: MonitorConfig) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(queues.len());
        for queue in queues {
            if !unique.contains(&queue) {
                unique.push(queue);
            }
        }

        let store = MetricStore::shared(config.metric_capacity);
        let alerts = AlertEngine::shared(config.alert_capacity);
        let scorer = HealthScorer::new(provider.clone(), store.clone(), config.clone());

        tracing::info!(
            provider = provider.provider_name(),
            queues = unique.len(),
            "Queue monitor initialised"
        );

        Self {
            reporter: DashboardReporter::new(config.clone()),
            config,
            provider,
            queues: Arc::new(RwLock::new(unique)),
            store,
            alerts,
            scorer,
            aggregator: SystemAggregator::new(),
            monitoring_loop: Mutex::new(MonitoringLoop::new()),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<AppMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    // ---- registration ----

    /// Add `queue` to the monitored set. Returns `false` if it was already
    /// registered.
    pub async fn register_queue(&self, queue: &str) -> bool {
        let mut queues = self.queues.write().await;
        if queues.iter().any(|q| q == queue) {
            return false;
        }
        queues.push(queue.to_string());
        tracing::info!(queue, "Queue registered for monitoring");
        true
    }

    pub async fn queue_names(&self) -> Vec<String> {
        self.queues.read().await.clone()
    }

    async fn ensure_registered(&self, queue: &str) -> MonitorResult<()> {
        if self.queues.read().await.iter().any(|q| q == queue) {
            Ok(())
        } else {
            Err(MonitorError::unknown_queue(queue))
        }
    }

    // ---- job metrics ----

    /// Store a finished job and run the per-job alert rules against it.
    pub async fn record_job_metric(&self, sample: PerformanceSample) -> MonitorResult<Vec<Alert>> {
        if sample.job_name.is_empty() {
            return Err(MonitorError::invalid_sample("job name must not be empty"));
        }
        self.ensure_registered(&sample.queue_name).await?;

        let alerts = self.alerts.write().await.evaluate_sample(&sample);

        let stored = {
            let mut store = self.store.write().await;
            store.record(sample);
            store.len()
        };

        if let Some(metrics) = &self.metrics {
            metrics.samples_stored.set(stored as f64);
            metrics.observe_alerts(&alerts);
        }

        Ok(alerts)
    }

    /// Samples for `queue` from the last `window_hours`, oldest first.
    pub async fn get_queue_metrics(
        &self,
        queue: &str,
        window_hours: u64,
    ) -> MonitorResult<Vec<PerformanceSample>> {
        self.ensure_registered(queue).await?;
        Ok(self.store.read().await.query(queue, window_hours))
    }

    pub async fn get_queue_performance(&self, queue: &str) -> MonitorResult<PerformanceSummary> {
        self.ensure_registered(queue).await?;
        Ok(self
            .store
            .read()
            .await
            .summary(queue, self.config.performance_window_minutes))
    }

    pub async fn clear_metrics(&self, queue: Option<&str>) -> MonitorResult<usize> {
        if let Some(queue) = queue {
            self.ensure_registered(queue).await?;
        }
        let removed = self.store.write().await.clear(queue);
        if let Some(metrics) = &self.metrics {
            metrics.samples_stored.set(self.store.read().await.len() as f64);
        }
        Ok(removed)
    }

    // ---- health ----

    pub async fn get_queue_health(&self, queue: &str) -> MonitorResult<HealthCheck> {
        self.ensure_registered(queue).await?;
        Ok(self.scorer.score(queue).await)
    }

    /// Score every queue concurrently, in registration order.
    async fn collect_health(&self) -> (Vec<HealthCheck>, HashMap<String, QueueStats>) {
        let queues = self.queue_names().await;
        let results = join_all(queues.iter().map(|q| self.scorer.score_with_stats(q))).await;

        let mut checks = Vec::with_capacity(results.len());
        let mut stats = HashMap::new();
        for (check, queue_stats) in results {
            if let Some(queue_stats) = queue_stats {
                stats.insert(check.queue_name.clone(), queue_stats);
            }
            checks.push(check);
        }
        (checks, stats)
    }

    async fn system_health_with_stats(&self) -> (SystemHealth, HashMap<String, QueueStats>) {
        let (checks, stats) = self.collect_health().await;
        let health = self.aggregator.aggregate(checks, &stats);

        if let Some(metrics) = &self.metrics {
            metrics.observe_health(&health);
        }
        if health.overall_status != HealthStatus::Healthy {
            tracing::warn!(
                score = health.overall_score,
                critical = health.system_metrics.critical_queues,
                warning = health.system_metrics.warning_queues,
                "System health degraded"
            );
        }

        (health, stats)
    }

    /// Always succeeds: unreachable queues show up as critical entries.
    pub async fn get_system_health(&self) -> SystemHealth {
        self.system_health_with_stats().await.0
    }

    pub async fn get_monitoring_report(&self) -> MonitoringReport {
        let system_health = self.get_system_health().await;

        let performance = {
            let store = self.store.read().await;
            system_health
                .queues
                .iter()
                .map(|check| QueuePerformance {
                    queue_name: check.queue_name.clone(),
                    performance: store
                        .summary(&check.queue_name, self.config.performance_window_minutes),
                })
                .collect()
        };

        let recent_alerts = self.alerts.read().await.get(None, Some(REPORT_ALERT_LIMIT));

        MonitoringReport {
            generated_at: Utc::now(),
            monitoring_active: self.is_monitoring().await,
            alert_counts: AlertCounts::tally(&recent_alerts),
            recent_alerts,
            performance,
            system_health,
        }
    }

    pub async fn get_dashboard_data(&self) -> DashboardData {
        let (health, stats) = self.system_health_with_stats().await;
        let store = self.store.read().await;
        let alerts = self.alerts.read().await;
        self.reporter.build(health, &stats, &store, &alerts)
    }

    pub async fn get_real_time_metrics(&self) -> RealTimeMetrics {
        let queues = self.queue_names().await;
        let timeout = self.config.probe_timeout();

        let probes = join_all(queues.into_iter().map(|queue| async move {
            let stats = with_timeout(&queue, timeout, self.provider.get_stats(&queue))
                .await
                .ok();
            (queue, stats)
        }))
        .await;

        let store = self.store.read().await;
        let alerts = self.alerts.read().await;
        self.reporter.real_time(&probes, &store, &alerts)
    }

    // ---- alerts ----

    /// Alerts newest first, optionally for one queue and capped at `limit`.
    pub async fn get_queue_alerts(
        &self,
        queue: Option<&str>,
        limit: Option<usize>,
    ) -> MonitorResult<Vec<Alert>> {
        if let Some(queue) = queue {
            self.ensure_registered(queue).await?;
        }
        Ok(self.alerts.read().await.get(queue, limit))
    }

    pub async fn clear_alerts(&self, queue: Option<&str>) -> MonitorResult<usize> {
        if let Some(queue) = queue {
            self.ensure_registered(queue).await?;
        }
        let removed = self.alerts.write().await.clear(queue);
        tracing::info!(queue = queue.unwrap_or("*"), removed, "Alerts cleared");
        Ok(removed)
    }

    // ---- monitoring loop ----

    fn probe_context(&self) -> ProbeContext {
        ProbeContext {
            provider: self.provider.clone(),
            queues: self.queues.clone(),
            store: self.store.clone(),
            alerts: self.alerts.clone(),
            probe_timeout: self.config.probe_timeout(),
            performance_window_minutes: self.config.performance_window_minutes,
            metrics: self.metrics.clone(),
        }
    }

    /// Start periodic probing. Returns `Ok(false)` if monitoring was
    /// already running.
    pub async fn start_monitoring(&self, interval_ms: u64) -> MonitorResult<bool> {
        if interval_ms == 0 {
            return Err(MonitorError::InvalidInterval);
        }
        let ctx = self.probe_context();
        Ok(self
            .monitoring_loop
            .lock()
            .await
            .start(ctx, Duration::from_millis(interval_ms)))
    }

    pub async fn stop_monitoring(&self) {
        self.monitoring_loop.lock().await.stop();
    }

    pub async fn is_monitoring(&self) -> bool {
        self.monitoring_loop.lock().await.is_running()
    }

    /// Run one probe cycle now, exactly as a timer tick would.
    pub async fn probe_once(&self) -> Vec<ProbeOutcome> {
        scheduler::probe_once(&self.probe_context()).await
    }

    /// Drop all samples and alerts.
    pub async fn reset(&self) {
        self.store.write().await.clear(None);
        self.alerts.write().await.clear(None);
        tracing::info!("Monitoring state reset");
    }

    // ---- queue control ----

    pub async fn pause_queue(&self, queue: &str) -> MonitorResult<()> {
        self.ensure_registered(queue).await?;
        self.provider.pause(queue).await?;
        tracing::info!(queue, "Queue paused");
        Ok(())
    }

    pub async fn resume_queue(&self, queue: &str) -> MonitorResult<()> {
        self.ensure_registered(queue).await?;
        self.provider.resume(queue).await?;
        tracing::info!(queue, "Queue resumed");
        Ok(())
    }

    pub async fn clean_queue(&self, queue: &str, grace_ms: u64, status: &str) -> MonitorResult<u64> {
        self.ensure_registered(queue).await?;
        let removed = self.provider.clean(queue, grace_ms, status).await?;
        tracing::info!(queue, status, removed, "Queue cleaned");
        Ok(removed)
    }
}
