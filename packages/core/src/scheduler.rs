//! Queue monitoring scheduler.
//!
//! Drives the periodic probe loop: each tick pulls stats for every
//! registered queue from the backend, runs the alert rules against them, and
//! records a `ConnectionError` alert for any queue whose probe fails or times
//! out, so the dashboard and alert history stay current.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::alerts::SharedAlertEngine;
use crate::metrics::AppMetrics;
use crate::monitoring::{
    error::ProviderError,
    provider::{with_timeout, SharedProvider},
    types::{Alert, QueueStats},
};
use crate::store::SharedMetricStore;

/// Everything a probe cycle needs. Cheap to clone.
#[derive(Clone)]
pub struct ProbeContext {
    pub provider: SharedProvider,
    pub queues: Arc<RwLock<Vec<String>>>,
    pub store: SharedMetricStore,
    pub alerts: SharedAlertEngine,
    pub probe_timeout: Duration,
    pub performance_window_minutes: u64,
    pub metrics: Option<Arc<AppMetrics>>,
}

/// Outcome of probing one queue during a tick.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub queue_name: String,
    pub stats: Result<QueueStats, ProviderError>,
    pub alerts: Vec<Alert>,
}

/// Execute a single probe cycle across every registered queue.
///
/// Queues are probed concurrently; a failing or hung queue turns into a
/// `ConnectionError` alert and never stops the others from being probed.
pub async fn probe_once(ctx: &ProbeContext) -> Vec<ProbeOutcome> {
    let queues = ctx.queues.read().await.clone();

    let probes = queues.iter().map(|queue| async move {
        let stats = with_timeout(queue, ctx.probe_timeout, ctx.provider.get_stats(queue)).await;
        (queue.clone(), stats)
    });
    let results = join_all(probes).await;

    let mut outcomes = Vec::with_capacity(results.len());
    for (queue, stats) in results {
        let alerts = match &stats {
            Ok(stats) => {
                let perf = ctx
                    .store
                    .read()
                    .await
                    .summary(&queue, ctx.performance_window_minutes);
                ctx.alerts.write().await.evaluate(&queue, stats, &perf)
            }
            Err(err) => {
                tracing::error!(queue = %queue, error = %err, "Queue probe failed");
                if let Some(metrics) = &ctx.metrics {
                    metrics.probe_errors_total.inc();
                }
                vec![ctx.alerts.write().await.connection_error(&queue, &err.to_string())]
            }
        };

        if let Some(metrics) = &ctx.metrics {
            metrics.probes_total.inc();
            metrics.observe_alerts(&alerts);
        }

        outcomes.push(ProbeOutcome {
            queue_name: queue,
            stats,
            alerts,
        });
    }

    let raised: usize = outcomes.iter().map(|o| o.alerts.len()).sum();
    tracing::debug!(queues = outcomes.len(), alerts = raised, "Probe cycle finished");

    outcomes
}

/// Handle to the background probe task.
///
/// `start` is idempotent and `stop` is always safe to call. Stopping only
/// prevents future ticks: a tick already in progress runs to completion.
#[derive(Default)]
pub struct MonitoringLoop {
    running: Option<RunningLoop>,
}

struct RunningLoop {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
    interval: Duration,
}

impl MonitoringLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the probe loop. Returns `false` without doing anything if a
    /// loop is already running.
    pub fn start(&mut self, ctx: ProbeContext, interval: Duration) -> bool {
        if let Some(running) = &self.running {
            if !running.handle.is_finished() {
                tracing::info!(
                    "Monitoring already running (interval: {}ms), ignoring start request",
                    running.interval.as_millis()
                );
                return false;
            }
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        probe_once(&ctx).await;
                    }

                    _ = shutdown_rx.changed() => {
                        break;
                    }
                }
            }

            tracing::info!("Queue monitoring stopped cleanly");
        });

        tracing::info!("Queue monitoring started (interval: {}ms)", interval.as_millis());
        self.running = Some(RunningLoop {
            shutdown,
            handle,
            interval,
        });
        true
    }

    /// Signal the loop to exit after any in-flight tick.
    pub fn stop(&mut self) {
        match self.running.take() {
            Some(running) => {
                let _ = running.shutdown.send(true);
                tracing::info!("Queue monitoring stop requested");
            }
            None => tracing::debug!("Stop requested but monitoring is not running"),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .map_or(false, |running| !running.handle.is_finished())
    }

    pub fn interval(&self) -> Option<Duration> {
        self.running.as_ref().map(|running| running.interval)
    }
}
