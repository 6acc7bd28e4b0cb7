//! Per-queue health scoring.
//!
//! Four sub-checks (connection, processing, memory, performance) each map to
//! a status; the composite score is the rounded mean of their numeric values
//! and the queue status is derived from that score.

use chrono::Utc;

use crate::monitoring::{
    config::MonitorConfig,
    provider::{with_timeout, SharedProvider},
    types::*,
};
use crate::store::SharedMetricStore;

pub const HEALTHY_SCORE: u8 = 80;
pub const WARNING_SCORE: u8 = 60;

const PROCESSING_ERROR_CRITICAL: f64 = 25.0;
const PROCESSING_ERROR_WARNING: f64 = 10.0;
const PROCESSING_BACKLOG_WARNING: u64 = 1000;
const PERFORMANCE_BACKLOG_CRITICAL: u64 = 100;
const PERFORMANCE_MIN_THROUGHPUT: f64 = 1.0;
const PERFORMANCE_SLOW_MS: f64 = 30_000.0;

/// Map a 0-100 score onto a status. Used for queues and for the system.
pub fn status_from_score(score: u8) -> HealthStatus {
    if score >= HEALTHY_SCORE {
        HealthStatus::Healthy
    } else if score >= WARNING_SCORE {
        HealthStatus::Warning
    } else {
        HealthStatus::Critical
    }
}

/// Rounded mean of sub-check scores; an empty set scores 100.
pub fn composite_score(statuses: &[HealthStatus]) -> u8 {
    if statuses.is_empty() {
        return 100;
    }
    let total: u32 = statuses.iter().map(HealthStatus::score).sum();
    (total as f64 / statuses.len() as f64).round() as u8
}

pub fn connection_check(liveness: &Result<bool, String>) -> ConnectionCheck {
    match liveness {
        Ok(true) => ConnectionCheck {
            status: HealthStatus::Healthy,
            connected: true,
            error: None,
        },
        Ok(false) => ConnectionCheck {
            status: HealthStatus::Critical,
            connected: false,
            error: None,
        },
        Err(err) => ConnectionCheck {
            status: HealthStatus::Critical,
            connected: false,
            error: Some(err.clone()),
        },
    }
}

pub fn processing_check(stats: Option<&QueueStats>) -> ProcessingCheck {
    let Some(stats) = stats else {
        return ProcessingCheck {
            status: HealthStatus::Unknown,
            waiting: 0,
            active: 0,
            failed: 0,
            error_rate: 0.0,
        };
    };

    let error_rate = stats.error_rate();
    let status = if error_rate > PROCESSING_ERROR_CRITICAL {
        HealthStatus::Critical
    } else if error_rate > PROCESSING_ERROR_WARNING || stats.waiting > PROCESSING_BACKLOG_WARNING {
        HealthStatus::Warning
    } else {
        HealthStatus::Healthy
    };

    ProcessingCheck {
        status,
        waiting: stats.waiting,
        active: stats.active,
        failed: stats.failed,
        error_rate,
    }
}

/// Memory is never sampled, so this always reports healthy with
/// `sampled: false`.
pub fn memory_check() -> MemoryCheck {
    MemoryCheck {
        status: HealthStatus::Healthy,
        sampled: false,
    }
}

pub fn performance_check(stats: Option<&QueueStats>, perf: &PerformanceSummary) -> PerformanceCheck {
    let status = match stats {
        None => HealthStatus::Unknown,
        Some(stats)
            if perf.throughput_per_minute < PERFORMANCE_MIN_THROUGHPUT
                && stats.waiting > PERFORMANCE_BACKLOG_CRITICAL =>
        {
            HealthStatus::Critical
        }
        Some(_) if perf.avg_processing_time_ms > PERFORMANCE_SLOW_MS => HealthStatus::Warning,
        Some(_) => HealthStatus::Healthy,
    };

    PerformanceCheck {
        status,
        avg_processing_time_ms: perf.avg_processing_time_ms,
        throughput_per_minute: perf.throughput_per_minute,
    }
}

fn recommendations(checks: &HealthChecks) -> Vec<String> {
    let mut out = Vec::new();

    if checks.connection.status == HealthStatus::Critical {
        out.push("Check connectivity to the queue backend".to_string());
    }

    let processing = &checks.processing;
    match processing.status {
        HealthStatus::Critical => out.push(format!(
            "Error rate is {:.1}% - investigate failing jobs",
            processing.error_rate
        )),
        HealthStatus::Warning if processing.error_rate > PROCESSING_ERROR_WARNING => out.push(
            format!("Error rate is elevated ({:.1}%) - review recent failures", processing.error_rate),
        ),
        _ => {}
    }
    if processing.waiting > PROCESSING_BACKLOG_WARNING {
        out.push(format!(
            "Backlog of {} waiting jobs - consider adding workers",
            processing.waiting
        ));
    }

    match checks.performance.status {
        HealthStatus::Critical => out.push(
            "Queue is not draining its backlog - check that workers are running".to_string(),
        ),
        HealthStatus::Warning => out.push(format!(
            "Average processing time is {:.0}ms - optimise slow jobs",
            checks.performance.avg_processing_time_ms
        )),
        _ => {}
    }

    out
}

/// Build a `HealthCheck` from already-collected probe results.
pub fn assess(
    queue: &str,
    liveness: &Result<bool, String>,
    stats: Option<&QueueStats>,
    perf: &PerformanceSummary,
) -> HealthCheck {
    let checks = HealthChecks {
        connection: connection_check(liveness),
        processing: processing_check(stats),
        memory: memory_check(),
        performance: performance_check(stats, perf),
    };
    let score = composite_score(&checks.statuses());

    HealthCheck {
        queue_name: queue.to_string(),
        status: status_from_score(score),
        score,
        recommendations: recommendations(&checks),
        checks,
        timestamp: Utc::now(),
    }
}

/// Probes a queue through the provider and scores it.
#[derive(Clone)]
pub struct HealthScorer {
    provider: SharedProvider,
    store: SharedMetricStore,
    config: MonitorConfig,
}

impl HealthScorer {
    pub fn new(provider: SharedProvider, store: SharedMetricStore, config: MonitorConfig) -> Self {
        Self {
            provider,
            store,
            config,
        }
    }

    pub async fn score(&self, queue: &str) -> HealthCheck {
        self.score_with_stats(queue).await.0
    }

    /// Score `queue`, also handing back the stats snapshot when the probe
    /// succeeded so callers can aggregate without probing twice.
    pub async fn score_with_stats(&self, queue: &str) -> (HealthCheck, Option<QueueStats>) {
        let timeout = self.config.probe_timeout();
        let (liveness, stats) = tokio::join!(
            with_timeout(queue, timeout, self.provider.is_healthy(queue)),
            with_timeout(queue, timeout, self.provider.get_stats(queue)),
        );

        let liveness = liveness.map_err(|err| err.to_string());
        let stats = match stats {
            Ok(stats) => Some(stats),
            Err(err) => {
                tracing::warn!(queue, error = %err, "Stats probe failed while scoring queue");
                None
            }
        };

        let perf = self
            .store
            .read()
            .await
            .summary(queue, self.config.performance_window_minutes);

        (assess(queue, &liveness, stats.as_ref(), &perf), stats)
    }
}
