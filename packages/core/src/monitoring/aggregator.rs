//! System-wide health aggregation

use std::collections::HashMap;

use chrono::Utc;

use crate::monitoring::{
    scorer::status_from_score,
    types::{saturating_sum, HealthCheck, HealthStatus, QueueStats, SystemHealth, SystemMetrics},
};

/// Rolls per-queue health checks into one process-wide view.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAggregator;

impl SystemAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Combine `checks` with whatever stats snapshots are available.
    /// Queues missing from `stats` contribute no job counts.
    pub fn aggregate(
        &self,
        checks: Vec<HealthCheck>,
        stats: &HashMap<String, QueueStats>,
    ) -> SystemHealth {
        let overall_score = if checks.is_empty() {
            100
        } else {
            let total: u32 = checks.iter().map(|c| u32::from(c.score)).sum();
            (total as f64 / checks.len() as f64).round() as u8
        };

        let count = |status: HealthStatus| checks.iter().filter(|c| c.status == status).count();

        let system_metrics = SystemMetrics {
            total_queues: checks.len(),
            healthy_queues: count(HealthStatus::Healthy),
            warning_queues: count(HealthStatus::Warning),
            critical_queues: count(HealthStatus::Critical),
            total_jobs: saturating_sum(stats.values().map(|s| s.total)),
            total_active_jobs: saturating_sum(stats.values().map(|s| s.active)),
            total_failed_jobs: saturating_sum(stats.values().map(|s| s.failed)),
        };

        SystemHealth {
            overall_status: status_from_score(overall_score),
            overall_score,
            system_recommendations: system_recommendations(&system_metrics),
            system_metrics,
            queues: checks,
            timestamp: Utc::now(),
        }
    }
}

fn system_recommendations(metrics: &SystemMetrics) -> Vec<String> {
    let mut out = Vec::new();

    if metrics.critical_queues > 0 {
        out.push(format!(
            "{} queue(s) in critical state require immediate attention",
            metrics.critical_queues
        ));
    }
    if metrics.warning_queues > 0 {
        out.push(format!(
            "{} queue(s) showing warning signs should be monitored closely",
            metrics.warning_queues
        ));
    }
    if out.is_empty() {
        out.push("All queues are operating normally".to_string());
    }

    out
}
