//! Configuration for the queue monitoring core

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::alerts::DEFAULT_ALERT_CAPACITY;
use crate::store::DEFAULT_CAPACITY;

/// Tunables for the monitoring core. Alert and health thresholds are fixed
/// and live next to the rules that use them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Maximum samples retained across all queues.
    pub metric_capacity: usize,
    /// Maximum alerts retained across all queues.
    pub alert_capacity: usize,
    /// Default trailing window for metric queries.
    pub metric_window_hours: u64,
    /// Window used for throughput and average processing time.
    pub performance_window_minutes: u64,
    /// Upper bound on any single backend call.
    pub probe_timeout_ms: u64,
    pub default_interval_ms: u64,
    pub recent_activity_limit: usize,
    /// Alerts younger than this count as active on the dashboard.
    pub active_alert_window_minutes: i64,
    pub top_performers: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            metric_capacity: DEFAULT_CAPACITY,
            alert_capacity: DEFAULT_ALERT_CAPACITY,
            metric_window_hours: 24,
            performance_window_minutes: 60,
            probe_timeout_ms: 5000,
            default_interval_ms: 30_000,
            recent_activity_limit: 20,
            active_alert_window_minutes: 60,
            top_performers: 5,
        }
    }
}

impl MonitorConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}
