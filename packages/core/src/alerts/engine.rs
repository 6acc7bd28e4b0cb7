//! Alert engine.
//!
//! Turns queue stats snapshots and individual job samples into typed,
//! severity-ranked alerts and keeps the most recent ones in a bounded,
//! append-only history. Identical alerts are not deduplicated: every
//! evaluation that trips a rule appends a new entry.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::RwLock;

use crate::monitoring::types::{
    Alert, AlertSeverity, AlertType, PerformanceSample, PerformanceSummary, QueueStats,
};

/// Default number of alerts retained across all queues.
pub const DEFAULT_ALERT_CAPACITY: usize = 100;

pub const QUEUE_SIZE_HIGH: u64 = 1000;
pub const QUEUE_SIZE_CRITICAL: u64 = 5000;
pub const ERROR_RATE_MEDIUM: f64 = 10.0;
pub const ERROR_RATE_CRITICAL: f64 = 25.0;
/// Jobs per minute.
pub const LOW_THROUGHPUT: f64 = 1.0;
pub const LOW_THROUGHPUT_MIN_WAITING: u64 = 10;
pub const SLOW_JOB_MS: u64 = 30_000;
pub const STALLED_JOB_MS: u64 = 60_000;
pub const MAX_ATTEMPTS: u32 = 3;

/// Alert engine handle shared between tasks.
pub type SharedAlertEngine = Arc<RwLock<AlertEngine>>;

#[derive(Debug)]
pub struct AlertEngine {
    history: VecDeque<Alert>,
    capacity: usize,
}

impl AlertEngine {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn shared(capacity: usize) -> SharedAlertEngine {
        Arc::new(RwLock::new(Self::new(capacity)))
    }

    /// Run the stats rules for `queue` and append whatever fires.
    pub fn evaluate(
        &mut self,
        queue: &str,
        stats: &QueueStats,
        perf: &PerformanceSummary,
    ) -> Vec<Alert> {
        let alerts = check_stats(queue, stats, perf, Utc::now());
        self.append_all(&alerts);
        alerts
    }

    /// Run the per-job rules (slow/stalled job, retry count) and append
    /// whatever fires.
    pub fn evaluate_sample(&mut self, sample: &PerformanceSample) -> Vec<Alert> {
        let alerts = check_sample(sample, Utc::now());
        self.append_all(&alerts);
        alerts
    }

    /// Record a failed probe against `queue`.
    pub fn connection_error(&mut self, queue: &str, error: &str) -> Alert {
        let alert = Alert {
            alert_type: AlertType::ConnectionError,
            severity: AlertSeverity::Critical,
            message: format!("Failed to probe queue {}: {}", queue, error),
            timestamp: Utc::now(),
            queue_name: queue.to_string(),
            metadata: Some(json!({ "error": error })),
        };
        self.append(alert.clone());
        alert
    }

    /// Append an externally built alert.
    pub fn append(&mut self, alert: Alert) {
        if self.capacity == 0 {
            return;
        }
        if self.history.len() >= self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(alert);
    }

    fn append_all(&mut self, alerts: &[Alert]) {
        for alert in alerts {
            self.append(alert.clone());
        }
    }

    /// Alerts newest first, optionally restricted to one queue and capped
    /// at `limit` entries.
    pub fn get(&self, queue: Option<&str>, limit: Option<usize>) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = self
            .history
            .iter()
            .rev()
            .filter(|a| queue.map_or(true, |q| a.queue_name == q))
            .cloned()
            .collect();
        // Stable: equal timestamps keep newest-appended first.
        alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = limit {
            alerts.truncate(limit);
        }
        alerts
    }

    /// Alerts raised at or after `since`, newest first.
    pub fn since(&self, since: DateTime<Utc>) -> Vec<Alert> {
        self.get(None, None)
            .into_iter()
            .filter(|a| a.timestamp >= since)
            .collect()
    }

    /// Drop alerts for one queue, or all of them. Returns how many were removed.
    pub fn clear(&mut self, queue: Option<&str>) -> usize {
        let before = self.history.len();
        match queue {
            Some(name) => self.history.retain(|a| a.queue_name != name),
            None => self.history.clear(),
        }
        before - self.history.len()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Stats-snapshot rules. Each rule is independent; one call may yield
/// several alerts.
pub fn check_stats(
    queue: &str,
    stats: &QueueStats,
    perf: &PerformanceSummary,
    now: DateTime<Utc>,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    let queue_size = if stats.waiting > QUEUE_SIZE_CRITICAL {
        Some((AlertSeverity::Critical, QUEUE_SIZE_CRITICAL))
    } else if stats.waiting > QUEUE_SIZE_HIGH {
        Some((AlertSeverity::High, QUEUE_SIZE_HIGH))
    } else {
        None
    };
    if let Some((severity, threshold)) = queue_size {
        alerts.push(Alert {
            alert_type: AlertType::HighQueueSize,
            severity,
            message: format!("Queue {} has {} waiting jobs", queue, stats.waiting),
            timestamp: now,
            queue_name: queue.to_string(),
            metadata: Some(json!({ "waiting": stats.waiting, "threshold": threshold })),
        });
    }

    let error_rate = stats.error_rate();
    let error_severity = if error_rate > ERROR_RATE_CRITICAL {
        Some(AlertSeverity::Critical)
    } else if error_rate > ERROR_RATE_MEDIUM {
        Some(AlertSeverity::Medium)
    } else {
        None
    };
    if let Some(severity) = error_severity {
        alerts.push(Alert {
            alert_type: AlertType::HighErrorRate,
            severity,
            message: format!("Queue {} error rate is {:.1}%", queue, error_rate),
            timestamp: now,
            queue_name: queue.to_string(),
            metadata: Some(json!({
                "error_rate": error_rate,
                "failed": stats.failed,
                "completed": stats.completed,
            })),
        });
    }

    if perf.throughput_per_minute < LOW_THROUGHPUT && stats.waiting > LOW_THROUGHPUT_MIN_WAITING {
        alerts.push(Alert {
            alert_type: AlertType::LowThroughput,
            severity: AlertSeverity::Medium,
            message: format!(
                "Queue {} throughput is {:.2} jobs/min with {} jobs waiting",
                queue, perf.throughput_per_minute, stats.waiting
            ),
            timestamp: now,
            queue_name: queue.to_string(),
            metadata: Some(json!({
                "throughput_per_minute": perf.throughput_per_minute,
                "waiting": stats.waiting,
            })),
        });
    }

    alerts
}

/// Per-job rules.
pub fn check_sample(sample: &PerformanceSample, now: DateTime<Utc>) -> Vec<Alert> {
    let mut alerts = Vec::new();

    let slow = if sample.duration_ms > STALLED_JOB_MS {
        Some(AlertSeverity::High)
    } else if sample.duration_ms > SLOW_JOB_MS {
        Some(AlertSeverity::Medium)
    } else {
        None
    };
    if let Some(severity) = slow {
        alerts.push(Alert {
            alert_type: AlertType::StalledJobs,
            severity,
            message: format!(
                "Job {} in queue {} took {}ms",
                sample.job_name, sample.queue_name, sample.duration_ms
            ),
            timestamp: now,
            queue_name: sample.queue_name.clone(),
            metadata: Some(json!({
                "job_name": sample.job_name,
                "duration_ms": sample.duration_ms,
            })),
        });
    }

    // No dedicated retry type: excessive retries are reported as errors.
    if sample.attempts > MAX_ATTEMPTS {
        alerts.push(Alert {
            alert_type: AlertType::HighErrorRate,
            severity: AlertSeverity::Medium,
            message: format!(
                "Job {} in queue {} needed {} attempts",
                sample.job_name, sample.queue_name, sample.attempts
            ),
            timestamp: now,
            queue_name: sample.queue_name.clone(),
            metadata: Some(json!({
                "job_name": sample.job_name,
                "attempts": sample.attempts,
            })),
        });
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn stats(waiting: u64, completed: u64, failed: u64) -> QueueStats {
        QueueStats::from_counts(waiting, 0, completed, failed, 0, 0)
    }

    fn busy() -> PerformanceSummary {
        PerformanceSummary {
            throughput_per_minute: 50.0,
            ..PerformanceSummary::default()
        }
    }

    fn sample(duration_ms: u64, attempts: u32) -> PerformanceSample {
        PerformanceSample {
            queue_name: "email".to_string(),
            job_name: "send".to_string(),
            duration_ms,
            success: true,
            attempts,
            timestamp: Utc::now(),
        }
    }

    fn of_type(alerts: &[Alert], alert_type: AlertType) -> Vec<&Alert> {
        alerts.iter().filter(|a| a.alert_type == alert_type).collect()
    }

    // ---- queue size ----

    #[test]
    fn waiting_above_critical_threshold_is_critical() {
        let mut engine = AlertEngine::new(100);
        let alerts = engine.evaluate("email", &stats(6000, 100, 0), &busy());
        let size = of_type(&alerts, AlertType::HighQueueSize);
        assert_eq!(size.len(), 1);
        assert_eq!(size[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn waiting_above_high_threshold_is_high() {
        let mut engine = AlertEngine::new(100);
        let alerts = engine.evaluate("email", &stats(1500, 100, 0), &busy());
        let size = of_type(&alerts, AlertType::HighQueueSize);
        assert_eq!(size.len(), 1);
        assert_eq!(size[0].severity, AlertSeverity::High);
    }

    #[test]
    fn waiting_below_threshold_raises_no_size_alert() {
        let mut engine = AlertEngine::new(100);
        let alerts = engine.evaluate("email", &stats(500, 100, 0), &busy());
        assert!(of_type(&alerts, AlertType::HighQueueSize).is_empty());
    }

    #[test]
    fn queue_size_thresholds_are_strict() {
        let now = Utc::now();
        assert!(check_stats("q", &stats(1000, 0, 0), &busy(), now).is_empty());
        let at_critical = check_stats("q", &stats(5000, 0, 0), &busy(), now);
        assert_eq!(at_critical[0].severity, AlertSeverity::High);
    }

    // ---- error rate ----

    #[test]
    fn error_rate_above_ten_percent_is_medium() {
        let alerts = check_stats("q", &stats(0, 85, 15), &busy(), Utc::now());
        let errors = of_type(&alerts, AlertType::HighErrorRate);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].severity, AlertSeverity::Medium);
    }

    #[test]
    fn error_rate_above_twenty_five_percent_is_critical() {
        let alerts = check_stats("q", &stats(0, 70, 30), &busy(), Utc::now());
        let errors = of_type(&alerts, AlertType::HighErrorRate);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn error_rate_at_exactly_ten_percent_raises_nothing() {
        let alerts = check_stats("q", &stats(0, 90, 10), &busy(), Utc::now());
        assert!(of_type(&alerts, AlertType::HighErrorRate).is_empty());
    }

    #[test]
    fn no_finished_jobs_means_no_error_alert() {
        let alerts = check_stats("q", &stats(0, 0, 0), &busy(), Utc::now());
        assert!(alerts.is_empty());
    }

    // ---- throughput ----

    #[test]
    fn low_throughput_with_backlog_is_medium() {
        let idle = PerformanceSummary::default();
        let alerts = check_stats("q", &stats(11, 0, 0), &idle, Utc::now());
        let low = of_type(&alerts, AlertType::LowThroughput);
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].severity, AlertSeverity::Medium);
    }

    #[test]
    fn low_throughput_without_backlog_raises_nothing() {
        let idle = PerformanceSummary::default();
        assert!(check_stats("q", &stats(10, 0, 0), &idle, Utc::now()).is_empty());
    }

    #[test]
    fn rules_are_independent() {
        let idle = PerformanceSummary::default();
        let alerts = check_stats("q", &stats(6000, 50, 50), &idle, Utc::now());
        assert_eq!(alerts.len(), 3);
    }

    // ---- per-sample rules ----

    #[test]
    fn slow_job_is_medium_and_stalled_job_is_high() {
        let now = Utc::now();
        assert!(check_sample(&sample(30_000, 1), now).is_empty());
        assert_eq!(check_sample(&sample(30_001, 1), now)[0].severity, AlertSeverity::Medium);
        assert_eq!(check_sample(&sample(60_001, 1), now)[0].severity, AlertSeverity::High);
        assert_eq!(check_sample(&sample(60_001, 1), now)[0].alert_type, AlertType::StalledJobs);
    }

    #[test]
    fn retries_above_three_raise_medium_alert() {
        let now = Utc::now();
        assert!(check_sample(&sample(10, 3), now).is_empty());
        let alerts = check_sample(&sample(10, 4), now);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Medium);
        assert_eq!(alerts[0].metadata.as_ref().unwrap()["attempts"], 4);
    }

    #[test]
    fn evaluate_sample_appends_to_history() {
        let mut engine = AlertEngine::new(100);
        let raised = engine.evaluate_sample(&sample(70_000, 5));
        assert_eq!(raised.len(), 2);
        assert_eq!(engine.len(), 2);
    }

    // ---- history ----

    #[test]
    fn connection_error_is_critical() {
        let mut engine = AlertEngine::new(100);
        let alert = engine.connection_error("email", "refused");
        assert_eq!(alert.alert_type, AlertType::ConnectionError);
        assert_eq!(alert.severity, AlertSeverity::Critical);
        assert_eq!(engine.get(Some("email"), None), vec![alert]);
    }

    #[test]
    fn repeated_evaluations_accumulate_identical_alerts() {
        let mut engine = AlertEngine::new(100);
        for _ in 0..3 {
            engine.evaluate("email", &stats(6000, 100, 0), &busy());
        }
        assert_eq!(engine.get(Some("email"), None).len(), 3);
    }

    #[test]
    fn history_keeps_only_the_most_recent_alerts() {
        let mut engine = AlertEngine::new(100);
        for i in 0..150 {
            engine.connection_error("email", &format!("failure {}", i));
        }

        let alerts = engine.get(Some("email"), None);
        assert_eq!(alerts.len(), 100);
        assert!(alerts[0].message.ends_with("failure 149"));
        assert!(alerts[99].message.ends_with("failure 50"));
    }

    #[test]
    fn get_returns_newest_first_and_honours_limit() {
        let mut engine = AlertEngine::new(100);
        let base = Utc::now();
        for i in 0..5 {
            engine.append(Alert {
                alert_type: AlertType::LowThroughput,
                severity: AlertSeverity::Low,
                message: format!("alert {}", i),
                timestamp: base + Duration::seconds(i),
                queue_name: "email".to_string(),
                metadata: None,
            });
        }

        let alerts = engine.get(None, Some(2));
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].message, "alert 4");
        assert_eq!(alerts[1].message, "alert 3");
    }

    #[test]
    fn get_orders_by_timestamp_even_when_appended_out_of_order() {
        let mut engine = AlertEngine::new(100);
        let base = Utc::now();
        for offset in [5, 1, 3] {
            engine.append(Alert {
                alert_type: AlertType::LowThroughput,
                severity: AlertSeverity::Low,
                message: offset.to_string(),
                timestamp: base + Duration::seconds(offset),
                queue_name: "email".to_string(),
                metadata: None,
            });
        }
        let order: Vec<String> = engine.get(None, None).into_iter().map(|a| a.message).collect();
        assert_eq!(order, vec!["5", "3", "1"]);
    }

    #[test]
    fn clear_by_queue_keeps_other_queues() {
        let mut engine = AlertEngine::new(100);
        engine.connection_error("email", "down");
        engine.connection_error("reports", "down");

        assert_eq!(engine.clear(Some("email")), 1);
        assert!(engine.get(Some("email"), None).is_empty());
        assert_eq!(engine.get(None, None).len(), 1);

        assert_eq!(engine.clear(None), 1);
        assert!(engine.is_empty());
    }

    #[test]
    fn since_filters_old_alerts() {
        let mut engine = AlertEngine::new(100);
        engine.append(Alert {
            alert_type: AlertType::LowThroughput,
            severity: AlertSeverity::Low,
            message: "old".to_string(),
            timestamp: Utc::now() - Duration::hours(3),
            queue_name: "email".to_string(),
            metadata: None,
        });
        engine.connection_error("email", "down");

        let recent = engine.since(Utc::now() - Duration::hours(1));
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].alert_type, AlertType::ConnectionError);
    }
}
