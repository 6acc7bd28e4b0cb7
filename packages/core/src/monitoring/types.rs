//! Core data types for queue monitoring

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time job counts reported by a queue backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub waiting: u64,
    pub active: u64,
    pub completed: u64,
    pub failed: u64,
    pub delayed: u64,
    pub paused: u64,
    pub total: u64,
}

impl QueueStats {
    /// Build a snapshot from raw counts; `total` is the sum of every bucket.
    pub fn from_counts(
        waiting: u64,
        active: u64,
        completed: u64,
        failed: u64,
        delayed: u64,
        paused: u64,
    ) -> Self {
        Self {
            waiting,
            active,
            completed,
            failed,
            delayed,
            paused,
            total: saturating_sum([waiting, active, completed, failed, delayed, paused]),
        }
    }

    /// Failure percentage over finished jobs, see [`error_rate`].
    pub fn error_rate(&self) -> f64 {
        error_rate(self.failed, self.completed)
    }
}

/// Sum of job counts, pinned at `u64::MAX` instead of overflowing.
pub fn saturating_sum<I: IntoIterator<Item = u64>>(values: I) -> u64 {
    values.into_iter().fold(0, u64::saturating_add)
}

/// `failed / (failed + completed) * 100`, or `0.0` when nothing has finished.
pub fn error_rate(failed: u64, completed: u64) -> f64 {
    let finished = failed.saturating_add(completed);
    if finished == 0 {
        return 0.0;
    }
    failed as f64 / finished as f64 * 100.0
}

/// A single finished job as reported by a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    pub queue_name: String,
    pub job_name: String,
    pub duration_ms: u64,
    pub success: bool,
    pub attempts: u32,
    pub timestamp: DateTime<Utc>,
}

/// Derived performance figures for one queue over a trailing window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub avg_processing_time_ms: f64,
    /// Successful jobs per minute.
    pub throughput_per_minute: f64,
    /// Failed samples as a percentage of all samples in the window.
    pub error_rate: f64,
    pub sample_count: usize,
}

impl PerformanceSummary {
    /// Summarise `samples`, treating them as the content of a window of
    /// `window_minutes` minutes.
    pub fn from_samples(samples: &[PerformanceSample], window_minutes: u64) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let count = samples.len();
        let succeeded = samples.iter().filter(|s| s.success).count();
        let total_duration = saturating_sum(samples.iter().map(|s| s.duration_ms));

        let throughput_per_minute = if window_minutes > 0 {
            succeeded as f64 / window_minutes as f64
        } else {
            0.0
        };

        Self {
            avg_processing_time_ms: total_duration as f64 / count as f64,
            throughput_per_minute,
            error_rate: (count - succeeded) as f64 / count as f64 * 100.0,
            sample_count: count,
        }
    }
}

/// Kind of condition an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertType {
    HighQueueSize,
    HighErrorRate,
    StalledJobs,
    ConnectionError,
    LowThroughput,
}

/// Alert severity, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

/// A raised alert. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub queue_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Tri-state health plus `Unknown` for checks that could not be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
    Unknown,
}

impl HealthStatus {
    /// Contribution of a sub-check with this status to the composite score.
    pub fn score(&self) -> u32 {
        match self {
            HealthStatus::Healthy => 100,
            HealthStatus::Warning => 70,
            HealthStatus::Critical => 30,
            HealthStatus::Unknown => 0,
        }
    }

    /// Rank used when ordering problematic queues, most severe first.
    pub fn severity_rank(&self) -> u8 {
        match self {
            HealthStatus::Critical => 3,
            HealthStatus::Warning => 2,
            HealthStatus::Healthy => 1,
            HealthStatus::Unknown => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionCheck {
    pub status: HealthStatus,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingCheck {
    pub status: HealthStatus,
    pub waiting: u64,
    pub active: u64,
    pub failed: u64,
    pub error_rate: f64,
}

/// Memory is not sampled; the check always reports healthy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryCheck {
    pub status: HealthStatus,
    pub sampled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceCheck {
    pub status: HealthStatus,
    pub avg_processing_time_ms: f64,
    pub throughput_per_minute: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthChecks {
    pub connection: ConnectionCheck,
    pub processing: ProcessingCheck,
    pub memory: MemoryCheck,
    pub performance: PerformanceCheck,
}

impl HealthChecks {
    pub fn statuses(&self) -> [HealthStatus; 4] {
        [
            self.connection.status,
            self.processing.status,
            self.memory.status,
            self.performance.status,
        ]
    }
}

/// Health of a single queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub queue_name: String,
    pub status: HealthStatus,
    pub score: u8,
    pub checks: HealthChecks,
    pub recommendations: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub total_queues: usize,
    pub healthy_queues: usize,
    pub warning_queues: usize,
    pub critical_queues: usize,
    pub total_jobs: u64,
    pub total_active_jobs: u64,
    pub total_failed_jobs: u64,
}

/// Process-wide health: every queue check rolled into one status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemHealth {
    pub overall_status: HealthStatus,
    pub overall_score: u8,
    pub queues: Vec<HealthCheck>,
    pub system_metrics: SystemMetrics,
    pub system_recommendations: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Performance summary tagged with its queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuePerformance {
    pub queue_name: String,
    pub performance: PerformanceSummary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl AlertCounts {
    pub fn tally(alerts: &[Alert]) -> Self {
        let mut counts = Self::default();
        for alert in alerts {
            match alert.severity {
                AlertSeverity::Low => counts.low += 1,
                AlertSeverity::Medium => counts.medium += 1,
                AlertSeverity::High => counts.high += 1,
                AlertSeverity::Critical => counts.critical += 1,
            }
        }
        counts
    }
}

/// Full operator report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringReport {
    pub generated_at: DateTime<Utc>,
    pub monitoring_active: bool,
    pub system_health: SystemHealth,
    pub performance: Vec<QueuePerformance>,
    pub recent_alerts: Vec<Alert>,
    pub alert_counts: AlertCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardOverview {
    pub total_queues: usize,
    pub total_jobs: u64,
    pub waiting_jobs: u64,
    pub active_jobs: u64,
    pub completed_jobs: u64,
    pub failed_jobs: u64,
    pub delayed_jobs: u64,
    pub overall_score: u8,
    pub overall_status: HealthStatus,
    pub active_alerts: usize,
}

/// Per-queue row of the dashboard: stats are `None` when the probe failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueOverview {
    pub queue_name: String,
    pub stats: Option<QueueStats>,
    pub error_rate: f64,
    pub performance: PerformanceSummary,
    pub health_score: u8,
    pub status: HealthStatus,
}

/// One hour of job activity across every queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceTrend {
    pub hour_start: DateTime<Utc>,
    pub jobs_processed: usize,
    pub jobs_failed: usize,
    pub avg_processing_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPerformer {
    pub queue_name: String,
    pub score: u8,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblematicQueue {
    pub queue_name: String,
    pub status: HealthStatus,
    pub score: u8,
    pub issues: Vec<String>,
}

/// Composed read model for the operator dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub overview: DashboardOverview,
    pub queues: Vec<QueueOverview>,
    pub recent_activity: Vec<PerformanceSample>,
    pub health: SystemHealth,
    pub performance_trends: Vec<PerformanceTrend>,
    pub active_alerts: Vec<Alert>,
    pub top_performers: Vec<TopPerformer>,
    pub problematic_queues: Vec<ProblematicQueue>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealTimeQueueMetrics {
    pub queue_name: String,
    pub connected: bool,
    pub waiting: u64,
    pub active: u64,
    pub completed: u64,
    pub failed: u64,
    pub throughput_per_minute: f64,
    pub avg_processing_time_ms: f64,
}

/// Lightweight live snapshot, cheap enough to poll every few seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealTimeMetrics {
    pub timestamp: DateTime<Utc>,
    pub queues: Vec<RealTimeQueueMetrics>,
    pub total_waiting: u64,
    pub total_active: u64,
    pub jobs_last_minute: usize,
    pub active_alerts: usize,
}
