//! Dashboard read models.
//!
//! Everything here is computed at read time from a health snapshot, the
//! metric store and the alert history; nothing is cached between calls.

use std::collections::HashMap;

use chrono::{DateTime, Duration, DurationRound, Utc};

use crate::alerts::AlertEngine;
use crate::monitoring::{config::MonitorConfig, types::*};
use crate::store::{hours_before, window_start, MetricStore};

const TREND_HOURS: i64 = 24;

/// The `n` best-scoring queues. Ties keep the order of `checks`.
pub fn top_performers(checks: &[HealthCheck], n: usize) -> Vec<TopPerformer> {
    let mut ranked: Vec<&HealthCheck> = checks.iter().collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
        .into_iter()
        .take(n)
        .map(|c| TopPerformer {
            queue_name: c.queue_name.clone(),
            score: c.score,
            status: c.status,
        })
        .collect()
}

/// Every queue not reporting healthy, most severe first.
pub fn problematic_queues(checks: &[HealthCheck]) -> Vec<ProblematicQueue> {
    let mut problems: Vec<&HealthCheck> = checks
        .iter()
        .filter(|c| c.status != HealthStatus::Healthy)
        .collect();
    problems.sort_by(|a, b| b.status.severity_rank().cmp(&a.status.severity_rank()));
    problems
        .into_iter()
        .map(|c| ProblematicQueue {
            queue_name: c.queue_name.clone(),
            status: c.status,
            score: c.score,
            issues: c.recommendations.clone(),
        })
        .collect()
}

/// Hourly activity buckets for the last 24 hours, oldest first. The final
/// bucket is the current, partial hour.
pub fn performance_trends(samples: &[PerformanceSample], now: DateTime<Utc>) -> Vec<PerformanceTrend> {
    let current_hour = now.duration_trunc(Duration::hours(1)).unwrap_or(now);
    let first_hour = current_hour - Duration::hours(TREND_HOURS - 1);

    let mut buckets: Vec<(usize, usize, u64)> = vec![(0, 0, 0); TREND_HOURS as usize];
    for sample in samples {
        if sample.timestamp < first_hour {
            continue;
        }
        let index = (sample.timestamp - first_hour).num_hours();
        if let Some(bucket) = buckets.get_mut(index as usize) {
            bucket.0 += 1;
            if !sample.success {
                bucket.1 += 1;
            }
            bucket.2 = bucket.2.saturating_add(sample.duration_ms);
        }
    }

    buckets
        .into_iter()
        .enumerate()
        .map(|(i, (processed, failed, duration))| PerformanceTrend {
            hour_start: first_hour + Duration::hours(i as i64),
            jobs_processed: processed,
            jobs_failed: failed,
            avg_processing_time_ms: if processed > 0 {
                duration as f64 / processed as f64
            } else {
                0.0
            },
        })
        .collect()
}

/// Builds dashboard and real-time views.
#[derive(Debug, Clone)]
pub struct DashboardReporter {
    config: MonitorConfig,
}

impl DashboardReporter {
    pub fn new(config: MonitorConfig) -> Self {
        Self { config }
    }

    fn active_since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        window_start(now, Duration::try_minutes(self.config.active_alert_window_minutes))
    }

    /// Compose the dashboard. `health.queues` must be in registration order.
    pub fn build(
        &self,
        health: SystemHealth,
        stats: &HashMap<String, QueueStats>,
        store: &MetricStore,
        alerts: &AlertEngine,
    ) -> DashboardData {
        let now = Utc::now();
        let window = self.config.performance_window_minutes;

        let queues: Vec<QueueOverview> = health
            .queues
            .iter()
            .map(|check| {
                let queue_stats = stats.get(&check.queue_name).copied();
                QueueOverview {
                    queue_name: check.queue_name.clone(),
                    error_rate: queue_stats.map(|s| s.error_rate()).unwrap_or(0.0),
                    stats: queue_stats,
                    performance: store.summary(&check.queue_name, window),
                    health_score: check.score,
                    status: check.status,
                }
            })
            .collect();

        let active_alerts = alerts.since(self.active_since(now));
        let trend_samples =
            store.all_since(hours_before(now, self.config.metric_window_hours));

        let overview = DashboardOverview {
            total_queues: queues.len(),
            total_jobs: saturating_sum(stats.values().map(|s| s.total)),
            waiting_jobs: saturating_sum(stats.values().map(|s| s.waiting)),
            active_jobs: saturating_sum(stats.values().map(|s| s.active)),
            completed_jobs: saturating_sum(stats.values().map(|s| s.completed)),
            failed_jobs: saturating_sum(stats.values().map(|s| s.failed)),
            delayed_jobs: saturating_sum(stats.values().map(|s| s.delayed)),
            overall_score: health.overall_score,
            overall_status: health.overall_status,
            active_alerts: active_alerts.len(),
        };

        DashboardData {
            overview,
            queues,
            recent_activity: store.recent(self.config.recent_activity_limit),
            performance_trends: performance_trends(&trend_samples, now),
            active_alerts,
            top_performers: top_performers(&health.queues, self.config.top_performers),
            problematic_queues: problematic_queues(&health.queues),
            health,
            generated_at: now,
        }
    }

    /// Compose the live snapshot. `probes` holds each queue's stats result in
    /// registration order.
    pub fn real_time(
        &self,
        probes: &[(String, Option<QueueStats>)],
        store: &MetricStore,
        alerts: &AlertEngine,
    ) -> RealTimeMetrics {
        let now = Utc::now();
        let window = self.config.performance_window_minutes;

        let queues: Vec<RealTimeQueueMetrics> = probes
            .iter()
            .map(|(name, stats)| {
                let perf = store.summary(name, window);
                let connected = stats.is_some();
                let stats = stats.unwrap_or_default();
                RealTimeQueueMetrics {
                    queue_name: name.clone(),
                    connected,
                    waiting: stats.waiting,
                    active: stats.active,
                    completed: stats.completed,
                    failed: stats.failed,
                    throughput_per_minute: perf.throughput_per_minute,
                    avg_processing_time_ms: perf.avg_processing_time_ms,
                }
            })
            .collect();

        RealTimeMetrics {
            timestamp: now,
            total_waiting: saturating_sum(queues.iter().map(|q| q.waiting)),
            total_active: saturating_sum(queues.iter().map(|q| q.active)),
            queues,
            jobs_last_minute: store.all_since(now - Duration::minutes(1)).len(),
            active_alerts: alerts.since(self.active_since(now)).len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::scorer::{assess, status_from_score};

    fn check(queue: &str, score: u8) -> HealthCheck {
        let mut check = assess(
            queue,
            &Ok(true),
            Some(&QueueStats::default()),
            &PerformanceSummary::default(),
        );
        check.score = score;
        check.status = status_from_score(score);
        check
    }

    fn top_names(top: &[TopPerformer]) -> Vec<&str> {
        top.iter().map(|t| t.queue_name.as_str()).collect()
    }

    fn sample(queue: &str, minutes_ago: i64, duration_ms: u64, success: bool) -> PerformanceSample {
        PerformanceSample {
            queue_name: queue.to_string(),
            job_name: "job".to_string(),
            duration_ms,
            success,
            attempts: 1,
            timestamp: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn top_performers_takes_five_highest_scores() {
        let checks: Vec<HealthCheck> = [40, 90, 100, 70, 85, 95, 20]
            .iter()
            .enumerate()
            .map(|(i, s)| check(&format!("q{}", i), *s))
            .collect();

        let top = top_performers(&checks, 5);
        assert_eq!(top_names(&top), vec!["q2", "q5", "q1", "q4", "q3"]);
    }

    #[test]
    fn top_performers_breaks_ties_by_registration_order() {
        let checks = vec![check("b", 90), check("a", 90), check("c", 100), check("d", 90)];
        let top = top_performers(&checks, 3);
        assert_eq!(top_names(&top), vec!["c", "b", "a"]);
    }

    #[test]
    fn problematic_queues_sorted_by_severity() {
        let checks = vec![
            check("fine", 100),
            check("slow", 70),
            check("down", 10),
            check("lagging", 65),
        ];
        let problems = problematic_queues(&checks);
        let order: Vec<&str> = problems.iter().map(|p| p.queue_name.as_str()).collect();
        assert_eq!(order, vec!["down", "slow", "lagging"]);
        assert_eq!(problems[0].status, HealthStatus::Critical);
    }

    #[test]
    fn problematic_queues_empty_when_all_healthy() {
        assert!(problematic_queues(&[check("a", 100), check("b", 80)]).is_empty());
    }

    #[test]
    fn trends_cover_twenty_four_hours_oldest_first() {
        let samples = vec![
            sample("a", 0, 100, true),
            sample("a", 0, 300, false),
            sample("a", 60 * 30, 999, true), // outside the range
        ];
        let now = Utc::now();

        let trends = performance_trends(&samples, now);
        assert_eq!(trends.len(), 24);
        assert!(trends[0].hour_start < trends[23].hour_start);

        let last = &trends[23];
        assert_eq!(last.jobs_processed, 2);
        assert_eq!(last.jobs_failed, 1);
        assert!((last.avg_processing_time_ms - 200.0).abs() < f64::EPSILON);
        assert_eq!(trends.iter().map(|t| t.jobs_processed).sum::<usize>(), 2);
    }

    #[test]
    fn build_composes_overview_and_rankings() {
        let reporter = DashboardReporter::new(MonitorConfig::default());
        let mut store = MetricStore::new(100);
        store.record(sample("a", 1, 100, true));
        store.record(sample("b", 1, 200, true));
        let mut alerts = AlertEngine::new(100);
        alerts.connection_error("b", "down");

        let mut stats = HashMap::new();
        stats.insert("a".to_string(), QueueStats::from_counts(5, 1, 10, 0, 0, 0));
        let health = crate::monitoring::aggregator::SystemAggregator::new()
            .aggregate(vec![check("a", 100), check("b", 33)], &stats);

        let data = reporter.build(health, &stats, &store, &alerts);

        assert_eq!(data.overview.total_queues, 2);
        assert_eq!(data.overview.waiting_jobs, 5);
        assert_eq!(data.overview.active_alerts, 1);
        assert_eq!(data.queues[1].stats, None);
        assert_eq!(data.recent_activity.len(), 2);
        assert_eq!(data.recent_activity[0].queue_name, "b");
        assert_eq!(data.top_performers[0].queue_name, "a");
        assert_eq!(data.problematic_queues.len(), 1);
        assert_eq!(data.problematic_queues[0].queue_name, "b");
    }

    #[test]
    fn real_time_marks_failed_probes_disconnected() {
        let reporter = DashboardReporter::new(MonitorConfig::default());
        let mut store = MetricStore::new(100);
        store.record(sample("a", 0, 50, true));
        let alerts = AlertEngine::new(100);

        let probes = vec![
            ("a".to_string(), Some(QueueStats::from_counts(3, 2, 0, 0, 0, 0))),
            ("b".to_string(), None),
        ];
        let snapshot = reporter.real_time(&probes, &store, &alerts);

        assert!(snapshot.queues[0].connected);
        assert!(!snapshot.queues[1].connected);
        assert_eq!(snapshot.total_waiting, 3);
        assert_eq!(snapshot.total_active, 2);
        assert_eq!(snapshot.jobs_last_minute, 1);
        assert_eq!(snapshot.active_alerts, 0);
    }

    #[test]
    fn build_tolerates_extreme_windows_and_counts() {
        let reporter = DashboardReporter::new(MonitorConfig {
            metric_window_hours: u64::MAX,
            performance_window_minutes: u64::MAX,
            active_alert_window_minutes: i64::MAX,
            ..MonitorConfig::default()
        });
        let mut store = MetricStore::new(100);
        store.record(sample("a", 1, u64::MAX, true));
        store.record(sample("a", 2, u64::MAX, true));
        let mut alerts = AlertEngine::new(100);
        alerts.connection_error("b", "down");

        let mut stats = HashMap::new();
        stats.insert("a".to_string(), QueueStats::from_counts(u64::MAX, 0, 0, 0, 0, 0));
        stats.insert("b".to_string(), QueueStats::from_counts(7, 0, 0, 0, 0, 0));
        let health = crate::monitoring::aggregator::SystemAggregator::new()
            .aggregate(vec![check("a", 100), check("b", 33)], &stats);

        let data = reporter.build(health, &stats, &store, &alerts);

        assert_eq!(data.overview.waiting_jobs, u64::MAX);
        assert_eq!(data.overview.total_jobs, u64::MAX);
        assert_eq!(data.overview.active_alerts, 1);
        assert_eq!(data.queues[0].performance.sample_count, 2);
        assert_eq!(data.performance_trends.iter().map(|t| t.jobs_processed).sum::<usize>(), 2);
    }
}
