//! In-memory job metric store.
//!
//! `MetricStore` holds a bounded window of `PerformanceSample` values for
//! every monitored queue. The capacity is shared across queues: once full,
//! the oldest sample overall is evicted before a new one is inserted
//! (ring-buffer semantics backed by `VecDeque`), so one very busy queue can
//! push out the history of quieter ones.
//!
//! Callers share it as `Arc<RwLock<MetricStore>>` between the monitoring
//! loop, job-completion callbacks and the Axum handlers.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::monitoring::types::{PerformanceSample, PerformanceSummary};

/// Default maximum number of samples retained in memory.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Store handle shared between tasks.
pub type SharedMetricStore = Arc<RwLock<MetricStore>>;

/// Capacity-bounded in-memory store for `PerformanceSample` values.
#[derive(Debug)]
pub struct MetricStore {
    data: VecDeque<PerformanceSample>,
    capacity: usize,
}

impl MetricStore {
    /// Create a new store with the given maximum capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn shared(capacity: usize) -> SharedMetricStore {
        Arc::new(RwLock::new(Self::new(capacity)))
    }

    /// Append a sample, evicting the oldest if the store is full.
    pub fn record(&mut self, sample: PerformanceSample) {
        if self.capacity == 0 {
            return;
        }
        if self.data.len() >= self.capacity {
            self.data.pop_front();
        }
        self.data.push_back(sample);
    }

    /// Samples for `queue` recorded in the last `window_hours`, oldest first.
    /// A window longer than chrono can represent returns every sample.
    pub fn query(&self, queue: &str, window_hours: u64) -> Vec<PerformanceSample> {
        self.query_since(queue, hours_before(Utc::now(), window_hours))
    }

    /// Samples for `queue` with a timestamp >= `since`, oldest first.
    pub fn query_since(&self, queue: &str, since: DateTime<Utc>) -> Vec<PerformanceSample> {
        self.data
            .iter()
            .filter(|s| s.queue_name == queue && s.timestamp >= since)
            .cloned()
            .collect()
    }

    /// Samples across every queue with a timestamp >= `since`, oldest first.
    pub fn all_since(&self, since: DateTime<Utc>) -> Vec<PerformanceSample> {
        self.data
            .iter()
            .filter(|s| s.timestamp >= since)
            .cloned()
            .collect()
    }

    /// The `n` most recently recorded samples across all queues, newest first.
    pub fn recent(&self, n: usize) -> Vec<PerformanceSample> {
        self.data.iter().rev().take(n).cloned().collect()
    }

    /// Performance figures for `queue` over the last `window_minutes`.
    pub fn summary(&self, queue: &str, window_minutes: u64) -> PerformanceSummary {
        let samples = self.query_since(queue, minutes_before(Utc::now(), window_minutes));
        PerformanceSummary::from_samples(&samples, window_minutes)
    }

    /// Drop samples for one queue, or everything when `queue` is `None`.
    /// Returns how many samples were removed.
    pub fn clear(&mut self, queue: Option<&str>) -> usize {
        let before = self.data.len();
        match queue {
            Some(name) => self.data.retain(|s| s.queue_name != name),
            None => self.data.clear(),
        }
        before - self.data.len()
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// `true` when the store contains no samples.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Start of a trailing window ending at `now`. `None`, or a window reaching
/// past the earliest representable instant, means no lower bound.
pub fn window_start(now: DateTime<Utc>, window: Option<Duration>) -> DateTime<Utc> {
    window
        .and_then(|w| now.checked_sub_signed(w))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub fn hours_before(now: DateTime<Utc>, hours: u64) -> DateTime<Utc> {
    window_start(now, i64::try_from(hours).ok().and_then(Duration::try_hours))
}

pub fn minutes_before(now: DateTime<Utc>, minutes: u64) -> DateTime<Utc> {
    window_start(now, i64::try_from(minutes).ok().and_then(Duration::try_minutes))
}
