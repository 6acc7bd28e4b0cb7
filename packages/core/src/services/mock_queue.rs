//! In-memory queue backend.
//!
//! Implements `QueueStatsProvider` over a map of canned stats so the monitor
//! can be exercised without a real queue: queues can be made to fail or to
//! respond slowly, and stats can be changed while the monitor is running.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::monitoring::{
    error::ProviderError,
    provider::{ProviderResult, QueueStatsProvider},
    types::QueueStats,
};

#[derive(Debug, Default)]
struct BackendState {
    stats: HashMap<String, QueueStats>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    paused: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct MockQueueBackend {
    state: RwLock<BackendState>,
}

impl MockQueueBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queue(mut self, queue: &str, stats: QueueStats) -> Self {
        self.state.get_mut().stats.insert(queue.to_string(), stats);
        self
    }

    /// Every call against `queue` fails as unavailable.
    pub fn with_failing_queue(mut self, queue: &str) -> Self {
        self.state.get_mut().failing.insert(queue.to_string());
        self
    }

    /// Every call against `queue` sleeps for `delay` before answering.
    pub fn with_delay(mut self, queue: &str, delay: Duration) -> Self {
        self.state.get_mut().delays.insert(queue.to_string(), delay);
        self
    }

    pub async fn set_stats(&self, queue: &str, stats: QueueStats) {
        self.state.write().await.stats.insert(queue.to_string(), stats);
    }

    pub async fn set_failing(&self, queue: &str, failing: bool) {
        let mut state = self.state.write().await;
        if failing {
            state.failing.insert(queue.to_string());
        } else {
            state.failing.remove(queue);
        }
    }

    pub async fn is_paused(&self, queue: &str) -> bool {
        self.state.read().await.paused.contains(queue)
    }

    /// Apply the configured delay and failure mode for `queue`.
    async fn gate(&self, queue: &str) -> ProviderResult<()> {
        let delay = self.state.read().await.delays.get(queue).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.read().await;
        if state.failing.contains(queue) {
            return Err(ProviderError::unavailable(queue, "connection refused"));
        }
        if !state.stats.contains_key(queue) {
            return Err(ProviderError::UnknownQueue {
                queue: queue.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl QueueStatsProvider for MockQueueBackend {
    async fn get_stats(&self, queue: &str) -> ProviderResult<QueueStats> {
        self.gate(queue).await?;
        Ok(self.state.read().await.stats[queue])
    }

    async fn is_healthy(&self, queue: &str) -> ProviderResult<bool> {
        self.gate(queue).await?;
        Ok(true)
    }

    async fn pause(&self, queue: &str) -> ProviderResult<()> {
        self.gate(queue).await?;
        self.state.write().await.paused.insert(queue.to_string());
        Ok(())
    }

    async fn resume(&self, queue: &str) -> ProviderResult<()> {
        self.gate(queue).await?;
        self.state.write().await.paused.remove(queue);
        Ok(())
    }

    async fn clean(&self, queue: &str, _grace_ms: u64, status: &str) -> ProviderResult<u64> {
        self.gate(queue).await?;
        let mut state = self.state.write().await;
        let Some(stats) = state.stats.get_mut(queue) else {
            return Ok(0);
        };

        let removed = match status {
            "completed" => std::mem::take(&mut stats.completed),
            "failed" => std::mem::take(&mut stats.failed),
            "delayed" => std::mem::take(&mut stats.delayed),
            "waiting" => std::mem::take(&mut stats.waiting),
            _ => 0,
        };
        stats.total -= removed;
        Ok(removed)
    }

    fn provider_name(&self) -> &str {
        "in-memory"
    }
}
