//! Queue Stats Provider Interface
//!
//! The narrow contract the monitoring core consumes from a job queue backend.
//! Scoring and alerting only ever talk to a queue through this trait.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::monitoring::{error::ProviderError, types::QueueStats};

/// Trait for queue backends to ensure the monitor stays backend-independent
#[async_trait]
pub trait QueueStatsProvider {
    /// Current job counts for `queue`
    async fn get_stats(&self, queue: &str) -> ProviderResult<QueueStats>;

    /// Liveness probe for `queue`
    async fn is_healthy(&self, queue: &str) -> ProviderResult<bool>;

    async fn pause(&self, queue: &str) -> ProviderResult<()>;

    async fn resume(&self, queue: &str) -> ProviderResult<()>;

    /// Remove jobs in `status` older than `grace_ms`, returning how many were removed
    async fn clean(&self, queue: &str, grace_ms: u64, status: &str) -> ProviderResult<u64>;

    /// Get the name of this provider for logging/debugging
    fn provider_name(&self) -> &str;
}

/// Shared handle to a provider, as held by the monitor and the scheduler.
pub type SharedProvider = std::sync::Arc<dyn QueueStatsProvider + Send + Sync>;

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Run a backend call with an upper bound on how long it may take.
pub async fn with_timeout<T, F>(queue: &str, timeout: Duration, call: F) -> ProviderResult<T>
where
    F: Future<Output = ProviderResult<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            queue: queue.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}
