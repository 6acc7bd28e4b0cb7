//! HTTP adapter for a queue admin API.
//!
//! Implements `QueueStatsProvider` against a backend that exposes per-queue
//! stats, liveness and control endpoints under `{base_url}/queues/{name}`.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::monitoring::{
    error::ProviderError,
    provider::{ProviderResult, QueueStatsProvider},
    types::QueueStats,
};

#[derive(Clone)]
pub struct QueueApiClient {
    base_url: String,
    http: Client,
}

impl QueueApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base_url}/queues/{queue}/{action}` with the queue name encoded as a
    /// single path segment.
    fn queue_url(&self, queue: &str, action: &str) -> ProviderResult<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|err| ProviderError::Network {
            message: format!("invalid queue API URL {}: {}", self.base_url, err),
        })?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Network {
                message: format!("queue API URL cannot carry a path: {}", self.base_url),
            })?
            .pop_if_empty()
            .extend(["queues", queue, action]);
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    waiting: u64,
    active: u64,
    completed: u64,
    failed: u64,
    delayed: u64,
    #[serde(default)]
    paused: u64,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    healthy: bool,
}

#[derive(Debug, Serialize)]
struct CleanRequest<'a> {
    grace_ms: u64,
    status: &'a str,
}

#[derive(Debug, Deserialize)]
struct CleanResponse {
    removed: u64,
}

fn network_error(err: reqwest::Error) -> ProviderError {
    ProviderError::Network {
        message: err.to_string(),
    }
}

/// Turn non-2xx responses into provider errors.
fn check_status(queue: &str, response: Response) -> ProviderResult<Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(ProviderError::UnknownQueue {
            queue: queue.to_string(),
        }),
        status => Err(ProviderError::unavailable(
            queue,
            format!("queue API returned HTTP {}", status),
        )),
    }
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> ProviderResult<T> {
    response.json::<T>().await.map_err(|err| ProviderError::Format {
        message: err.to_string(),
    })
}

#[async_trait]
impl QueueStatsProvider for QueueApiClient {
    async fn get_stats(&self, queue: &str) -> ProviderResult<QueueStats> {
        let response = self
            .http
            .get(self.queue_url(queue, "stats")?)
            .send()
            .await
            .map_err(network_error)?;

        let raw: StatsResponse = parse_json(check_status(queue, response)?).await?;

        Ok(QueueStats::from_counts(
            raw.waiting,
            raw.active,
            raw.completed,
            raw.failed,
            raw.delayed,
            raw.paused,
        ))
    }

    async fn is_healthy(&self, queue: &str) -> ProviderResult<bool> {
        let response = self
            .http
            .get(self.queue_url(queue, "health")?)
            .send()
            .await
            .map_err(network_error)?;

        let health: HealthResponse = parse_json(check_status(queue, response)?).await?;
        Ok(health.healthy)
    }

    async fn pause(&self, queue: &str) -> ProviderResult<()> {
        let response = self
            .http
            .post(self.queue_url(queue, "pause")?)
            .send()
            .await
            .map_err(network_error)?;
        check_status(queue, response)?;
        Ok(())
    }

    async fn resume(&self, queue: &str) -> ProviderResult<()> {
        let response = self
            .http
            .post(self.queue_url(queue, "resume")?)
            .send()
            .await
            .map_err(network_error)?;
        check_status(queue, response)?;
        Ok(())
    }

    async fn clean(&self, queue: &str, grace_ms: u64, status: &str) -> ProviderResult<u64> {
        let response = self
            .http
            .post(self.queue_url(queue, "clean")?)
            .json(&CleanRequest { grace_ms, status })
            .send()
            .await
            .map_err(network_error)?;

        let cleaned: CleanResponse = parse_json(check_status(queue, response)?).await?;
        Ok(cleaned.removed)
    }

    fn provider_name(&self) -> &str {
        "queue-api"
    }
}
