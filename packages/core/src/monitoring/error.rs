//! Error types for queue monitoring

use thiserror::Error;

/// Errors surfaced to callers of the monitoring API
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Queue '{queue}' is not registered")]
    UnknownQueue { queue: String },

    #[error("Monitoring interval must be greater than zero")]
    InvalidInterval,

    #[error("Invalid job metric: {message}")]
    InvalidSample { message: String },

    #[error("Queue backend error: {0}")]
    Provider(#[from] ProviderError),
}

/// Errors from queue backends
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Queue '{queue}' unavailable: {message}")]
    Unavailable { queue: String, message: String },

    #[error("Queue '{queue}' did not respond within {timeout_ms}ms")]
    Timeout { queue: String, timeout_ms: u64 },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Data format error: {message}")]
    Format { message: String },

    #[error("Queue '{queue}' does not exist on the backend")]
    UnknownQueue { queue: String },
}

impl MonitorError {
    pub fn unknown_queue(queue: impl Into<String>) -> Self {
        Self::UnknownQueue { queue: queue.into() }
    }

    pub fn invalid_sample(message: impl Into<String>) -> Self {
        Self::InvalidSample { message: message.into() }
    }
}

impl ProviderError {
    pub fn unavailable(queue: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            queue: queue.into(),
            message: message.into(),
        }
    }
}

pub type MonitorResult<T> = Result<T, MonitorError>;
