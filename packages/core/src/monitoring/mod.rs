//! Queue Monitoring Module
//!
//! Probes registered queues, scores their health, keeps recent job samples
//! and alerts in memory, and assembles the system, report and dashboard views.

pub mod aggregator;
pub mod config;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod provider;
pub mod scorer;
pub mod types;


pub use config::MonitorConfig;
pub use engine::QueueMonitor;
pub use error::{MonitorError, MonitorResult, ProviderError};
pub use provider::{QueueStatsProvider, SharedProvider};
pub use types::*;
