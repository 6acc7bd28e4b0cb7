use std::env;

use crate::alerts::DEFAULT_ALERT_CAPACITY;
use crate::cli::Cli;
use crate::monitoring::MonitorConfig;
use crate::store::DEFAULT_CAPACITY as DEFAULT_METRIC_CAPACITY;

const DEFAULT_INTERVAL_MS: u64 = 30_000;
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_API_PORT: u16 = 3_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub queue_api_url: String,
    pub queues: Vec<String>,
    pub monitor_interval_ms: u64,
    pub probe_timeout_ms: u64,
    pub metric_buffer_capacity: usize,
    pub alert_history_capacity: usize,
    pub api_port: u16,
}

impl Config {
    /// Load from the process environment, letting CLI flags take precedence.
    pub fn load(cli: &Cli) -> Result<Self, String> {
        Self::from_sources(cli, |key| env::var(key).ok())
    }

    /// Resolve every setting from `cli` first, then `lookup`.
    pub fn from_sources<F>(cli: &Cli, lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let queue_api_url = cli
            .queue_api_url
            .clone()
            .or_else(|| lookup("QUEUE_API_URL"))
            .ok_or("QUEUE_API_URL is required")?;
        if !queue_api_url.starts_with("http://") && !queue_api_url.starts_with("https://") {
            return Err(format!("QUEUE_API_URL must be an http(s) URL: {}", queue_api_url));
        }

        let queues = parse_queues(
            &cli.queues
                .clone()
                .or_else(|| lookup("MONITORED_QUEUES"))
                .ok_or("MONITORED_QUEUES is required")?,
        )?;

        let monitor_interval_ms = match cli.interval_ms {
            Some(ms) => ms,
            None => parse_or("MONITOR_INTERVAL_MS", &lookup, DEFAULT_INTERVAL_MS)?,
        };
        if monitor_interval_ms == 0 {
            return Err("MONITOR_INTERVAL_MS must be greater than zero".to_string());
        }

        let probe_timeout_ms = parse_or("PROBE_TIMEOUT_MS", &lookup, DEFAULT_PROBE_TIMEOUT_MS)?;
        if probe_timeout_ms == 0 {
            return Err("PROBE_TIMEOUT_MS must be greater than zero".to_string());
        }

        let api_port = match cli.port {
            Some(port) => port,
            None => parse_or("API_PORT", &lookup, DEFAULT_API_PORT)?,
        };

        Ok(Self {
            queue_api_url,
            queues,
            monitor_interval_ms,
            probe_timeout_ms,
            metric_buffer_capacity: parse_or(
                "METRIC_BUFFER_CAPACITY",
                &lookup,
                DEFAULT_METRIC_CAPACITY,
            )?,
            alert_history_capacity: parse_or(
                "ALERT_HISTORY_CAPACITY",
                &lookup,
                DEFAULT_ALERT_CAPACITY,
            )?,
            api_port,
        })
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            metric_capacity: self.metric_buffer_capacity,
            alert_capacity: self.alert_history_capacity,
            probe_timeout_ms: self.probe_timeout_ms,
            default_interval_ms: self.monitor_interval_ms,
            ..MonitorConfig::default()
        }
    }
}

fn parse_queues(raw: &str) -> Result<Vec<String>, String> {
    let queues: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .collect();

    if queues.is_empty() {
        return Err("MONITORED_QUEUES must name at least one queue".to_string());
    }
    Ok(queues)
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("{} must be a valid number", key)),
        None => Ok(default),
    }
}
