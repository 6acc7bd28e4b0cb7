use clap::Parser;

/// Queue Monitor CLI arguments
///
/// Every flag overrides the matching environment variable.
#[derive(Debug, Default, Parser)]
#[command(
    name = "queue-monitor",
    version,
    about = "Health scoring, alerting and dashboards for background job queues"
)]
pub struct Cli {
    /// Queue admin API base URL (QUEUE_API_URL)
    #[arg(long)]
    pub queue_api_url: Option<String>,

    /// Comma-separated queue names to monitor (MONITORED_QUEUES)
    #[arg(long)]
    pub queues: Option<String>,

    /// Probe interval in milliseconds (MONITOR_INTERVAL_MS)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// HTTP port for the monitoring API (API_PORT)
    #[arg(long)]
    pub port: Option<u16>,
}
