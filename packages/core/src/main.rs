use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;

use queue_monitor::api::{self, ApiState};
use queue_monitor::cli::Cli;
use queue_monitor::config::Config;
use queue_monitor::error::AppError;
use queue_monitor::logging::init_logging;
use queue_monitor::metrics::AppMetrics;
use queue_monitor::monitoring::QueueMonitor;
use queue_monitor::services::QueueApiClient;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let config = Config::load(&cli)
        .map_err(AppError::Config)
        .unwrap_or_else(|err| {
            tracing::error!("{}", err);
            std::process::exit(1);
        });

    if let Err(err) = run(config).await {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), AppError> {
    tracing::info!(
        queue_api_url = %config.queue_api_url,
        queues = ?config.queues,
        interval_ms = config.monitor_interval_ms,
        "Service starting"
    );

    let metrics = Arc::new(AppMetrics::new()?);
    let provider = Arc::new(QueueApiClient::new(config.queue_api_url.clone()));
    let monitor = Arc::new(
        QueueMonitor::new(provider, config.queues.clone(), config.monitor_config())
            .with_metrics(metrics.clone()),
    );

    monitor
        .start_monitoring(config.monitor_interval_ms)
        .await
        .map_err(|err| AppError::Config(err.to_string()))?;

    let app = api::create_router(ApiState {
        monitor: monitor.clone(),
        metrics,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::Network(format!("failed to bind {}: {}", addr, err)))?;
    tracing::info!(address = %addr, "Monitoring API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    monitor.stop_monitoring().await;
    tracing::info!("Service shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping gracefully");
}
