mod config;
mod pipeline;
mod updater;

use anyhow::Result;
use pipeline::Pipeline;
use pulsemon_collector::default_collectors;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use updater::HttpUpdater;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pulsemon=info".parse()?))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/agent.toml".to_string());
    let config = config::AgentConfig::load_or_default(&config_path)?;

    let updater = Arc::new(HttpUpdater::new(
        &config.server_address,
        &config.update_endpoint,
    ));
    tracing::info!(
        target = updater.target_url(),
        poll_secs = config.poll_interval_secs,
        report_secs = config.report_interval_secs,
        workers = config.worker_count,
        "pulsemon-agent starting"
    );

    let pipeline = Pipeline::new(
        default_collectors(),
        updater,
        config.poll_interval(),
        config.report_interval(),
        config.worker_count,
        config.drain_timeout(),
    )?;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        signal::ctrl_c().await.ok();
        tracing::info!("Shutting down gracefully");
        signal_cancel.cancel();
    });

    match pipeline.run(cancel).await {
        Ok(report) => {
            tracing::info!(
                send_failures = report.send_failures,
                worker_panics = report.worker_panics,
                "Agent stopped"
            );
            Ok(())
        }
        Err(err) => {
            tracing::error!(error = %err, "Agent stopped with error");
            Err(err.into())
        }
    }
}
