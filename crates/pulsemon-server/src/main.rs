use anyhow::Result;
use pulsemon_server::app;
use pulsemon_server::config::ServerConfig;
use pulsemon_server::service::MetricService;
use pulsemon_server::state::AppState;
use pulsemon_storage::MemoryStorage;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pulsemon=info".parse()?))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/server.toml".to_string());
    let config = ServerConfig::load_or_default(&config_path)?;

    let storage = Arc::new(MemoryStorage::new());
    let service = MetricService::new(storage);
    let state = AppState::new(service);
    let app = app::build_http_app(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!(listen = %config.listen_addr, "pulsemon-server starting");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            signal::ctrl_c().await.ok();
            tracing::info!("Shutting down gracefully");
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
