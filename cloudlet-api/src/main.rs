use anyhow::{Context, Result};
use cloudlet_api::{create_app, AppState, Config};
use cloudlet_orchestrator::{HttpBackendConfig, HttpComputeBackend};
use std::sync::Arc;
use tracing::info;
use url::Url;

#[tokio::main]
async fn main() -> Result<()> {
    // Keep the guard alive so buffered file output is flushed on exit
    let _log_guard = cloudlet_logging::init_subscriber();

    info!("Starting cloudlet-api service...");

    let config = Config::from_env();
    info!(
        "Configuration loaded: bind_addr={}, backend_url={}, placement={}x{}ms",
        config.bind_addr,
        config.backend_url,
        config.placement_max_attempts,
        config.placement_interval_ms
    );

    let base_url = Url::parse(&config.backend_url)
        .with_context(|| format!("Invalid backend URL: {}", config.backend_url))?;
    let backend = HttpComputeBackend::new(
        HttpBackendConfig::new(base_url).with_timeout(config.backend_timeout()),
    )?;

    let state = AppState::new(Arc::new(backend), &config);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
