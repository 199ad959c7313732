use std::net::SocketAddr;
use std::sync::Arc;

use tonepicker_core::ai_configured;
use tonepicker_server::{build_app, ServerConfig};
use tonepicker_suggest::{LlmToneModel, ResultCache, ToneAdjuster};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    if !ai_configured(&config.ai) {
        warn!(
            provider = %config.ai.provider,
            "no API key configured, tone adjustments will fail upstream"
        );
    }

    let cache = Arc::new(ResultCache::new(config.cache_ttl));
    let model = Arc::new(LlmToneModel::new(config.ai.clone()));
    let adjuster = ToneAdjuster::new(cache, model).with_upstream_timeout(config.upstream_timeout);
    let app = build_app(Arc::new(adjuster), &config.allowed_origins());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running on port {}", config.port);
    info!("Health check: http://localhost:{}/api/health", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| error!("server error: {e}"))?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
