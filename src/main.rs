//! # Augment Gateway server binary

use augment_gateway::{
    create_router, graceful_shutdown::DEFAULT_DRAIN_TIMEOUT, AppState, Config, GracefulShutdown,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from CLI args and .env file
    let config = Config::parse_args();

    let shutdown = GracefulShutdown::new();
    let state = AppState::new(config.clone(), shutdown.token()).await?;
    let active = state.gateway().pool().list_active().await.len();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("🚀 Augment gateway listening on http://{}", listener.local_addr()?);
    info!("Default model: {}", config.default_model);
    info!("Active credentials: {}", active);
    if !config.auth_enabled() {
        warn!("UNIFIED_TOKEN is not set; /v1 routes accept unauthenticated requests");
    }

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown.clone().signal());
    shutdown
        .run_until_drained(async move { server.await }, DEFAULT_DRAIN_TIMEOUT)
        .await?;

    Ok(())
}
