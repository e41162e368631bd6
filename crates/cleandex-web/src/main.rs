//! Cleandex API server
//!
//! Run with: cargo run -p cleandex-web --bin cleandex-api

use tracing::info;
use tracing_subscriber::EnvFilter;

use cleandex_config::Config;
use cleandex_web::{router::build_router, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;
    let addr = config.server.bind_addr();

    info!("Starting Cleandex API...");
    let state = AppState::new(config).await?;
    info!(reports_dir = %state.store.dir().display(), "reports directory");

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
