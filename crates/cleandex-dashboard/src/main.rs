//! Cleandex dashboard
//!
//! Run with: cargo run -p cleandex-dashboard

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use cleandex_config::Config;
use cleandex_dashboard::backend::HttpBackend;
use cleandex_dashboard::router::build_router;
use cleandex_dashboard::state::DashboardState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;
    let backend = HttpBackend::new(&config.dashboard)?;
    info!(backend = %backend.base_url(), "Starting Cleandex dashboard...");

    let fetch_timeout = Duration::from_secs(config.dashboard.backend_timeout_secs);
    let state = Arc::new(DashboardState::new(Arc::new(backend), fetch_timeout)?);
    let app = build_router(state);

    let addr = config.dashboard.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Dashboard listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
