//! Axum router: maps all URL paths to handlers.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::handlers::{
    analysis::{analyze_dataframe, analyze_upload},
    monitor::run_monitor,
    reports::{download_report, list_reports, report_summary},
    system::health,
};
use crate::sse::sse_handler;
use crate::state::{AppState, SharedState};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes();
    let cors = cors_layer(&state.config.server.cors_origins);
    let shared: SharedState = Arc::new(state);

    Router::new()
        // Analysis
        .route("/analisar/",           post(analyze_upload))
        .route("/analisar/dataframe/", post(analyze_dataframe))

        // Reports
        .route("/baixar/{name}",       get(download_report))
        .route("/relatorios/",         get(list_reports))
        .route("/relatorios/{name}",   get(report_summary))

        // Monitoring
        .route("/monitor/api",         post(run_monitor))

        // System
        .route("/health",              get(health))
        .route("/api/events",          get(sse_handler))

        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Permissive when no origins are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new().allow_origin(allowed).allow_methods(Any).allow_headers(Any)
}
