//! Axum router for the dashboard pages.

use axum::routing::{get, post};
use axum::Router;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::handlers::{
    analyze::{analyze_api, analyze_csv, analyze_page},
    history::{download_report, history_page},
    monitor::{monitor_page, monitor_results, monitor_submit},
};
use crate::state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/",                get(analyze_page))
        .route("/analyze/csv",     post(analyze_csv))
        .route("/analyze/api",     post(analyze_api))
        .route("/monitor",         get(monitor_page).post(monitor_submit))
        .route("/monitor/results", get(monitor_results))
        .route("/history",         get(history_page))
        .route("/baixar/{name}",   get(download_report))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
