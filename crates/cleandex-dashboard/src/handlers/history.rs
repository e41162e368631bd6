//! Report history and report download proxy.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use cleandex_profile::{ReportEntry, ReportStore};

use crate::backend::BackendError;
use crate::state::SharedState;

#[derive(Serialize)]
struct HistoryPage {
    title: &'static str,
    active: &'static str,
    error: Option<String>,
    reports: Vec<ReportRow>,
}

#[derive(Serialize)]
struct ReportRow {
    name: String,
    title: String,
    created: String,
    index: String,
    grade: String,
    size: String,
    download: String,
}

impl From<ReportEntry> for ReportRow {
    fn from(r: ReportEntry) -> Self {
        Self {
            created: r.created_at.map(|t| t.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_default(),
            index: r.index.map(|i| format!("{i:.1}")).unwrap_or_else(|| "n/a".to_string()),
            grade: r.grade.map(|g| g.to_string()).unwrap_or_default(),
            size: format!("{:.1} KB", r.size_bytes as f64 / 1024.0),
            title: r.title.unwrap_or_default(),
            name: r.name,
            download: r.download,
        }
    }
}

/// GET /history: reports stored by the API.
pub async fn history_page(State(state): State<SharedState>) -> Response {
    let (reports, error) = match state.backend.reports().await {
        Ok(reports) => (reports.into_iter().map(ReportRow::from).collect(), None),
        Err(e) => (Vec::new(), Some(e.to_string())),
    };
    state.pages.page("history.html", HistoryPage { title: "Report History", active: "history", error, reports })
}

/// GET /baixar/{name}: relays the report file from the API.
pub async fn download_report(State(state): State<SharedState>, Path(name): Path<String>) -> Response {
    match state.backend.download(&name).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, ReportStore::attachment_disposition(&name)),
            ],
            bytes,
        )
            .into_response(),
        Err(BackendError::Rejected { status: 404, detail }) => {
            state.pages.message(StatusCode::NOT_FOUND, "Not found", "history", "danger", &detail)
        }
        Err(e) => state.pages.message(StatusCode::BAD_GATEWAY, "Error", "history", "danger", &e.to_string()),
    }
}
