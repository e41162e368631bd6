//! Report download and listing.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use tracing::debug;

use cleandex_profile::{ReportEntry, ReportStore, ReportSummary};

use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

/// GET /baixar/{name}: the HTML report as an attachment.
pub async fn download_report(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let path = state.store.locate(&name).await?;
    let body = tokio::fs::read(&path).await.map_err(|_| ApiError::not_found())?;
    debug!(report = %name, bytes = body.len(), "serving report");

    let disposition = ReportStore::attachment_disposition(&name);
    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// GET /relatorios/: stored reports, newest first.
pub async fn list_reports(State(state): State<SharedState>) -> ApiResult<Json<Vec<ReportEntry>>> {
    Ok(Json(state.store.list().await?))
}

/// GET /relatorios/{name}: stored summary of one report.
pub async fn report_summary(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> ApiResult<Json<ReportSummary>> {
    Ok(Json(state.store.summary(&name).await?))
}
