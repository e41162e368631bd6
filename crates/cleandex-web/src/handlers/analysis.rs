//! Dataset analysis: CSV upload and JSON dataframe.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use cleandex_common::reliability::ReliabilityIndex;
use cleandex_profile::{sanitize_name, Dataset, ReportSummary};

use crate::error::{ApiError, ApiResult};
use crate::state::{AppEvent, SharedState};

pub const UPLOAD_FIELD: &str = "file";
const DONE_MESSAGE: &str = "Análise concluída";

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub mensagem: String,
    pub relatorio: String,
    pub reliability: ReliabilityIndex,
}

/// POST /analisar/: multipart CSV upload in the `file` field.
#[instrument(skip_all)]
pub async fn analyze_upload(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> ApiResult<Json<AnalysisResponse>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        info!(file = ?file_name, bytes = bytes.len(), "received upload");

        let dataset = tokio::task::spawn_blocking(move || Dataset::from_csv(&bytes)).await??;

        let (name, reserved) = match file_name.as_deref().map(sanitize_name) {
            Some(Ok(name)) => (name, false),
            Some(Err(_)) | None => (state.store.reserve_timestamp_name().await?, true),
        };
        let title = file_name.unwrap_or_else(|| name.clone());
        return analyze(state, dataset, name, title, reserved).await.map(Json);
    }
    Err(ApiError::bad_request(format!("missing multipart field '{UPLOAD_FIELD}'")))
}

/// POST /analisar/dataframe/: column-object or records JSON.
#[instrument(skip_all)]
pub async fn analyze_dataframe(
    State(state): State<SharedState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Json<AnalysisResponse>> {
    let Json(value) = payload?;
    let dataset = Dataset::from_json(&value)?;
    let name = state.store.reserve_timestamp_name().await?;
    let title = format!("dataframe {name}");
    analyze(state, dataset, name, title, true).await.map(Json)
}

/// Run [`profile_and_store`], giving back a reserved name when it fails.
async fn analyze(
    state: SharedState,
    dataset: Dataset,
    name: String,
    title: String,
    reserved: bool,
) -> ApiResult<AnalysisResponse> {
    let result = profile_and_store(state.clone(), dataset, &name, title).await;
    if result.is_err() && reserved {
        if let Err(e) = state.store.release(&name).await {
            warn!(report = %name, error = %e, "failed to release report name");
        }
    }
    result
}

/// Profile and render off the async runtime, then store the report.
async fn profile_and_store(
    state: SharedState,
    dataset: Dataset,
    name: &str,
    title: String,
) -> ApiResult<AnalysisResponse> {
    let worker = state.clone();
    let render_title = title.clone();
    let (html, profile) = tokio::task::spawn_blocking(move || {
        let profile = worker.profiler.profile(&dataset);
        worker.renderer.render(&render_title, &profile).map(|html| (html, profile))
    })
    .await??;

    if !profile.alerts.is_empty() {
        warn!(report = %name, alerts = profile.alerts.len(), "dataset has quality alerts");
    }

    let summary = ReportSummary::from_profile(&title, &profile);
    let stored = state.store.save(name, &html, &summary).await?;

    state.publish(AppEvent::ReportGenerated {
        name: stored.name.clone(),
        download: stored.download.clone(),
        index: profile.reliability.index,
        grade: profile.reliability.grade,
    });

    Ok(AnalysisResponse {
        mensagem: DONE_MESSAGE.to_string(),
        relatorio: stored.download,
        reliability: profile.reliability,
    })
}
