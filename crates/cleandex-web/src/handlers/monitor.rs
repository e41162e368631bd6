//! API monitoring runs.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use cleandex_monitor::{MonitorReport, MonitorRequest};

use crate::error::ApiResult;
use crate::state::{AppEvent, SharedState};

/// POST /monitor/api
pub async fn run_monitor(
    State(state): State<SharedState>,
    payload: Result<Json<MonitorRequest>, JsonRejection>,
) -> ApiResult<Json<MonitorReport>> {
    let Json(request) = payload?;
    let report = state.monitor.run(&request).await?;

    state.publish(AppEvent::MonitorCompleted {
        run_id: report.run_id,
        overall_score: report.overall_score,
        total_endpoints: report.stats.total_endpoints,
        failed: report.stats.failed,
    });
    Ok(Json(report))
}
