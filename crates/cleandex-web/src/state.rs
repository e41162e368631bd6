//! Shared application state for the API server.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use cleandex_common::error::Result;
use cleandex_common::reliability::Grade;
use cleandex_config::Config;
use cleandex_monitor::Monitor;
use cleandex_profile::{Profiler, ReportRenderer, ReportStore};

/// Events pushed to connected clients via SSE.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// A dataset was profiled and its report stored
    ReportGenerated { name: String, download: String, index: f64, grade: Grade },
    /// A monitoring run finished
    MonitorCompleted { run_id: Uuid, overall_score: f64, total_endpoints: usize, failed: usize },
}

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub config: Config,
    pub store: ReportStore,
    pub renderer: ReportRenderer,
    pub profiler: Profiler,
    pub monitor: Monitor,
    /// Broadcast channel for SSE push events
    pub event_tx: broadcast::Sender<AppEvent>,
}

impl AppState {
    /// Open the report store and build the profiler, renderer and monitor from `config`.
    pub async fn new(config: Config) -> Result<Self> {
        let store = ReportStore::open(&config.reports.dir).await?;
        let renderer = ReportRenderer::with_template_dir(config.reports.template_dir.as_deref())?;
        let profiler = Profiler::new(config.profile.thresholds.clone(), config.profile.weights.clone());
        let monitor = Monitor::new(config.monitor.clone());
        let (event_tx, _) = broadcast::channel(256);
        Ok(Self { config, store, renderer, profiler, monitor, event_tx })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    /// Send to current subscribers; no subscribers is fine.
    pub fn publish(&self, event: AppEvent) {
        let _ = self.event_tx.send(event);
    }
}

pub type SharedState = Arc<AppState>;
