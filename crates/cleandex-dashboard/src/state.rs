//! Shared dashboard state.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::RwLock;

use cleandex_monitor::MonitorReport;

use crate::backend::CleandexBackend;
use crate::html::Pages;

pub struct DashboardState {
    pub backend: Arc<dyn CleandexBackend>,
    pub pages: Pages,
    /// Client for fetching JSON sources to analyze
    pub http: Client,
    /// Most recent monitoring run shown on the results page
    pub last_run: RwLock<Option<MonitorReport>>,
}

impl DashboardState {
    pub fn new(backend: Arc<dyn CleandexBackend>, fetch_timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(fetch_timeout).build()?;
        Ok(Self { backend, pages: Pages::new()?, http, last_run: RwLock::new(None) })
    }
}

pub type SharedState = Arc<DashboardState>;
