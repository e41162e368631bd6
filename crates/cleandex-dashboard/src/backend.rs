//! Client for the Cleandex API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use cleandex_common::reliability::ReliabilityIndex;
use cleandex_config::DashboardConfig;
use cleandex_monitor::{MonitorReport, MonitorRequest};
use cleandex_profile::{ReportEntry, ReportStore};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Erro ao conectar com o backend: {0}")]
    Unreachable(#[from] reqwest::Error),

    /// The backend answered with an error status and `{"detail": ...}`
    #[error("{detail}")]
    Rejected { status: u16, detail: String },

    #[error("Invalid response format from backend: {0}")]
    InvalidResponse(String),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Body returned by both analysis routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub mensagem: String,
    pub relatorio: String,
    pub reliability: ReliabilityIndex,
}

/// Operations the dashboard needs from the API.
#[async_trait]
pub trait CleandexBackend: Send + Sync {
    async fn analyze_csv(&self, file_name: &str, bytes: Vec<u8>) -> BackendResult<AnalysisOutcome>;
    async fn analyze_dataframe(&self, data: &Value) -> BackendResult<AnalysisOutcome>;
    async fn monitor(&self, request: &MonitorRequest) -> BackendResult<MonitorReport>;
    async fn reports(&self) -> BackendResult<Vec<ReportEntry>>;
    async fn download(&self, name: &str) -> BackendResult<Vec<u8>>;
}

/// [`CleandexBackend`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &DashboardConfig) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.backend_timeout_secs))
            .build()?;
        Ok(Self { client, base_url: config.backend_url.trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turn a non-success response into [`BackendError::Rejected`].
async fn check(resp: Response) -> BackendResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("detail").map(detail_text))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    Err(BackendError::Rejected { status: status.as_u16(), detail })
}

fn detail_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn parse<T: DeserializeOwned>(resp: Response) -> BackendResult<T> {
    let bytes = check(resp).await?.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| BackendError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl CleandexBackend for HttpBackend {
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    async fn analyze_csv(&self, file_name: &str, bytes: Vec<u8>) -> BackendResult<AnalysisOutcome> {
        let part = Part::bytes(bytes).file_name(file_name.to_string()).mime_str("text/csv")?;
        let form = Form::new().part("file", part);
        let resp = self.client.post(self.url("/analisar/")).multipart(form).send().await?;
        parse(resp).await
    }

    #[instrument(skip_all)]
    async fn analyze_dataframe(&self, data: &Value) -> BackendResult<AnalysisOutcome> {
        let resp = self.client.post(self.url("/analisar/dataframe/")).json(data).send().await?;
        parse(resp).await
    }

    #[instrument(skip_all, fields(endpoints = request.endpoints.len()))]
    async fn monitor(&self, request: &MonitorRequest) -> BackendResult<MonitorReport> {
        // Probes may run up to the request timeout
        let timeout = Duration::from_secs(request.timeout + 5);
        let resp = self
            .client
            .post(self.url("/monitor/api"))
            .timeout(timeout)
            .json(request)
            .send()
            .await?;
        parse(resp).await
    }

    async fn reports(&self) -> BackendResult<Vec<ReportEntry>> {
        parse(self.client.get(self.url("/relatorios/")).send().await?).await
    }

    async fn download(&self, name: &str) -> BackendResult<Vec<u8>> {
        let url = self.url(&ReportStore::download_link(name));
        let resp = check(self.client.get(url).send().await?).await?;
        let bytes = resp.bytes().await?;
        debug!(report = %name, bytes = bytes.len(), "downloaded report");
        Ok(bytes.to_vec())
    }
}
