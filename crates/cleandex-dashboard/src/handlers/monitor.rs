//! Monitoring form and results dashboard.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::info;

use cleandex_monitor::models::{DEFAULT_API_KEY_HEADER, MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS};
use cleandex_monitor::{is_valid_url, AuthConfig, AuthType, EndpointResult, MonitorReport, MonitorRequest};

use crate::state::SharedState;

const DEFAULT_ENDPOINTS: &str = "https://api.chucknorris.io/jokes/random\nhttps://jsonplaceholder.typicode.com/todos/1";
const DEFAULT_EXPECTED_KEYS: &str = "value,id,userId";

const AUTH_TYPES: [&str; 4] = ["none", "api_key", "bearer", "basic"];

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorForm {
    pub endpoints: String,
    #[serde(default)]
    pub expected_keys: String,
    pub timeout: u64,
    #[serde(default)]
    pub auth_type: String,
    pub api_key: Option<String>,
    pub api_key_header: Option<String>,
    pub bearer_token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for MonitorForm {
    fn default() -> Self {
        Self {
            endpoints: DEFAULT_ENDPOINTS.to_string(),
            expected_keys: DEFAULT_EXPECTED_KEYS.to_string(),
            timeout: 10,
            auth_type: "none".to_string(),
            api_key: None,
            api_key_header: Some(DEFAULT_API_KEY_HEADER.to_string()),
            bearer_token: None,
            username: None,
            password: None,
        }
    }
}

fn non_empty(v: &Option<String>) -> Option<String> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

impl MonitorForm {
    /// Build the API request, checking URLs and timeout first.
    pub fn to_request(&self) -> Result<MonitorRequest, String> {
        let endpoints: Vec<String> = self
            .endpoints
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        if endpoints.is_empty() {
            return Err("Enter at least one endpoint".to_string());
        }
        let invalid: Vec<&str> = endpoints.iter().map(String::as_str).filter(|u| !is_valid_url(u)).collect();
        if !invalid.is_empty() {
            return Err(format!("URLs inválidas: {}", invalid.join(", ")));
        }
        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&self.timeout) {
            return Err(format!("Timeout must be between {MIN_TIMEOUT_SECS} and {MAX_TIMEOUT_SECS} seconds"));
        }

        let auth_type = AuthType::parse(&self.auth_type)
            .ok_or_else(|| format!("Unknown auth type: {}", self.auth_type))?;
        let secret = |v: &Option<String>| non_empty(v).map(SecretString::from);

        let mut request = MonitorRequest::new(endpoints);
        request.timeout = self.timeout;
        request.expected_format = self
            .expected_keys
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        request.auth = match auth_type {
            AuthType::None => None,
            AuthType::ApiKey => Some(AuthConfig {
                auth_type,
                api_key: secret(&self.api_key),
                api_key_header: non_empty(&self.api_key_header),
                ..Default::default()
            }),
            AuthType::Bearer => Some(AuthConfig {
                auth_type,
                bearer_token: secret(&self.bearer_token),
                ..Default::default()
            }),
            AuthType::Basic => Some(AuthConfig {
                auth_type,
                username: non_empty(&self.username),
                password: secret(&self.password),
                ..Default::default()
            }),
        };
        Ok(request)
    }
}

/// Form page context. Secrets are never echoed back.
#[derive(Serialize)]
struct FormPage<'a> {
    title: &'static str,
    active: &'static str,
    error: Option<String>,
    form: FormView<'a>,
    auth_types: [&'static str; 4],
    min_timeout: u64,
    max_timeout: u64,
}

#[derive(Serialize)]
struct FormView<'a> {
    endpoints: &'a str,
    expected_keys: &'a str,
    timeout: u64,
    auth_type: &'a str,
    api_key_header: Option<&'a str>,
    username: Option<&'a str>,
}

fn render_form(state: &SharedState, form: &MonitorForm, error: Option<String>) -> Response {
    let view = FormPage {
        title: "New Monitoring",
        active: "monitor",
        error,
        form: FormView {
            endpoints: &form.endpoints,
            expected_keys: &form.expected_keys,
            timeout: form.timeout,
            auth_type: &form.auth_type,
            api_key_header: form.api_key_header.as_deref(),
            username: form.username.as_deref(),
        },
        auth_types: AUTH_TYPES,
        min_timeout: MIN_TIMEOUT_SECS,
        max_timeout: MAX_TIMEOUT_SECS,
    };
    state.pages.page("monitor_form.html", view)
}

pub async fn monitor_page(State(state): State<SharedState>) -> Response {
    render_form(&state, &MonitorForm::default(), None)
}

/// POST /monitor: runs the check and shows the results page.
pub async fn monitor_submit(State(state): State<SharedState>, Form(form): Form<MonitorForm>) -> Response {
    let request = match form.to_request() {
        Ok(r) => r,
        Err(msg) => return render_form(&state, &form, Some(format!("Validation error: {msg}"))),
    };

    match state.backend.monitor(&request).await {
        Ok(report) => {
            info!(run_id = %report.run_id, score = report.overall_score, "monitoring completed");
            *state.last_run.write().await = Some(report);
            Redirect::to("/monitor/results").into_response()
        }
        Err(e) => render_form(&state, &form, Some(e.to_string())),
    }
}

#[derive(Serialize)]
struct ResultsPage {
    title: &'static str,
    active: &'static str,
    run: Option<RunView>,
}

#[derive(Serialize)]
struct RunView {
    run_id: String,
    timestamp: String,
    avg_response_time: String,
    metrics: Vec<MetricView>,
    distribution: Vec<StatusShare>,
    endpoints: Vec<EndpointView>,
}

#[derive(Serialize)]
struct MetricView {
    label: &'static str,
    value: String,
    out_of: Option<u32>,
    color: &'static str,
}

impl MetricView {
    fn new(label: &'static str, value: String, color: &'static str) -> Self {
        Self { label, value, out_of: None, color }
    }

    fn out_of(self, max: u32) -> Self {
        Self { out_of: Some(max), ..self }
    }
}

#[derive(Serialize)]
struct StatusShare {
    status: &'static str,
    count: usize,
    pct: String,
}

#[derive(Serialize)]
struct EndpointView {
    endpoint: String,
    short_name: String,
    status: &'static str,
    http_status: String,
    response_time: String,
    score: u32,
    valid_mark: &'static str,
    missing_keys: String,
    error: Option<String>,
    warnings: Vec<String>,
}

/// GET /monitor/results
pub async fn monitor_results(State(state): State<SharedState>) -> Response {
    let run = state.last_run.read().await.as_ref().map(run_view);
    state.pages.page("monitor_results.html", ResultsPage { title: "Monitoring Dashboard", active: "results", run })
}

/// Last path segment, or the one before a trailing slash.
pub fn short_name(endpoint: &str) -> &str {
    let mut parts = endpoint.rsplit('/');
    match parts.next() {
        Some(last) if !last.is_empty() => last,
        _ => parts.next().filter(|p| !p.is_empty()).unwrap_or(endpoint),
    }
}

fn run_view(report: &MonitorReport) -> RunView {
    let endpoints = &report.results.endpoints;
    let stats = &report.stats;

    let metrics = vec![
        MetricView::new("Overall Score", report.overall_score.to_string(), "#28a745").out_of(100),
        MetricView::new("Total Endpoints", stats.total_endpoints.to_string(), "#007bff"),
        MetricView::new("Successful", stats.successful.to_string(), "#28a745"),
        MetricView::new("Failed", stats.failed.to_string(), "#dc3545"),
    ];

    let mut by_status: BTreeMap<&'static str, usize> = BTreeMap::new();
    for r in endpoints {
        *by_status.entry(r.status.as_str()).or_default() += 1;
    }
    let distribution = by_status
        .into_iter()
        .map(|(status, count)| StatusShare {
            status,
            count,
            pct: format!("{:.0}", count as f64 * 100.0 / endpoints.len().max(1) as f64),
        })
        .collect();

    RunView {
        run_id: report.run_id.to_string(),
        timestamp: report.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        avg_response_time: stats
            .avg_response_time
            .map(|t| format!("{t:.3}s"))
            .unwrap_or_else(|| "n/a".to_string()),
        metrics,
        distribution,
        endpoints: endpoints.iter().map(endpoint_view).collect(),
    }
}

fn endpoint_view(r: &EndpointResult) -> EndpointView {
    EndpointView {
        endpoint: r.endpoint.clone(),
        short_name: short_name(&r.endpoint).to_string(),
        status: r.status.as_str(),
        http_status: r.http_status.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string()),
        response_time: format!("{:.3}", r.response_time),
        score: r.score,
        valid_mark: if r.valid_format { "✅" } else { "❌" },
        missing_keys: r.missing_keys.join(", "),
        error: r.error.clone(),
        warnings: r.warnings.clone(),
    }
}
