//! Endpoint probes.

use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::future::join_all;
use reqwest::{header, redirect, Client, ClientBuilder, RequestBuilder, Response};
use secrecy::ExposeSecret;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use cleandex_common::error::{CleandexError, Result};
use cleandex_common::settings::MonitorSettings;

use crate::models::{
    AuthConfig, AuthType, EndpointResult, EndpointStatus, MonitorReport, MonitorRequest, MonitorResults,
};
use crate::scoring::{availability_points, check_format, endpoint_score, latency_points, overall_score, stats};
use crate::validate::validate_request;

/// Runs monitoring requests with shared settings.
#[derive(Debug, Clone, Default)]
pub struct Monitor {
    settings: MonitorSettings,
}

/// Per-run options shared by every probe.
struct ProbeContext<'a> {
    client: Client,
    auth: Option<&'a AuthConfig>,
    expected_keys: &'a [String],
    timeout_secs: f64,
    validate_ssl: bool,
}

impl Monitor {
    pub fn new(settings: MonitorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    fn build_client(&self, req: &MonitorRequest) -> Result<Client> {
        let policy = if req.follow_redirects {
            redirect::Policy::limited(self.settings.max_redirects)
        } else {
            redirect::Policy::none()
        };
        ClientBuilder::new()
            .timeout(Duration::from_secs(req.timeout))
            .redirect(policy)
            .danger_accept_invalid_certs(!req.validate_ssl)
            .user_agent(self.settings.user_agent.clone())
            .build()
            .map_err(CleandexError::Http)
    }

    /// Validate the request, probe every endpoint concurrently and score the run.
    /// Results keep the request's endpoint order.
    #[instrument(skip(self, req), fields(endpoints = req.endpoints.len(), timeout = req.timeout))]
    pub async fn run(&self, req: &MonitorRequest) -> Result<MonitorReport> {
        let targets = validate_request(req, self.settings.max_endpoints)?;
        let ctx = ProbeContext {
            client: self.build_client(req)?,
            auth: req.auth.as_ref(),
            expected_keys: &targets.expected_keys,
            timeout_secs: req.timeout as f64,
            validate_ssl: req.validate_ssl,
        };

        let endpoints: Vec<EndpointResult> =
            join_all(targets.endpoints.iter().map(|url| self.probe(&ctx, url))).await;

        let report = MonitorReport {
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            overall_score: overall_score(&endpoints),
            stats: stats(&endpoints),
            results: MonitorResults { endpoints },
        };
        info!(
            run_id = %report.run_id,
            score = report.overall_score,
            successful = report.stats.successful,
            failed = report.stats.failed,
            "monitoring run complete"
        );
        Ok(report)
    }

    async fn probe(&self, ctx: &ProbeContext<'_>, url: &str) -> EndpointResult {
        let request = apply_auth(ctx.client.get(url), ctx.auth);
        let started = Instant::now();
        let outcome = request.send().await;

        let mut result = EndpointResult {
            endpoint: url.to_string(),
            status: EndpointStatus::ConnectionError,
            http_status: None,
            response_time: 0.0,
            score: 0,
            valid_format: false,
            missing_keys: ctx.expected_keys.to_vec(),
            error: None,
            warnings: Vec::new(),
        };
        if !ctx.validate_ssl {
            result.warnings.push("TLS certificate validation is disabled".to_string());
        }

        let mut response = match outcome {
            Ok(r) => r,
            Err(e) => {
                result.response_time = round3(started.elapsed().as_secs_f64());
                result.status = if e.is_timeout() { EndpointStatus::Timeout } else { EndpointStatus::ConnectionError };
                result.error = Some(describe_error(&e, ctx.timeout_secs));
                warn!(endpoint = %url, status = result.status.as_str(), "probe failed");
                return result;
            }
        };

        let code = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let (body, truncated) = match read_capped(&mut response, self.settings.max_body_bytes).await {
            Ok(read) => read,
            Err(e) => {
                result.response_time = round3(started.elapsed().as_secs_f64());
                result.http_status = Some(code);
                result.status = if e.is_timeout() { EndpointStatus::Timeout } else { EndpointStatus::ConnectionError };
                result.error = Some(describe_error(&e, ctx.timeout_secs));
                return result;
            }
        };
        let elapsed = started.elapsed().as_secs_f64();

        result.http_status = Some(code);
        result.response_time = round3(elapsed);
        result.status = EndpointStatus::from_http(code);

        let format = check_format(&body, ctx.expected_keys);
        result.valid_format = format.valid;
        result.missing_keys = format.missing_keys.clone();

        let format_points = if result.status == EndpointStatus::Success { format.points } else { 0.0 };
        result.score = endpoint_score(
            availability_points(result.status),
            latency_points(elapsed, self.settings.fast_threshold_secs, ctx.timeout_secs),
            format_points,
        );

        if !matches!(result.status, EndpointStatus::Success) {
            result.error = Some(format!("HTTP {code}"));
        }
        if elapsed > self.settings.slow_threshold_secs {
            result.warnings.push(format!("Slow response: {elapsed:.2}s"));
        }
        if !format.missing_keys.is_empty() && format.is_json {
            result.warnings.push(format!("Missing expected keys: {}", format.missing_keys.join(", ")));
        }
        let json_type = content_type.as_deref().map(|c| c.contains("json")).unwrap_or(false);
        if result.status == EndpointStatus::Success && !json_type {
            result.warnings.push(format!(
                "Unexpected content type: {}",
                content_type.as_deref().unwrap_or("none")
            ));
        }
        if final_url.trim_end_matches('/') != url.trim_end_matches('/') {
            result.warnings.push(format!("Redirected to {final_url}"));
        }
        if truncated {
            result.warnings.push(format!("Response body truncated at {} bytes", self.settings.max_body_bytes));
        }

        debug!(endpoint = %url, code, score = result.score, "probe done");
        result
    }
}

/// Body bytes up to `limit`, and whether the rest was dropped.
async fn read_capped(response: &mut Response, limit: usize) -> reqwest::Result<(Vec<u8>, bool)> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit - body.len();
        if chunk.len() > room {
            body.extend_from_slice(&chunk[..room]);
            return Ok((body, true));
        }
        body.extend_from_slice(&chunk);
    }
    Ok((body, false))
}

fn apply_auth(builder: RequestBuilder, auth: Option<&AuthConfig>) -> RequestBuilder {
    let Some(auth) = auth else {
        return builder;
    };
    match auth.auth_type {
        AuthType::None => builder,
        AuthType::ApiKey => match &auth.api_key {
            Some(key) => builder.header(auth.header_name(), key.expose_secret()),
            None => builder,
        },
        AuthType::Bearer => match &auth.bearer_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        },
        AuthType::Basic => builder.basic_auth(
            auth.username.as_deref().unwrap_or_default(),
            auth.password.as_ref().map(|p| p.expose_secret()),
        ),
    }
}

fn describe_error(e: &reqwest::Error, timeout_secs: f64) -> String {
    if e.is_timeout() {
        format!("Timed out after {timeout_secs}s")
    } else if e.is_connect() {
        "Connection failed".to_string()
    } else if e.is_redirect() {
        "Too many redirects".to_string()
    } else {
        e.to_string()
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
