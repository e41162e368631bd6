//! Request validation before any network traffic.

use std::sync::OnceLock;

use regex::Regex;
use secrecy::ExposeSecret;
use url::Url;

use cleandex_common::error::{CleandexError, Result};

use crate::models::{AuthConfig, AuthType, MonitorRequest, MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS};

fn url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https?://(?:[-\w.]|(?:%[\da-fA-F]{2}))+").expect("static URL pattern compiles")
    })
}

/// http(s) URL with a host.
pub fn is_valid_url(candidate: &str) -> bool {
    let Ok(parsed) = Url::parse(candidate) else {
        return false;
    };
    matches!(parsed.scheme(), "http" | "https")
        && parsed.host_str().map(|h| !h.is_empty()).unwrap_or(false)
        && url_pattern().is_match(candidate)
}

/// Checked request: cleaned endpoint and key lists.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTargets {
    pub endpoints: Vec<String>,
    pub expected_keys: Vec<String>,
}

/// Validate a request against `max_endpoints`.
pub fn validate_request(req: &MonitorRequest, max_endpoints: usize) -> Result<ValidatedTargets> {
    let endpoints = req.clean_endpoints();
    if endpoints.is_empty() {
        return Err(CleandexError::Validation("at least one endpoint is required".to_string()));
    }
    if endpoints.len() > max_endpoints {
        return Err(CleandexError::Validation(format!(
            "too many endpoints: {} (maximum {max_endpoints})",
            endpoints.len()
        )));
    }

    let invalid: Vec<&str> = endpoints.iter().map(String::as_str).filter(|u| !is_valid_url(u)).collect();
    if !invalid.is_empty() {
        return Err(CleandexError::Validation(format!("Invalid URLs: {}", invalid.join(", "))));
    }

    if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&req.timeout) {
        return Err(CleandexError::Validation(format!(
            "timeout must be between {MIN_TIMEOUT_SECS} and {MAX_TIMEOUT_SECS} seconds"
        )));
    }

    if let Some(auth) = &req.auth {
        validate_auth(auth)?;
    }

    Ok(ValidatedTargets { endpoints, expected_keys: req.clean_expected_keys() })
}

fn validate_auth(auth: &AuthConfig) -> Result<()> {
    let present = |s: &Option<secrecy::SecretString>| {
        s.as_ref().map(|v| !v.expose_secret().is_empty()).unwrap_or(false)
    };
    let missing = match auth.auth_type {
        AuthType::None => None,
        AuthType::ApiKey if !present(&auth.api_key) => Some("api_key"),
        AuthType::Bearer if !present(&auth.bearer_token) => Some("bearer_token"),
        AuthType::Basic if auth.username.as_deref().unwrap_or("").is_empty() => Some("username"),
        AuthType::Basic if !present(&auth.password) => Some("password"),
        _ => None,
    };
    match missing {
        Some(field) => Err(CleandexError::Validation(format!("auth field '{field}' is required"))),
        None => Ok(()),
    }
}
