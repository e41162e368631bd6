//! Request and response types of a monitoring run.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const MIN_TIMEOUT_SECS: u64 = 1;
pub const MAX_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-KEY";

// ── Request ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    #[default]
    None,
    ApiKey,
    Bearer,
    Basic,
}

impl AuthType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "none" | "" => Some(AuthType::None),
            "api_key" => Some(AuthType::ApiKey),
            "bearer" => Some(AuthType::Bearer),
            "basic" => Some(AuthType::Basic),
            _ => None,
        }
    }
}

/// Credentials for the monitored endpoints. Secrets are redacted in `Debug`.
#[derive(Debug, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub auth_type: AuthType,
    pub api_key: Option<SecretString>,
    pub api_key_header: Option<String>,
    pub bearer_token: Option<SecretString>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

impl AuthConfig {
    pub fn header_name(&self) -> &str {
        self.api_key_header
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(DEFAULT_API_KEY_HEADER)
    }
}

/// Serializes with secrets exposed, for forwarding a request to the backend.
impl Serialize for AuthConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            auth_type: AuthType,
            #[serde(skip_serializing_if = "Option::is_none")]
            api_key: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            api_key_header: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            bearer_token: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            username: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            password: Option<&'a str>,
        }

        Wire {
            auth_type: self.auth_type,
            api_key: self.api_key.as_ref().map(|s| s.expose_secret()),
            api_key_header: self.api_key_header.as_deref(),
            bearer_token: self.bearer_token.as_ref().map(|s| s.expose_secret()),
            username: self.username.as_deref(),
            password: self.password.as_ref().map(|s| s.expose_secret()),
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MonitorRequest {
    pub endpoints: Vec<String>,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub expected_format: Vec<String>,
    #[serde(default = "default_true")]
    pub follow_redirects: bool,
    #[serde(default = "default_true")]
    pub validate_ssl: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,
}

fn default_timeout() -> u64 { DEFAULT_TIMEOUT_SECS }
fn default_true() -> bool { true }

impl MonitorRequest {
    pub fn new(endpoints: Vec<String>) -> Self {
        Self {
            endpoints,
            timeout: DEFAULT_TIMEOUT_SECS,
            expected_format: Vec::new(),
            follow_redirects: true,
            validate_ssl: true,
            auth: None,
        }
    }

    /// Endpoints trimmed, blanks dropped.
    pub fn clean_endpoints(&self) -> Vec<String> {
        self.endpoints
            .iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect()
    }

    /// Expected keys trimmed, blanks dropped.
    pub fn clean_expected_keys(&self) -> Vec<String> {
        self.expected_format
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect()
    }
}

// ── Response ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointStatus {
    Success,
    Redirect,
    ClientError,
    ServerError,
    Timeout,
    ConnectionError,
}

impl EndpointStatus {
    pub fn from_http(code: u16) -> Self {
        match code {
            200..=299 => EndpointStatus::Success,
            300..=399 => EndpointStatus::Redirect,
            400..=499 => EndpointStatus::ClientError,
            _ => EndpointStatus::ServerError,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointStatus::Success => "success",
            EndpointStatus::Redirect => "redirect",
            EndpointStatus::ClientError => "client_error",
            EndpointStatus::ServerError => "server_error",
            EndpointStatus::Timeout => "timeout",
            EndpointStatus::ConnectionError => "connection_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointResult {
    pub endpoint: String,
    pub status: EndpointStatus,
    pub http_status: Option<u16>,
    /// Seconds
    pub response_time: f64,
    /// 0 - 100
    pub score: u32,
    pub valid_format: bool,
    #[serde(default)]
    pub missing_keys: Vec<String>,
    pub error: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorStats {
    pub total_endpoints: usize,
    pub successful: usize,
    pub failed: usize,
    pub avg_response_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorResults {
    pub endpoints: Vec<EndpointResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorReport {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub overall_score: f64,
    pub stats: MonitorStats,
    pub results: MonitorResults,
}
