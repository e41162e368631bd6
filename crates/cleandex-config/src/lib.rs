//! Configuration loading for Cleandex.
//! Reads cleandex.toml (or cleandex.yaml) from the current directory or the path
//! in the CLEANDEX_CONFIG env var. Every field has a default, so no file is needed.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use cleandex_common::error::{CleandexError, Result};
use cleandex_common::settings::{MonitorSettings, ProfileThresholds, ReliabilityWeights};

pub const CONFIG_ENV: &str = "CLEANDEX_CONFIG";
const DEFAULT_FILES: [&str; 3] = ["cleandex.toml", "cleandex.yaml", "cleandex.yml"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub monitor: MonitorSettings,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Backend API listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upload body limit in megabytes
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
    /// Origins allowed by CORS; empty means any
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8503 }
fn default_max_upload_mb() -> usize { 50 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportsConfig {
    #[serde(default = "default_reports_dir")]
    pub dir: PathBuf,
    /// Directory holding a `report.html` that replaces the built-in template
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
}

fn default_reports_dir() -> PathBuf { PathBuf::from("reports") }

impl Default for ReportsConfig {
    fn default() -> Self {
        Self { dir: default_reports_dir(), template_dir: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default)]
    pub thresholds: ProfileThresholds,
    #[serde(default)]
    pub weights: ReliabilityWeights,
}

/// Dashboard listener and the backend it talks to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Seconds allowed for a backend call; monitoring runs can take a while
    #[serde(default = "default_backend_timeout")]
    pub backend_timeout_secs: u64,
}

fn default_dashboard_port() -> u16 { 8501 }
fn default_backend_url() -> String { "http://localhost:8503".to_string() }
fn default_backend_timeout() -> u64 { 120 }

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_dashboard_port(),
            backend_url: default_backend_url(),
            backend_timeout_secs: default_backend_timeout(),
        }
    }
}

impl DashboardConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Load configuration: `.env`, then the config file, then env overrides.
    /// Checks CLEANDEX_CONFIG first, then the default file names in the current directory.
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }

        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => match DEFAULT_FILES.iter().map(Path::new).find(|p| p.exists()) {
                Some(path) => Self::from_file(path)?,
                None => {
                    info!("no config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML or YAML file, chosen by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CleandexError::Config(format!("config file not found: {}", path.display())));
        }
        let content = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| CleandexError::Config(format!("{}: {e}", path.display())))?,
            _ => toml::from_str(&content)
                .map_err(|e| CleandexError::Config(format!("{}: {e}", path.display())))?,
        };
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Apply CLEANDEX_* variables from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Unparseable ports are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("CLEANDEX_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("CLEANDEX_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(dir) = lookup("CLEANDEX_REPORTS_DIR") {
            self.reports.dir = PathBuf::from(dir);
        }
        if let Some(port) = lookup("CLEANDEX_DASHBOARD_PORT").and_then(|p| p.parse().ok()) {
            self.dashboard.port = port;
        }
        if let Some(url) = lookup("CLEANDEX_BACKEND_URL") {
            self.dashboard.backend_url = url.trim_end_matches('/').to_string();
        }
    }

    /// Reject unusable settings. Weights that don't sum to 1 are normalized.
    pub fn validate(&mut self) -> Result<()> {
        if self.server.port == 0 || self.dashboard.port == 0 {
            return Err(CleandexError::Config("ports must be non-zero".to_string()));
        }
        if self.server.max_upload_mb == 0 {
            return Err(CleandexError::Config("server.max_upload_mb must be positive".to_string()));
        }
        if self.reports.dir.as_os_str().is_empty() {
            return Err(CleandexError::Config("reports.dir must not be empty".to_string()));
        }
        if !self.profile.thresholds.validate() {
            return Err(CleandexError::Config("profile.thresholds are out of range".to_string()));
        }
        if !self.monitor.validate() {
            return Err(CleandexError::Config(
                "monitor thresholds must be positive with fast <= slow".to_string(),
            ));
        }
        if !self.profile.weights.validate() {
            let w = &self.profile.weights;
            let parts = [w.completeness, w.uniqueness, w.consistency, w.validity];
            if parts.iter().any(|v| *v < 0.0) || parts.iter().sum::<f64>() <= 0.0 {
                return Err(CleandexError::Config(
                    "profile.weights must be non-negative with a positive sum".to_string(),
                ));
            }
            self.profile.weights.normalize();
            debug!(weights = ?self.profile.weights, "normalized reliability weights");
        }
        if !self.dashboard.backend_url.starts_with("http://") && !self.dashboard.backend_url.starts_with("https://") {
            return Err(CleandexError::Config(format!(
                "dashboard.backend_url must be an http(s) URL: {}",
                self.dashboard.backend_url
            )));
        }
        Ok(())
    }
}
