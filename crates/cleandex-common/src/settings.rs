//! Tunable scoring weights and profiling thresholds.
//!
//! Both structs deserialize with per-field defaults so a config file only
//! needs to name the values it changes.

use serde::{Deserialize, Serialize};

// ── Reliability Weights ───────────────────────────────────────────────────────

/// Weights of the four reliability dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityWeights {
    /// Share of non-missing cells
    #[serde(default = "default_completeness_weight")]
    pub completeness: f64,

    /// Share of rows that are not duplicates of an earlier row
    #[serde(default = "default_uniqueness_weight")]
    pub uniqueness: f64,

    /// Share of values matching their column's dominant type
    #[serde(default = "default_consistency_weight")]
    pub consistency: f64,

    /// Share of columns without structural defects
    #[serde(default = "default_validity_weight")]
    pub validity: f64,
}

fn default_completeness_weight() -> f64 { 0.35 }
fn default_uniqueness_weight() -> f64 { 0.20 }
fn default_consistency_weight() -> f64 { 0.25 }
fn default_validity_weight() -> f64 { 0.20 }

impl Default for ReliabilityWeights {
    fn default() -> Self {
        Self {
            completeness: default_completeness_weight(),
            uniqueness: default_uniqueness_weight(),
            consistency: default_consistency_weight(),
            validity: default_validity_weight(),
        }
    }
}

impl ReliabilityWeights {
    fn sum(&self) -> f64 {
        self.completeness + self.uniqueness + self.consistency + self.validity
    }

    /// Validate weights sum to 1.0 and none is negative
    pub fn validate(&self) -> bool {
        let non_negative = [self.completeness, self.uniqueness, self.consistency, self.validity]
            .iter()
            .all(|w| *w >= 0.0);
        non_negative && (self.sum() - 1.0).abs() < 0.01
    }

    /// Normalize weights to sum to 1.0
    pub fn normalize(&mut self) {
        let sum = self.sum();
        if sum > 0.0 {
            self.completeness /= sum;
            self.uniqueness /= sum;
            self.consistency /= sum;
            self.validity /= sum;
        }
    }

    /// Normalized copy, leaving `self` untouched.
    pub fn normalized(&self) -> Self {
        let mut w = self.clone();
        w.normalize();
        w
    }
}

// ── Profiling Thresholds ──────────────────────────────────────────────────────

/// Thresholds that decide column kinds and raise alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileThresholds {
    /// Missing share (0.0 - 1.0) above which a `missing` alert is raised
    #[serde(default = "default_missing_threshold")]
    pub missing: f64,

    /// Zero share (0.0 - 1.0) above which a numeric column gets a `zeros` alert
    #[serde(default = "default_zeros_threshold")]
    pub zeros: f64,

    /// Distinct count above which a categorical column is high-cardinality
    #[serde(default = "default_high_cardinality")]
    pub high_cardinality: usize,

    /// Distinct count up to which string columns are always categorical
    #[serde(default = "default_categorical_max_distinct")]
    pub categorical_max_distinct: usize,

    /// Distinct/count ratio up to which string columns are categorical
    #[serde(default = "default_categorical_max_ratio")]
    pub categorical_max_ratio: f64,

    /// Number of most frequent values kept per column
    #[serde(default = "default_top_values")]
    pub top_values: usize,
}

fn default_missing_threshold() -> f64 { 0.05 }
fn default_zeros_threshold() -> f64 { 0.10 }
fn default_high_cardinality() -> usize { 50 }
fn default_categorical_max_distinct() -> usize { 50 }
fn default_categorical_max_ratio() -> f64 { 0.5 }
fn default_top_values() -> usize { 5 }

impl Default for ProfileThresholds {
    fn default() -> Self {
        Self {
            missing: default_missing_threshold(),
            zeros: default_zeros_threshold(),
            high_cardinality: default_high_cardinality(),
            categorical_max_distinct: default_categorical_max_distinct(),
            categorical_max_ratio: default_categorical_max_ratio(),
            top_values: default_top_values(),
        }
    }
}

impl ProfileThresholds {
    /// Check that shares are within [0, 1].
    pub fn validate(&self) -> bool {
        (0.0..=1.0).contains(&self.missing)
            && (0.0..=1.0).contains(&self.zeros)
            && (0.0..=1.0).contains(&self.categorical_max_ratio)
    }
}

// ── Monitoring ────────────────────────────────────────────────────────────────

/// Limits and scoring thresholds for API monitoring runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Maximum endpoints accepted in one run
    #[serde(default = "default_max_endpoints")]
    pub max_endpoints: usize,

    /// Responses at or below this many seconds get full latency marks
    #[serde(default = "default_fast_threshold")]
    pub fast_threshold_secs: f64,

    /// Responses slower than this many seconds get a warning
    #[serde(default = "default_slow_threshold")]
    pub slow_threshold_secs: f64,

    /// Redirect hops followed when redirects are enabled
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Bytes of a response body read before the probe stops reading
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_max_endpoints() -> usize { 50 }
fn default_fast_threshold() -> f64 { 0.5 }
fn default_slow_threshold() -> f64 { 1.0 }
fn default_max_redirects() -> usize { 10 }
fn default_user_agent() -> String { format!("Cleandex-Monitor/{}", env!("CARGO_PKG_VERSION")) }
fn default_max_body_bytes() -> usize { 10 * 1024 * 1024 }

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            max_endpoints: default_max_endpoints(),
            fast_threshold_secs: default_fast_threshold(),
            slow_threshold_secs: default_slow_threshold(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl MonitorSettings {
    /// Thresholds must be positive and ordered.
    pub fn validate(&self) -> bool {
        self.max_endpoints > 0
            && self.max_body_bytes > 0
            && self.fast_threshold_secs > 0.0
            && self.slow_threshold_secs >= self.fast_threshold_secs
    }
}
