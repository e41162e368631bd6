//! HTML report rendering.

use std::path::{Path, PathBuf};

use minijinja::{context, path_loader, Environment};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use cleandex_common::error::{CleandexError, Result};
use cleandex_common::reliability::ReliabilityIndex;

use crate::profile::DatasetProfile;

const REPORT_TEMPLATE: &str = "report.html";
const EMBEDDED_TEMPLATE: &str = include_str!("../templates/report.html");

/// Compact description of a stored report, kept next to the HTML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub title: String,
    pub rows: usize,
    pub columns: usize,
    pub missing_cells: usize,
    pub duplicate_rows: usize,
    pub alerts: usize,
    pub reliability: ReliabilityIndex,
    pub fingerprint: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

impl ReportSummary {
    pub fn from_profile(title: &str, profile: &DatasetProfile) -> Self {
        Self {
            title: title.to_string(),
            rows: profile.rows,
            columns: profile.columns,
            missing_cells: profile.missing_cells,
            duplicate_rows: profile.duplicate_rows,
            alerts: profile.alerts.len(),
            reliability: profile.reliability.clone(),
            fingerprint: profile.fingerprint.clone(),
            generated_at: profile.generated_at,
        }
    }
}

/// Renders [`DatasetProfile`]s to standalone HTML documents.
pub struct ReportRenderer {
    env: Environment<'static>,
}

impl ReportRenderer {
    /// Renderer using the built-in template.
    pub fn new() -> Result<Self> {
        Self::with_template_dir(None)
    }

    /// A `report.html` inside `dir` replaces the built-in template.
    pub fn with_template_dir(dir: Option<&Path>) -> Result<Self> {
        let mut env = Environment::new();
        match dir.map(|d| d.join(REPORT_TEMPLATE)).filter(|p| p.is_file()) {
            Some(path) => {
                debug!(template = %path.display(), "using custom report template");
                let root: PathBuf = path.parent().map(Path::to_path_buf).unwrap_or_default();
                env.set_loader(path_loader(root));
            }
            None => {
                env.add_template(REPORT_TEMPLATE, EMBEDDED_TEMPLATE)
                    .map_err(|e| CleandexError::Template(e.to_string()))?;
            }
        }
        Ok(Self { env })
    }

    #[instrument(skip(self, profile), fields(rows = profile.rows))]
    pub fn render(&self, title: &str, profile: &DatasetProfile) -> Result<String> {
        let tmpl = self
            .env
            .get_template(REPORT_TEMPLATE)
            .map_err(|e| CleandexError::Template(e.to_string()))?;

        let d = &profile.reliability.dimensions;
        let dimensions = vec![
            ("Completeness", d.completeness),
            ("Uniqueness", d.uniqueness),
            ("Consistency", d.consistency),
            ("Validity", d.validity),
        ];

        tmpl.render(context! {
            title => title,
            profile => profile,
            grade_label => profile.reliability.grade.label(),
            dimensions => dimensions,
        })
        .map_err(|e| CleandexError::Template(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::profile::Profiler;

    fn sample_profile() -> DatasetProfile {
        let ds = Dataset::from_csv(b"name,score\n<b>Ana</b>,10\nBruno,\nBruno,\n").unwrap();
        Profiler::default().profile(&ds)
    }

    #[test]
    fn test_render_contains_sections() {
        let html = ReportRenderer::new().unwrap().render("people.csv", &sample_profile()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Reliability Index"));
        assert!(html.contains("people.csv"));
        assert!(html.contains("duplicate rows"));
        assert!(html.contains("Completeness"));
    }

    #[test]
    fn test_render_escapes_cell_values() {
        let html = ReportRenderer::new().unwrap().render("x", &sample_profile()).unwrap();
        assert!(!html.contains("<b>Ana</b>"));
        assert!(html.contains("&lt;b&gt;Ana"));
    }

    #[test]
    fn test_custom_template_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report.html"), "custom {{ title }} {{ profile.rows }}").unwrap();
        let renderer = ReportRenderer::with_template_dir(Some(dir.path())).unwrap();
        assert_eq!(renderer.render("t", &sample_profile()).unwrap(), "custom t 3");
    }

    #[test]
    fn test_missing_template_dir_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ReportRenderer::with_template_dir(Some(dir.path())).unwrap();
        assert!(renderer.render("t", &sample_profile()).unwrap().contains("Reliability Index"));
    }

    #[test]
    fn test_summary_from_profile() {
        let p = sample_profile();
        let s = ReportSummary::from_profile("people.csv", &p);
        assert_eq!(s.rows, 3);
        assert_eq!(s.duplicate_rows, 1);
        assert_eq!(s.reliability, p.reliability);
    }
}
