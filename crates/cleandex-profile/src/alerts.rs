//! Data-quality alerts raised while profiling.

use serde::{Deserialize, Serialize};

use cleandex_common::settings::ProfileThresholds;

use crate::profile::{ColumnKind, ColumnProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Empty,
    Constant,
    Missing,
    Unique,
    HighCardinality,
    Zeros,
    MixedTypes,
    Duplicates,
}

impl AlertKind {
    /// Alerts that count against the validity dimension.
    pub fn is_defect(&self) -> bool {
        matches!(self, AlertKind::Empty | AlertKind::Constant | AlertKind::MixedTypes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    /// `None` for dataset-level alerts
    pub column: Option<String>,
    pub message: String,
}

/// Alerts for one column.
pub fn column_alerts(col: &ColumnProfile, rows: usize, t: &ProfileThresholds) -> Vec<Alert> {
    let mut out = Vec::new();
    let mut push = |kind: AlertKind, message: String| {
        out.push(Alert { kind, column: Some(col.name.clone()), message });
    };

    if col.kind == ColumnKind::Empty {
        push(AlertKind::Empty, format!("{} has only missing values", col.name));
        return out;
    }

    // Raw ratio: missing_pct is already rounded for display
    if rows > 0 && col.missing as f64 / rows as f64 > t.missing {
        push(
            AlertKind::Missing,
            format!("{} has {} ({:.1}%) missing values", col.name, col.missing, col.missing_pct),
        );
    }

    if col.distinct == 1 && col.count > 1 {
        push(AlertKind::Constant, format!("{} has a constant value", col.name));
    }

    if col.is_unique && rows > 1 {
        push(AlertKind::Unique, format!("{} has unique values", col.name));
    }

    if col.kind == ColumnKind::Categorical && col.distinct > t.high_cardinality {
        push(
            AlertKind::HighCardinality,
            format!("{} has a high cardinality: {} distinct values", col.name, col.distinct),
        );
    }

    if let Some(stats) = &col.numeric {
        let zeros_pct = stats.zeros as f64 / col.count.max(1) as f64;
        if zeros_pct > t.zeros {
            push(
                AlertKind::Zeros,
                format!("{} has {} ({:.1}%) zeros", col.name, stats.zeros, zeros_pct * 100.0),
            );
        }
    }

    if col.conformity < 1.0 {
        push(
            AlertKind::MixedTypes,
            format!(
                "{} mixes value types ({:.1}% match the dominant type)",
                col.name,
                col.conformity * 100.0
            ),
        );
    }

    out
}

/// Dataset-level duplicate alert.
pub fn duplicate_alert(duplicates: usize, rows: usize) -> Option<Alert> {
    (duplicates > 0).then(|| Alert {
        kind: AlertKind::Duplicates,
        column: None,
        message: format!(
            "Dataset has {} ({:.1}%) duplicate rows",
            duplicates,
            duplicates as f64 / rows.max(1) as f64 * 100.0
        ),
    })
}
