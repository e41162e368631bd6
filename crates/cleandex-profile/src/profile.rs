//! Column profiling and the dataset-level profile.
//!
//! Mirrors what a "minimal" profiling report shows: per-variable type,
//! missing and distinct counts, descriptive statistics, top values and
//! alerts, plus the overview table and the reliability index.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use cleandex_common::reliability::{compute_index, round1, DimensionScores, QualityCounts, ReliabilityIndex};
use cleandex_common::settings::{ProfileThresholds, ReliabilityWeights};

use crate::alerts::{column_alerts, duplicate_alert, Alert};
use crate::dataset::{Dataset, PhysicalType, Value};
use crate::stats::{LengthStats, NumericStats};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Boolean,
    DateTime,
    Categorical,
    Text,
    Empty,
}

impl ColumnKind {
    pub fn label(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "Numeric",
            ColumnKind::Boolean => "Boolean",
            ColumnKind::DateTime => "DateTime",
            ColumnKind::Categorical => "Categorical",
            ColumnKind::Text => "Text",
            ColumnKind::Empty => "Unsupported",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanCounts {
    pub true_count: usize,
    pub false_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub min: String,
    pub max: String,
}

/// Everything known about one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    /// Non-missing values
    pub count: usize,
    pub missing: usize,
    pub missing_pct: f64,
    pub distinct: usize,
    pub distinct_pct: f64,
    pub is_unique: bool,
    /// Share of non-missing values with the dominant physical type
    pub conformity: f64,
    pub top_values: Vec<ValueCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<LengthStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boolean: Option<BooleanCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates: Option<DateRange>,
}

/// Dataset overview, column profiles, alerts and reliability index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub rows: usize,
    pub columns: usize,
    pub total_cells: usize,
    pub missing_cells: usize,
    pub missing_cells_pct: f64,
    pub duplicate_rows: usize,
    pub duplicate_rows_pct: f64,
    pub variables: Vec<ColumnProfile>,
    pub alerts: Vec<Alert>,
    pub reliability: ReliabilityIndex,
    pub fingerprint: String,
    pub generated_at: DateTime<Utc>,
}

/// Computes [`DatasetProfile`]s with fixed thresholds and weights.
#[derive(Debug, Clone, Default)]
pub struct Profiler {
    thresholds: ProfileThresholds,
    weights: ReliabilityWeights,
}

impl Profiler {
    pub fn new(thresholds: ProfileThresholds, weights: ReliabilityWeights) -> Self {
        Self { thresholds, weights }
    }

    #[instrument(skip_all, fields(rows = dataset.row_count(), columns = dataset.column_count()))]
    pub fn profile(&self, dataset: &Dataset) -> DatasetProfile {
        let rows = dataset.row_count();
        let variables: Vec<ColumnProfile> = (0..dataset.column_count())
            .map(|i| self.profile_column(&dataset.columns[i], dataset.column(i), rows))
            .collect();

        let total_cells = rows * dataset.column_count();
        let missing_cells: usize = variables.iter().map(|c| c.missing).sum();
        let duplicate_rows = dataset.duplicate_rows();

        let mut alerts = Vec::new();
        let mut defective_columns = 0;
        for col in &variables {
            let col_alerts = column_alerts(col, rows, &self.thresholds);
            if col_alerts.iter().any(|a| a.kind.is_defect()) {
                defective_columns += 1;
            }
            alerts.extend(col_alerts);
        }
        alerts.extend(duplicate_alert(duplicate_rows, rows));

        let counts = QualityCounts {
            rows,
            total_cells,
            missing_cells,
            duplicate_rows,
            column_conformity: variables.iter().map(|c| (c.conformity, c.count)).collect(),
            columns: variables.len(),
            defective_columns,
        };
        let reliability = compute_index(DimensionScores::from_counts(&counts), &self.weights);
        debug!(index = reliability.index, grade = %reliability.grade, alerts = alerts.len(), "profiled dataset");

        DatasetProfile {
            rows,
            columns: variables.len(),
            total_cells,
            missing_cells,
            missing_cells_pct: pct(missing_cells, total_cells),
            duplicate_rows,
            duplicate_rows_pct: pct(duplicate_rows, rows),
            variables,
            alerts,
            reliability,
            fingerprint: dataset.fingerprint(),
            generated_at: Utc::now(),
        }
    }

    fn profile_column<'a>(
        &self,
        name: &str,
        cells: impl Iterator<Item = &'a Value>,
        rows: usize,
    ) -> ColumnProfile {
        let values: Vec<&Value> = cells.filter(|v| !v.is_missing()).collect();
        let count = values.len();
        let missing = rows - count;

        // Distinct values and frequencies, remembering first appearance
        let mut freq: HashMap<String, (usize, usize, String)> = HashMap::new();
        for (pos, v) in values.iter().enumerate() {
            freq.entry(v.key())
                .and_modify(|e| e.0 += 1)
                .or_insert((1, pos, v.to_string()));
        }
        let distinct = freq.len();
        let mut top: Vec<(usize, usize, String)> = freq.into_values().collect();
        top.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        let top_values = top
            .into_iter()
            .take(self.thresholds.top_values)
            .map(|(count, _, value)| ValueCount { value, count })
            .collect();

        let conformity = conformity(&values);
        let kind = self.infer_kind(&values, distinct);

        let mut profile = ColumnProfile {
            name: name.to_string(),
            kind,
            count,
            missing,
            missing_pct: pct(missing, rows),
            distinct,
            distinct_pct: pct(distinct, count),
            is_unique: count > 0 && distinct == count,
            conformity,
            top_values,
            numeric: None,
            length: None,
            boolean: None,
            dates: None,
        };

        match kind {
            ColumnKind::Numeric => {
                let nums: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
                profile.numeric = NumericStats::compute(&nums);
            }
            ColumnKind::Boolean => {
                let true_count = values.iter().filter(|v| matches!(v, Value::Bool(true))).count();
                profile.boolean = Some(BooleanCounts { true_count, false_count: count - true_count });
            }
            ColumnKind::DateTime => {
                let mut parsed: Vec<NaiveDateTime> = values
                    .iter()
                    .filter_map(|v| match v {
                        Value::Text(s) => parse_datetime(s),
                        _ => None,
                    })
                    .collect();
                parsed.sort();
                if let (Some(min), Some(max)) = (parsed.first(), parsed.last()) {
                    profile.dates = Some(DateRange { min: min.to_string(), max: max.to_string() });
                }
            }
            ColumnKind::Categorical | ColumnKind::Text => {
                let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                profile.length = LengthStats::compute(rendered.iter().map(String::as_str));
            }
            ColumnKind::Empty => {}
        }

        profile
    }

    fn infer_kind(&self, values: &[&Value], distinct: usize) -> ColumnKind {
        if values.is_empty() {
            return ColumnKind::Empty;
        }
        if values.iter().all(|v| matches!(v, Value::Bool(_))) {
            return ColumnKind::Boolean;
        }
        if values.iter().all(|v| matches!(v, Value::Int(_) | Value::Float(_))) {
            return ColumnKind::Numeric;
        }
        let all_dates = values.iter().all(|v| match v {
            Value::Text(s) => parse_datetime(s).is_some(),
            _ => false,
        });
        if all_dates {
            return ColumnKind::DateTime;
        }

        let ratio = distinct as f64 / values.len() as f64;
        if distinct <= self.thresholds.categorical_max_distinct || ratio <= self.thresholds.categorical_max_ratio {
            ColumnKind::Categorical
        } else {
            ColumnKind::Text
        }
    }
}

/// Share of values carrying the most common physical type.
fn conformity(values: &[&Value]) -> f64 {
    if values.is_empty() {
        return 1.0;
    }
    let mut counts: HashMap<PhysicalType, usize> = HashMap::new();
    for t in values.iter().filter_map(|v| v.physical_type()) {
        *counts.entry(t).or_insert(0) += 1;
    }
    let dominant = counts.values().copied().max().unwrap_or(0);
    dominant as f64 / values.len() as f64
}

/// Parse the date and datetime shapes commonly found in exports.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for f in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, f) {
            return Some(dt);
        }
    }
    for f in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, f) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round1(part as f64 / whole as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertKind;
    use cleandex_common::reliability::Grade;
    use serde_json::json;

    fn profile_json(v: serde_json::Value) -> DatasetProfile {
        Profiler::default().profile(&Dataset::from_json(&v).unwrap())
    }

    fn column<'a>(p: &'a DatasetProfile, name: &str) -> &'a ColumnProfile {
        p.variables.iter().find(|c| c.name == name).unwrap()
    }

    #[test]
    fn test_clean_dataset_is_grade_a() {
        let p = profile_json(json!({
            "id": [1, 2, 3, 4],
            "city": ["Lisbon", "Porto", "Lisbon", "Faro"],
        }));
        assert_eq!(p.rows, 4);
        assert_eq!(p.missing_cells, 0);
        assert_eq!(p.duplicate_rows, 0);
        assert_eq!(p.reliability.index, 100.0);
        assert_eq!(p.reliability.grade, Grade::A);
        assert_eq!(column(&p, "id").kind, ColumnKind::Numeric);
        assert_eq!(column(&p, "city").kind, ColumnKind::Categorical);
    }

    #[test]
    fn test_kind_inference() {
        let p = profile_json(json!({
            "flag": [true, false, true],
            "when": ["2024-01-01", "2024-02-01", "2024-03-05 10:00:00"],
            "empty": [null, null, null],
        }));
        assert_eq!(column(&p, "flag").kind, ColumnKind::Boolean);
        assert_eq!(column(&p, "flag").boolean.as_ref().unwrap().true_count, 2);
        let when = column(&p, "when");
        assert_eq!(when.kind, ColumnKind::DateTime);
        assert_eq!(when.dates.as_ref().unwrap().min, "2024-01-01 00:00:00");
        assert_eq!(column(&p, "empty").kind, ColumnKind::Empty);
    }

    #[test]
    fn test_high_distinct_strings_are_text() {
        let names: Vec<String> = (0..60).map(|i| format!("name-{i}")).collect();
        let p = profile_json(json!({ "name": names }));
        let c = column(&p, "name");
        assert_eq!(c.kind, ColumnKind::Text);
        assert!(c.is_unique);
        assert!(p.alerts.iter().any(|a| a.kind == AlertKind::Unique));
    }

    #[test]
    fn test_missing_and_duplicates_lower_the_index() {
        let p = profile_json(json!([
            {"a": 1, "b": "x"},
            {"a": 1, "b": "x"},
            {"a": null, "b": "y"},
            {"a": 2, "b": null},
        ]));
        assert_eq!(p.missing_cells, 2);
        assert_eq!(p.missing_cells_pct, 25.0);
        assert_eq!(p.duplicate_rows, 1);
        assert!(p.reliability.index < 100.0);
        assert!(p.alerts.iter().any(|a| a.kind == AlertKind::Duplicates && a.column.is_none()));
        assert!(p.alerts.iter().any(|a| a.kind == AlertKind::Missing));
    }

    #[test]
    fn test_mixed_types_reduce_consistency() {
        let p = profile_json(json!({ "v": [1, 2, 3, "oops"] }));
        let c = column(&p, "v");
        assert_eq!(c.conformity, 0.75);
        assert!(p.reliability.dimensions.consistency < 1.0);
        assert!(p.reliability.dimensions.validity < 1.0);
        assert!(p.alerts.iter().any(|a| a.kind == AlertKind::MixedTypes));
    }

    #[test]
    fn test_constant_column_alert() {
        let p = profile_json(json!({ "k": ["same", "same", "same"], "id": [1, 2, 3] }));
        assert!(p
            .alerts
            .iter()
            .any(|a| a.kind == AlertKind::Constant && a.column.as_deref() == Some("k")));
    }

    #[test]
    fn test_top_values_order_by_frequency_then_appearance() {
        let p = profile_json(json!({ "c": ["b", "a", "a", "b", "c"] }));
        let top: Vec<&str> = column(&p, "c").top_values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(top, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_missing_alert_just_above_threshold() {
        // 126 of 2500 is 5.04%, shown as 5.0
        let values: Vec<Option<i64>> = (0..2500).map(|i| if i < 126 { None } else { Some(i) }).collect();
        let p = profile_json(json!({ "v": values }));
        let c = column(&p, "v");
        assert_eq!(c.missing, 126);
        assert_eq!(c.missing_pct, 5.0);
        assert!(p.alerts.iter().any(|a| a.kind == AlertKind::Missing));
    }

    #[test]
    fn test_missing_alert_not_raised_at_threshold() {
        let values: Vec<Option<i64>> = (0..2000).map(|i| if i < 100 { None } else { Some(i) }).collect();
        let p = profile_json(json!({ "v": values }));
        assert_eq!(column(&p, "v").missing_pct, 5.0);
        assert!(!p.alerts.iter().any(|a| a.kind == AlertKind::Missing));
    }

    #[test]
    fn test_zeros_alert() {
        let p = profile_json(json!({ "n": [0, 0, 1, 2, 3] }));
        assert!(p.alerts.iter().any(|a| a.kind == AlertKind::Zeros));
        assert_eq!(column(&p, "n").numeric.as_ref().unwrap().zeros, 2);
    }

    #[test]
    fn test_profile_serializes_snake_case() {
        let p = profile_json(json!({ "n": [1, 2] }));
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["variables"][0]["kind"], "numeric");
        assert_eq!(v["reliability"]["grade"], "A");
    }
}
