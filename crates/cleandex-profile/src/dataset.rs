//! In-memory tabular dataset built from CSV bytes or a JSON dataframe.

use std::collections::{HashMap, HashSet};
use std::fmt;

use cleandex_common::error::{CleandexError, Result};
use serde_json::Value as Json;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Tokens read as missing values in CSV input.
pub const NA_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];

// i64 bounds as exact f64 values: -2^63 and 2^63
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Physical type of a non-missing cell, used for conformity checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    Bool,
    Number,
    Text,
}

impl Value {
    /// Parse a raw CSV field.
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if NA_TOKENS.contains(&s) {
            return Value::Missing;
        }
        if s.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if s.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        if let Ok(i) = s.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return Value::Float(f);
        }
        Value::Text(s.to_string())
    }

    /// Convert a JSON value. Strings are kept as text.
    pub fn from_json(v: &Json) -> Self {
        match v {
            Json::Null => Value::Missing,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Missing),
            },
            Json::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn physical_type(&self) -> Option<PhysicalType> {
        match self {
            Value::Missing => None,
            Value::Bool(_) => Some(PhysicalType::Bool),
            Value::Int(_) | Value::Float(_) => Some(PhysicalType::Number),
            Value::Text(_) => Some(PhysicalType::Text),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Canonical key used for distinct counting and duplicate detection.
    /// `1` and `1.0` compare equal, as they do in a numeric column. Integers
    /// are keyed exactly, so 64-bit ids past 2^53 stay distinct.
    pub fn key(&self) -> String {
        match self {
            Value::Missing => "\u{0}NA".to_string(),
            Value::Bool(b) => format!("b:{b}"),
            Value::Int(i) => format!("n:{i}"),
            Value::Float(f) if f.fract() == 0.0 && *f >= I64_LOWER && *f < I64_UPPER => {
                format!("n:{}", *f as i64)
            }
            Value::Float(f) => format!("n:{f}"),
            Value::Text(s) => format!("s:{s}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => f.write_str(""),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Column names plus row-major cells. Every row has `columns.len()` cells.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Build a dataset, checking row widths.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        if columns.is_empty() || rows.is_empty() {
            return Err(CleandexError::EmptyDataset);
        }
        if let Some(pos) = rows.iter().position(|r| r.len() != columns.len()) {
            return Err(CleandexError::InvalidDataset(format!(
                "row {} has {} fields, expected {}",
                pos + 1,
                rows[pos].len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Parse CSV bytes. The first record is the header.
    pub fn from_csv(bytes: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers = reader
            .headers()
            .map_err(|e| CleandexError::InvalidDataset(e.to_string()))?
            .iter()
            .map(|s| s.trim().to_string())
            .collect::<Vec<_>>();

        if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
            return Err(CleandexError::EmptyDataset);
        }
        let columns = dedup_headers(headers);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| CleandexError::InvalidDataset(e.to_string()))?;
            if record.len() > columns.len() {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                return Err(CleandexError::InvalidDataset(format!(
                    "Expected {} fields in line {}, saw {}",
                    columns.len(),
                    line,
                    record.len()
                )));
            }
            // Blank lines come through as a single empty field
            if record.len() == 1 && record.get(0).map(str::is_empty).unwrap_or(false) && columns.len() > 1 {
                continue;
            }
            let mut row: Vec<Value> = record.iter().map(Value::parse).collect();
            row.resize(columns.len(), Value::Missing);
            rows.push(row);
        }

        debug!(columns = columns.len(), rows = rows.len(), "parsed CSV dataset");
        Self::new(columns, rows)
    }

    /// Build from a JSON dataframe: either `{col: [..]}` or `[{col: v}, ..]`.
    pub fn from_json(value: &Json) -> Result<Self> {
        match value {
            Json::Object(map) => Self::from_column_object(map),
            Json::Array(items) => Self::from_records(items),
            _ => Err(CleandexError::InvalidDataset(
                "expected a JSON object of columns or an array of records".to_string(),
            )),
        }
    }

    fn from_column_object(map: &serde_json::Map<String, Json>) -> Result<Self> {
        let mut columns = Vec::with_capacity(map.len());
        let mut data: Vec<&Vec<Json>> = Vec::with_capacity(map.len());
        for (name, v) in map {
            match v {
                Json::Array(values) => {
                    columns.push(name.clone());
                    data.push(values);
                }
                _ => {
                    return Err(CleandexError::InvalidDataset(format!(
                        "column '{name}' must be an array of values"
                    )))
                }
            }
        }

        let len = data.first().map(|d| d.len()).unwrap_or(0);
        if data.iter().any(|d| d.len() != len) {
            return Err(CleandexError::InvalidDataset(
                "All arrays must be of the same length".to_string(),
            ));
        }

        let rows = (0..len)
            .map(|i| data.iter().map(|col| Value::from_json(&col[i])).collect())
            .collect();
        Self::new(columns, rows)
    }

    fn from_records(items: &[Json]) -> Result<Self> {
        let mut columns: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut records = Vec::with_capacity(items.len());

        for (i, item) in items.iter().enumerate() {
            let obj = item.as_object().ok_or_else(|| {
                CleandexError::InvalidDataset(format!("record {} is not a JSON object", i + 1))
            })?;
            for key in obj.keys() {
                if !index.contains_key(key) {
                    index.insert(key.clone(), columns.len());
                    columns.push(key.clone());
                }
            }
            records.push(obj);
        }

        let rows = records
            .into_iter()
            .map(|obj| {
                let mut row = vec![Value::Missing; columns.len()];
                for (k, v) in obj {
                    if let Some(&pos) = index.get(k) {
                        row[pos] = Value::from_json(v);
                    }
                }
                row
            })
            .collect();
        Self::new(columns, rows)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Iterate the cells of one column.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |r| &r[idx])
    }

    /// Rows identical to an earlier row.
    pub fn duplicate_rows(&self) -> usize {
        let mut seen = HashSet::with_capacity(self.rows.len());
        self.rows
            .iter()
            .filter(|row| {
                let key: Vec<String> = row.iter().map(Value::key).collect();
                !seen.insert(key)
            })
            .count()
    }

    /// SHA-256 over column names and canonical cell keys.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for c in &self.columns {
            hasher.update(c.as_bytes());
            hasher.update([0x1f]);
        }
        for row in &self.rows {
            hasher.update([0x1e]);
            for v in row {
                hasher.update(v.key().as_bytes());
                hasher.update([0x1f]);
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Rename duplicates to `name.1`, `name.2`, … and blanks to `Unnamed: i`.
fn dedup_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(headers.len());
    for (i, h) in headers.into_iter().enumerate() {
        let base = if h.is_empty() { format!("Unnamed: {i}") } else { h };
        let name = match seen.get(&base).copied() {
            None => base.clone(),
            Some(n) => format!("{base}.{n}"),
        };
        *seen.entry(base).or_insert(0) += 1;
        out.push(name);
    }
    out
}
