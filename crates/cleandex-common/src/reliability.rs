//! Reliability index scoring for profiled datasets.
//!
//! Four dimensions, each in [0.0, 1.0], are combined with
//! [`ReliabilityWeights`] into a 0-100 index and a letter grade.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::settings::ReliabilityWeights;

/// Raw counts a dataset profile contributes to the index.
#[derive(Debug, Clone, Default)]
pub struct QualityCounts {
    pub rows: usize,
    pub total_cells: usize,
    pub missing_cells: usize,
    pub duplicate_rows: usize,
    /// (conformity, non-missing count) per column
    pub column_conformity: Vec<(f64, usize)>,
    pub columns: usize,
    pub defective_columns: usize,
}

/// Per-dimension scores in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub completeness: f64,
    pub uniqueness: f64,
    pub consistency: f64,
    pub validity: f64,
}

impl DimensionScores {
    pub fn from_counts(counts: &QualityCounts) -> Self {
        let completeness = ratio_complement(counts.missing_cells, counts.total_cells);
        let uniqueness = ratio_complement(counts.duplicate_rows, counts.rows);
        let validity = ratio_complement(counts.defective_columns, counts.columns);

        let weighted: f64 = counts.column_conformity.iter().map(|(c, n)| c * *n as f64).sum();
        let total: usize = counts.column_conformity.iter().map(|(_, n)| n).sum();
        let consistency = if total == 0 { 1.0 } else { (weighted / total as f64).clamp(0.0, 1.0) };

        Self { completeness, uniqueness, consistency, validity }
    }
}

fn ratio_complement(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 1.0;
    }
    (1.0 - part as f64 / whole as f64).clamp(0.0, 1.0)
}

/// Letter grade derived from the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
}

impl Grade {
    pub fn from_index(index: f64) -> Self {
        match index {
            i if i >= 90.0 => Grade::A,
            i if i >= 75.0 => Grade::B,
            i if i >= 60.0 => Grade::C,
            i if i >= 40.0 => Grade::D,
            _ => Grade::E,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::A => "Excellent",
            Grade::B => "Good",
            Grade::C => "Fair",
            Grade::D => "Poor",
            Grade::E => "Unreliable",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
        };
        f.write_str(s)
    }
}

/// Final index with its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityIndex {
    /// 0.0 - 100.0, one decimal
    pub index: f64,
    pub grade: Grade,
    pub dimensions: DimensionScores,
}

/// Combine dimension scores into the index.
/// Weights are normalized first, so any non-negative set works.
pub fn compute_index(dimensions: DimensionScores, weights: &ReliabilityWeights) -> ReliabilityIndex {
    let w = weights.normalized();
    let raw = w.completeness * dimensions.completeness
        + w.uniqueness * dimensions.uniqueness
        + w.consistency * dimensions.consistency
        + w.validity * dimensions.validity;

    let index = round1((raw * 100.0).clamp(0.0, 100.0));
    ReliabilityIndex { index, grade: Grade::from_index(index), dimensions }
}

/// Round to one decimal place.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
