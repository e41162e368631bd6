//! Descriptive statistics over numeric samples.

use serde::{Deserialize, Serialize};

/// Summary of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub mean: f64,
    /// Sample standard deviation (n - 1); `None` below two values
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub p5: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub p95: f64,
    pub zeros: usize,
    pub negatives: usize,
    pub infinite: usize,
}

impl NumericStats {
    /// Returns `None` when there are no finite values.
    pub fn compute(values: &[f64]) -> Option<Self> {
        let infinite = values.iter().filter(|v| v.is_infinite()).count();
        let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }
        finite.sort_by(|a, b| a.total_cmp(b));

        let n = finite.len() as f64;
        let mean = finite.iter().sum::<f64>() / n;
        let std = if finite.len() < 2 {
            None
        } else {
            let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
            Some(variance.sqrt())
        };

        Some(Self {
            mean,
            std,
            min: finite[0],
            max: finite[finite.len() - 1],
            p5: quantile(&finite, 0.05),
            q1: quantile(&finite, 0.25),
            median: quantile(&finite, 0.5),
            q3: quantile(&finite, 0.75),
            p95: quantile(&finite, 0.95),
            zeros: finite.iter().filter(|v| **v == 0.0).count(),
            negatives: finite.iter().filter(|v| **v < 0.0).count(),
            infinite,
        })
    }
}

/// Linear-interpolated quantile of an already sorted, non-empty slice.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Character-length summary of string values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthStats {
    pub min: usize,
    pub mean: f64,
    pub max: usize,
}

impl LengthStats {
    pub fn compute<'a>(values: impl Iterator<Item = &'a str>) -> Option<Self> {
        let lens: Vec<usize> = values.map(|s| s.chars().count()).collect();
        let min = *lens.iter().min()?;
        let max = *lens.iter().max()?;
        let mean = lens.iter().sum::<usize>() as f64 / lens.len() as f64;
        Some(Self { min, mean, max })
    }
}
