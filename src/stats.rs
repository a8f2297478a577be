//! Summary statistics behind the tutorial plots: colour breaks for maps and the per-habitat
//! distributions drawn as violins.

use serde::Serialize;
use std::fmt;

use crate::error::AnalysisError;
use crate::grid::Grid;
use crate::habitat::{HabitatLabel, HabitatTable};

/// Quantile of already sorted values, interpolating linearly between order statistics.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }

    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;

    Some(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

/// Quantile of the non-NaN `values`.
pub fn quantile(values: &[f64], p: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, p)
}

/// Break values at probabilities `probs` over the valid cells of `band`, for colour scales
/// that stay readable when a few cells are extreme.
pub fn quantile_breaks(grid: &Grid, band: &str, probs: &[f64]) -> Result<Vec<f64>, AnalysisError> {
    let index = grid.band_index(band)?;
    let mut valid: Vec<f64> = grid
        .cells()
        .filter_map(|(row, col)| grid.value(index, row, col))
        .collect();
    valid.sort_by(f64::total_cmp);

    Ok(probs
        .iter()
        .filter_map(|&p| quantile_sorted(&valid, p))
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitatSummary {
    pub habitat: HabitatLabel,
    pub variable: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

impl fmt::Display for HabitatSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<9} {:<10} n={:<6} min={:.2} q1={:.2} median={:.2} q3={:.2} max={:.2} mean={:.2}",
            self.habitat.to_string(),
            self.variable,
            self.count,
            self.min,
            self.q1,
            self.median,
            self.q3,
            self.max,
            self.mean
        )
    }
}

/// Distribution of every (habitat, variable) pair, in order of first appearance.
pub fn summarize(table: &HabitatTable) -> Vec<HabitatSummary> {
    let mut groups: Vec<((HabitatLabel, &str), Vec<f64>)> = Vec::new();

    for row in table.rows() {
        let key = (row.habitat, row.variable.as_str());
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(row.value),
            None => groups.push((key, vec![row.value])),
        }
    }

    groups
        .into_iter()
        .filter_map(|((habitat, variable), mut values)| {
            values.sort_by(f64::total_cmp);
            let count = values.len();
            Some(HabitatSummary {
                habitat,
                variable: variable.to_string(),
                count,
                min: *values.first()?,
                q1: quantile_sorted(&values, 0.25)?,
                median: quantile_sorted(&values, 0.5)?,
                q3: quantile_sorted(&values, 0.75)?,
                max: *values.last()?,
                mean: values.iter().sum::<f64>() / count as f64,
            })
        })
        .collect()
}

/// Valid-cell statistics of one band.
#[derive(Debug, Clone, PartialEq)]
pub struct GridStatistics {
    pub band: String,
    pub valid: usize,
    pub total: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl GridStatistics {
    pub fn from_band(grid: &Grid, band: &str) -> Result<Self, AnalysisError> {
        let index = grid.band_index(band)?;
        let valid: Vec<f64> = grid
            .cells()
            .filter_map(|(row, col)| grid.value(index, row, col))
            .collect();

        Ok(Self {
            band: band.to_string(),
            valid: valid.len(),
            total: grid.lattice().cell_count(),
            min: valid.iter().fold(f64::INFINITY, |a, &b| a.min(b)),
            max: valid.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b)),
            mean: if valid.is_empty() {
                f64::NAN
            } else {
                valid.iter().sum::<f64>() / valid.len() as f64
            },
        })
    }

    pub fn valid_fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.valid as f64 / self.total as f64
        }
    }
}
