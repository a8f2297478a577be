//! Species distribution modelling inputs.
//!
//! The model itself (Maxent in the tutorials) is an external collaborator: anything that can be
//! fitted on a predictor stack and presence points and then scores a predictor stack.

use geo::Coord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::AnalysisError;
use crate::grid::{Grid, Lattice};

/// A georeferenced presence record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    pub species: String,
    pub x: f64,
    pub y: f64,
}

impl Occurrence {
    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }
}

/// A fitted model, mapping a predictor stack to a suitability grid.
pub trait SuitabilityScorer {
    fn predict(&self, predictors: &Grid) -> Result<Grid, AnalysisError>;
}

pub trait DistributionModel {
    type Scorer: SuitabilityScorer;

    fn fit(
        &self,
        predictors: &Grid,
        presences: &[Occurrence],
    ) -> Result<Self::Scorer, AnalysisError>;
}

/// Keeps the first record of each species in every cell and drops records off the lattice.
pub fn thin_to_cells(lattice: &Lattice, occurrences: &[Occurrence]) -> Vec<Occurrence> {
    let mut seen: HashSet<(&str, usize, usize)> = HashSet::new();

    occurrences
        .iter()
        .filter(|o| {
            lattice
                .cell_of(o.coord())
                .is_some_and(|(row, col)| seen.insert((o.species.as_str(), row, col)))
        })
        .cloned()
        .collect()
}

/// Predictor values under each point, `None` when the point is off the lattice or any band
/// is missing there.
pub fn extract_predictors(grid: &Grid, points: &[Occurrence]) -> Vec<Option<Vec<f64>>> {
    points
        .iter()
        .map(|point| {
            let (row, col) = grid.lattice().cell_of(point.coord())?;
            (0..grid.band_count())
                .map(|band| grid.value(band, row, col))
                .collect::<Option<Vec<f64>>>()
        })
        .collect()
}
