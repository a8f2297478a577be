//! Cumulative climate impact on the seafloor.
//!
//! Four standardized anomaly bands (POC flux, dissolved oxygen, pH, temperature) are folded
//! into a negative band (summed hazards) and a positive band (summed improvements).

pub mod cell;

pub use cell::{HazardBand, HazardCell, Impact};

use ndarray::Array2;
use tracing::debug;

use crate::error::AnalysisError;
use crate::grid::{Band, Grid};

pub const NEGATIVE_BAND: &str = "negative";
pub const POSITIVE_BAND: &str = "positive";

/// Computes the negative and positive impact bands of `hazards`.
///
/// `hazards` must hold exactly four bands in [`HazardBand::ORDER`]. The result is masked with
/// the footprint of the first band of `bathymetry`: wherever the bathymetry is missing, so is
/// the impact.
pub fn cumulative_impact(hazards: &Grid, bathymetry: &Grid) -> Result<Grid, AnalysisError> {
    if hazards.band_count() != HazardBand::ORDER.len() {
        return Err(AnalysisError::BandCountMismatch {
            expected: HazardBand::ORDER.len(),
            found: hazards.band_count(),
        });
    }

    if !hazards.lattice().matches(bathymetry.lattice()) {
        return Err(AnalysisError::ShapeMismatch(format!(
            "bathymetry is {}, hazards are {}",
            bathymetry.lattice(),
            hazards.lattice()
        )));
    }

    if bathymetry.band_count() == 0 {
        return Err(AnalysisError::BandCountMismatch {
            expected: 1,
            found: 0,
        });
    }

    let shape = hazards.lattice().shape();
    let mut negative = Array2::from_elem(shape, f64::NAN);
    let mut positive = Array2::from_elem(shape, f64::NAN);

    for (row, col) in hazards.cells() {
        if bathymetry.value(0, row, col).is_none() {
            continue;
        }

        let cell = HazardCell::from_values(std::array::from_fn(|band| {
            hazards.value(band, row, col)
        }));

        if let Some(impact) = cell.impact() {
            negative[(row, col)] = impact.negative;
            positive[(row, col)] = impact.positive;
        }
    }

    debug!(
        lattice = %hazards.lattice(),
        defined = negative.iter().filter(|v| !v.is_nan()).count(),
        "cumulative impact"
    );

    Grid::new(
        *hazards.lattice(),
        vec![
            Band::new(NEGATIVE_BAND, negative),
            Band::new(POSITIVE_BAND, positive),
        ],
    )
}
