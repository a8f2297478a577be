use chrono::{Datelike, NaiveDate};
use ndarray::Array2;

use crate::error::AnalysisError;
use crate::grid::{Band, Grid};

pub const TOE_BAND: &str = "toe";
pub const MEAN_BAND: &str = "mean";

/// A grid holding one band per time step, paired with the date of each step.
#[derive(Debug, Clone)]
pub struct AnomalySeries {
    dates: Vec<NaiveDate>,
    grid: Grid,
}

impl AnomalySeries {
    pub fn new(dates: Vec<NaiveDate>, grid: Grid) -> Result<Self, AnalysisError> {
        if dates.len() != grid.band_count() {
            return Err(AnalysisError::BandCountMismatch {
                expected: dates.len(),
                found: grid.band_count(),
            });
        }
        Ok(Self { dates, grid })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Valid values of one cell with the index of their step.
    pub fn cell_values(&self, row: usize, col: usize) -> Vec<(usize, f64)> {
        (0..self.len())
            .filter_map(|step| self.grid.value(step, row, col).map(|v| (step, v)))
            .collect()
    }

    /// Per-cell mean over the whole series.
    pub fn mean(&self) -> Result<Grid, AnalysisError> {
        let values = Array2::from_shape_fn(self.grid.lattice().shape(), |(row, col)| {
            let values = self.cell_values(row, col);
            if values.is_empty() {
                f64::NAN
            } else {
                values.iter().map(|(_, v)| v).sum::<f64>() / values.len() as f64
            }
        });

        Grid::new(*self.grid.lattice(), vec![Band::new(MEAN_BAND, values)])
    }
}

/// Expresses every step in standard deviations of the baseline, the steps dated on or before
/// `baseline_end`. Cells with fewer than two baseline values or no baseline variability are
/// missing in every step.
pub fn standardize(
    series: &AnomalySeries,
    baseline_end: NaiveDate,
) -> Result<AnomalySeries, AnalysisError> {
    let baseline = series.dates.iter().filter(|&&d| d <= baseline_end).count();
    if baseline < 2 {
        return Err(AnalysisError::InsufficientSeries {
            required: 2,
            found: baseline,
        });
    }

    let lattice = *series.grid.lattice();
    let mut bands: Vec<Band> = series
        .grid
        .bands()
        .iter()
        .map(|b| Band::missing(b.name.clone(), &lattice))
        .collect();

    for (row, col) in series.grid.cells() {
        let values = series.cell_values(row, col);
        let reference: Vec<f64> = values
            .iter()
            .filter(|(step, _)| series.dates[*step] <= baseline_end)
            .map(|(_, v)| *v)
            .collect();

        if reference.len() < 2 {
            continue;
        }

        let n = reference.len() as f64;
        let mean = reference.iter().sum::<f64>() / n;
        let sd = (reference.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();

        if sd == 0.0 || !sd.is_finite() {
            continue;
        }

        for (step, value) in values {
            bands[step].values[(row, col)] = (value - mean) / sd;
        }
    }

    AnomalySeries::new(series.dates.clone(), Grid::new(lattice, bands)?)
}

/// Calendar year of the first step whose anomaly magnitude exceeds `threshold`.
pub fn time_of_emergence(
    series: &AnomalySeries,
    threshold: f64,
) -> Result<Grid, AnalysisError> {
    let values = Array2::from_shape_fn(series.grid.lattice().shape(), |(row, col)| {
        series
            .cell_values(row, col)
            .into_iter()
            .find(|(_, v)| v.abs() > threshold)
            .map(|(step, _)| series.dates[step].year() as f64)
            .unwrap_or(f64::NAN)
    });

    Grid::new(*series.grid.lattice(), vec![Band::new(TOE_BAND, values)])
}
