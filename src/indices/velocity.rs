use chrono::{Datelike, NaiveDate};
use ndarray::Array2;

use super::emergence::AnomalySeries;
use crate::error::AnalysisError;
use crate::grid::{Band, Grid};

pub const TREND_BAND: &str = "trend";
pub const GRADIENT_BAND: &str = "gradient";
pub const VELOCITY_BAND: &str = "velocity";

const KM_PER_DEGREE: f64 = 111.325;

/// How lattice units translate into kilometres.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellDistance {
    /// Longitude / latitude degrees, east-west spacing shrinks with latitude.
    Geographic,
    /// Projected metres.
    Projected,
}

fn decimal_year(date: NaiveDate) -> f64 {
    let days = if date.leap_year() { 366.0 } else { 365.0 };
    date.year() as f64 + date.ordinal0() as f64 / days
}

/// Least-squares slope of every cell against time, in units per year.
pub fn temporal_trend(series: &AnomalySeries) -> Result<Grid, AnalysisError> {
    if series.len() < 2 {
        return Err(AnalysisError::InsufficientSeries {
            required: 2,
            found: series.len(),
        });
    }

    let years: Vec<f64> = series.dates().iter().map(|&d| decimal_year(d)).collect();
    let lattice = *series.grid().lattice();

    let values = Array2::from_shape_fn(lattice.shape(), |(row, col)| {
        let points: Vec<(f64, f64)> = series
            .cell_values(row, col)
            .into_iter()
            .map(|(step, v)| (years[step], v))
            .collect();

        if points.len() < 2 {
            return f64::NAN;
        }

        let n = points.len() as f64;
        let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
        let sxy: f64 = points.iter().map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();
        let sxx: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();

        if sxx == 0.0 { f64::NAN } else { sxy / sxx }
    });

    Grid::new(lattice, vec![Band::new(TREND_BAND, values)])
}

/// Finite difference across one axis. Central where both neighbours exist, one-sided otherwise.
fn axis_derivative(before: Option<f64>, here: f64, after: Option<f64>, step: f64) -> Option<f64> {
    match (before, after) {
        (Some(b), Some(a)) => Some((a - b) / (2.0 * step)),
        (None, Some(a)) => Some((a - here) / step),
        (Some(b), None) => Some((here - b) / step),
        (None, None) => None,
    }
}

/// Magnitude of the spatial gradient of `band`, in units per kilometre.
pub fn spatial_gradient(
    grid: &Grid,
    band: &str,
    distance: CellDistance,
) -> Result<Grid, AnalysisError> {
    let index = grid.band_index(band)?;
    let lattice = *grid.lattice();
    let (rows, cols) = lattice.shape();

    let values = Array2::from_shape_fn((rows, cols), |(row, col)| {
        let Some(here) = grid.value(index, row, col) else {
            return f64::NAN;
        };

        let (dx, dy) = match distance {
            CellDistance::Geographic => {
                let latitude = lattice.cell_center(row, col).y.to_radians();
                (
                    lattice.cell_width * KM_PER_DEGREE * latitude.cos(),
                    lattice.cell_height * KM_PER_DEGREE,
                )
            }
            CellDistance::Projected => (lattice.cell_width / 1000.0, lattice.cell_height / 1000.0),
        };

        let west = col.checked_sub(1).and_then(|c| grid.value(index, row, c));
        let east = grid.value(index, row, col + 1);
        let north = row.checked_sub(1).and_then(|r| grid.value(index, r, col));
        let south = grid.value(index, row + 1, col);

        // Rows run southwards, so northward change is the negated row derivative
        match (
            axis_derivative(west, here, east, dx),
            axis_derivative(north, here, south, dy),
        ) {
            (Some(gx), Some(gy)) if dx > 0.0 => gx.hypot(-gy),
            _ => f64::NAN,
        }
    });

    Grid::new(lattice, vec![Band::new(GRADIENT_BAND, values)])
}

/// Speed (km per year) at which isolines of the variable move: trend divided by gradient.
pub fn climate_velocity(trend: &Grid, gradient: &Grid) -> Result<Grid, AnalysisError> {
    if !trend.lattice().matches(gradient.lattice()) {
        return Err(AnalysisError::ShapeMismatch(format!(
            "trend is {}, gradient is {}",
            trend.lattice(),
            gradient.lattice()
        )));
    }

    let t = trend.band_index(TREND_BAND)?;
    let g = gradient.band_index(GRADIENT_BAND)?;

    let values = Array2::from_shape_fn(trend.lattice().shape(), |(row, col)| {
        match (trend.value(t, row, col), gradient.value(g, row, col)) {
            (Some(rate), Some(slope)) if slope > 0.0 => rate / slope,
            _ => f64::NAN,
        }
    });

    Grid::new(*trend.lattice(), vec![Band::new(VELOCITY_BAND, values)])
}
