use ndarray::Array2;
use std::fmt;

use crate::error::AnalysisError;
use crate::grid::{Band, Grid};

/// Result of bucketing a depth magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthClass {
    Shelf,
    Slope,
    OutOfRange,
}

/// Depth limits (positive metres below the surface) separating shelf from slope.
///
/// Shelf covers `[0, shelf)` and slope covers `[shelf, slope]`: a cell sitting exactly on the
/// shelf break belongs to the slope. Anything deeper than `slope`, above sea level or missing
/// is out of range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthThresholds {
    shelf: f64,
    slope: f64,
}

impl DepthThresholds {
    pub fn new(shelf: f64, slope: f64) -> Result<Self, String> {
        if !(shelf > 0.0) || !(slope > shelf) || !slope.is_finite() {
            return Err(format!(
                "Depth thresholds must satisfy 0 < shelf < slope, got {} and {}",
                shelf, slope
            ));
        }
        Ok(Self { shelf, slope })
    }

    /// 200 m / 5000 m, used to bucket habitat tables.
    pub fn habitat() -> Self {
        Self {
            shelf: 200.0,
            slope: 5000.0,
        }
    }

    /// 200 m / 4000 m, used for contour overlays.
    pub fn contours() -> Self {
        Self {
            shelf: 200.0,
            slope: 4000.0,
        }
    }

    pub fn shelf(&self) -> f64 {
        self.shelf
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn classify(&self, depth: f64) -> DepthClass {
        if depth.is_nan() || depth < 0.0 || depth > self.slope {
            DepthClass::OutOfRange
        } else if depth < self.shelf {
            DepthClass::Shelf
        } else {
            DepthClass::Slope
        }
    }

    /// Same as [`classify`](Self::classify) for an elevation (negative below sea level).
    pub fn classify_elevation(&self, elevation: f64) -> DepthClass {
        self.classify(-elevation)
    }
}

impl Default for DepthThresholds {
    fn default() -> Self {
        Self::habitat()
    }
}

impl fmt::Display for DepthThresholds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shelf < {} m <= slope <= {} m", self.shelf, self.slope)
    }
}

pub const CONTOUR_BAND: &str = "contour";

/// Single band grid coding shelf cells as 1, slope cells as 2 and everything else as missing.
pub fn depth_contours(
    grid: &Grid,
    depth_band: &str,
    thresholds: &DepthThresholds,
) -> Result<Grid, AnalysisError> {
    let depth = grid.band_index(depth_band)?;

    let values = Array2::from_shape_fn(grid.lattice().shape(), |(row, col)| {
        match grid
            .value(depth, row, col)
            .map(|elevation| thresholds.classify_elevation(elevation))
        {
            Some(DepthClass::Shelf) => 1.0,
            Some(DepthClass::Slope) => 2.0,
            _ => f64::NAN,
        }
    });

    Grid::new(*grid.lattice(), vec![Band::new(CONTOUR_BAND, values)])
}
