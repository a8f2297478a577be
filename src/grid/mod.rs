//! In-memory raster grids.
//!
//! A [`Grid`] is a stack of named [`Band`]s sharing a single [`Lattice`]. Missing cells are
//! either NaN or equal to the grid's nodata sentinel; readers keep the sentinel found in the
//! source file and every derived grid is produced with NaN.

pub mod lattice;

pub use lattice::{Lattice, Window};

use ndarray::{Array2, s};

use crate::bbox::Bbox;
use crate::error::AnalysisError;

#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub name: String,
    pub values: Array2<f64>,
}

impl Band {
    pub fn new(name: impl Into<String>, values: Array2<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn missing(name: impl Into<String>, lattice: &Lattice) -> Self {
        Self::new(name, Array2::from_elem(lattice.shape(), f64::NAN))
    }
}

#[derive(Debug, Clone)]
pub struct Grid {
    lattice: Lattice,
    bands: Vec<Band>,
    nodata: f64,
}

impl Grid {
    pub fn new(lattice: Lattice, bands: Vec<Band>) -> Result<Self, AnalysisError> {
        for (i, band) in bands.iter().enumerate() {
            if band.values.dim() != lattice.shape() {
                return Err(AnalysisError::ShapeMismatch(format!(
                    "band `{}` is {:?}, lattice is {:?}",
                    band.name,
                    band.values.dim(),
                    lattice.shape()
                )));
            }
            if bands[..i].iter().any(|b| b.name == band.name) {
                return Err(AnalysisError::BandMismatch(format!(
                    "{} (duplicated)",
                    band.name
                )));
            }
        }

        Ok(Self {
            lattice,
            bands,
            nodata: f64::NAN,
        })
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = nodata;
        self
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn nodata(&self) -> f64 {
        self.nodata
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn band_index(&self, name: &str) -> Result<usize, AnalysisError> {
        self.bands
            .iter()
            .position(|b| b.name == name)
            .ok_or_else(|| AnalysisError::BandMismatch(name.to_string()))
    }

    pub fn band(&self, name: &str) -> Result<&Band, AnalysisError> {
        self.band_index(name).map(|i| &self.bands[i])
    }

    pub fn is_missing(&self, value: f64) -> bool {
        value.is_nan() || value == self.nodata
    }

    pub fn value(&self, band: usize, row: usize, col: usize) -> Option<f64> {
        let value = *self.bands.get(band)?.values.get((row, col))?;
        (!self.is_missing(value)).then_some(value)
    }

    /// Cell indices in row-major order, the iteration order used by every table output.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + use<> {
        let (rows, cols) = self.lattice.shape();
        (0..rows).flat_map(move |row| (0..cols).map(move |col| (row, col)))
    }

    /// Copy with every missing cell stored as NaN.
    pub fn normalized(&self) -> Grid {
        let bands = self
            .bands
            .iter()
            .map(|band| {
                Band::new(
                    band.name.clone(),
                    band.values
                        .mapv(|v| if self.is_missing(v) { f64::NAN } else { v }),
                )
            })
            .collect();

        Grid {
            lattice: self.lattice,
            bands,
            nodata: f64::NAN,
        }
    }

    pub fn select(&self, names: &[&str]) -> Result<Grid, AnalysisError> {
        let bands = names
            .iter()
            .map(|name| self.band(name).cloned())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Grid {
            lattice: self.lattice,
            bands,
            nodata: self.nodata,
        })
    }

    /// Appends the bands of `other`. Both grids must share the same lattice.
    pub fn stack(&self, other: &Grid) -> Result<Grid, AnalysisError> {
        if !self.lattice.matches(&other.lattice) {
            return Err(AnalysisError::ShapeMismatch(format!(
                "cannot stack {} onto {}",
                other.lattice, self.lattice
            )));
        }

        let mut bands = self.normalized().bands;
        bands.extend(other.normalized().bands);

        Grid::new(self.lattice, bands)
    }

    pub fn crop(&self, bbox: &Bbox) -> Result<Grid, AnalysisError> {
        let window = self.lattice.window(bbox).ok_or_else(|| {
            AnalysisError::ShapeMismatch(format!("{:?} does not overlap {}", bbox, self.lattice))
        })?;

        let rows = window.row_off..window.row_off + window.rows;
        let cols = window.col_off..window.col_off + window.cols;

        let bands = self
            .bands
            .iter()
            .map(|band| {
                Band::new(
                    band.name.clone(),
                    band.values.slice(s![rows.clone(), cols.clone()]).to_owned(),
                )
            })
            .collect();

        Ok(Grid {
            lattice: self.lattice.subset(&window),
            bands,
            nodata: self.nodata,
        })
    }
}
