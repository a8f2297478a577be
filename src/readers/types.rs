use thiserror::Error;

use crate::error::AnalysisError;
use crate::grid::Grid;

/// Reads one band of a georeferenced raster into a single band [`Grid`] named `name`.
pub trait RasterReader {
    fn read_band(&self, name: &str) -> Result<Grid, ReadError>;
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("GeoTIFF: {0}")]
    GeoTiff(String),

    #[error("GDAL: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("unsupported raster layout: {0}")]
    Layout(String),

    #[error("vector layer: {0}")]
    Vector(String),

    #[error("occurrences: {0}")]
    Occurrences(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Grid(#[from] AnalysisError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FileError {
    #[error("unknown file type: {0}")]
    UnknownFileType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    GeoTiff,
    NetCdf,
    Zarr,
    Gdal,
}
