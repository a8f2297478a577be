use gdal::Dataset;
use ndarray::Array2;
use tracing::debug;

use super::{RasterReader, ReadError};
use crate::grid::{Band, Grid, Lattice};

/// Any raster GDAL can open; reads band 1.
pub struct GdalReader {
    pub file_name: String,
}

impl RasterReader for GdalReader {
    fn read_band(&self, name: &str) -> Result<Grid, ReadError> {
        read_first_band(&self.file_name, name)
    }
}

/// Reads band 1 of `path`, applying scale and offset and mapping nodata to NaN.
pub(crate) fn read_first_band(path: &str, name: &str) -> Result<Grid, ReadError> {
    let dataset = Dataset::open(path)?;
    let (cols, rows) = dataset.raster_size();
    let geotransform = dataset.geo_transform()?;
    let lattice = Lattice::from_geo_transform(geotransform, cols, rows).map_err(ReadError::Layout)?;

    let band = dataset.rasterband(1)?;
    let buffer = band.read_as::<f64>((0, 0), (cols, rows), (cols, rows), None)?;
    let scale = band.scale().unwrap_or(1.0);
    let offset = band.offset().unwrap_or(0.0);
    let missing_value = band.no_data_value();

    let values: Vec<f64> = buffer
        .data()
        .iter()
        .map(|&raw| {
            if missing_value.is_some_and(|mv| raw == mv) {
                f64::NAN
            } else {
                raw * scale + offset
            }
        })
        .collect();

    let values = Array2::from_shape_vec((rows, cols), values)
        .map_err(|e| ReadError::Layout(e.to_string()))?;

    debug!(path, band = name, lattice = %lattice, "read raster through GDAL");

    Ok(Grid::new(lattice, vec![Band::new(name, values)])?)
}
