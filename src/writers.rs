use gdal::raster::Buffer;
use gdal::{DriverManager, Metadata};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::grid::Grid;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("GDAL: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes every band of `grid` to a float64 GeoTIFF, missing cells as NaN nodata and band
/// names as band descriptions.
pub fn write_geotiff<P: AsRef<Path>>(grid: &Grid, path: P) -> Result<(), WriteError> {
    let (rows, cols) = grid.lattice().shape();

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut dataset =
        driver.create_with_band_type::<f64, _>(path.as_ref(), cols, rows, grid.band_count())?;
    dataset.set_geo_transform(&grid.lattice().geo_transform())?;

    for (i, band) in grid.bands().iter().enumerate() {
        let mut raster_band = dataset.rasterband(i + 1)?;
        raster_band.set_no_data_value(Some(f64::NAN))?;
        raster_band.set_description(&band.name)?;

        let data: Vec<f64> = band
            .values
            .iter()
            .map(|&v| if grid.is_missing(v) { f64::NAN } else { v })
            .collect();
        let mut buffer = Buffer::new((cols, rows), data);
        raster_band.write((0, 0), (cols, rows), &mut buffer)?;
    }

    info!(path = %path.as_ref().display(), bands = grid.band_count(), "✓ Saved raster");
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(
    value: &T,
    path: P,
) -> Result<(), WriteError> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;

    info!(path = %path.as_ref().display(), "✓ Saved table");
    Ok(())
}
