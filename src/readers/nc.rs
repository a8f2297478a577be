use super::gdal_raster::read_first_band;
use super::{RasterReader, ReadError};
use crate::grid::Grid;

pub struct NcReader {
    pub file_name: String,
    pub variable: Option<String>,
}

impl NcReader {
    // NetCDF subdatasets are addressed as NETCDF:<file>:<variable>
    fn gdal_path(&self) -> String {
        match &self.variable {
            Some(variable) => format!("NETCDF:{}:{}", self.file_name, variable),
            None => self.file_name.clone(),
        }
    }
}

impl RasterReader for NcReader {
    fn read_band(&self, name: &str) -> Result<Grid, ReadError> {
        read_first_band(&self.gdal_path(), name)
    }
}
