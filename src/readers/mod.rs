//! Raster, vector and occurrence readers.

pub mod gdal_raster;
pub mod geotiff;
pub mod nc;
pub mod occurrences;
pub mod types;
pub mod utils;
pub mod vector;
pub mod zarr;

pub use gdal_raster::GdalReader;
pub use geotiff::GeoTiffReader;
pub use nc::NcReader;
pub use occurrences::read_occurrences;
pub use types::{FileError, FileType, RasterReader, ReadError};
pub use utils::reader_from_filetype;
pub use vector::read_mask;
pub use zarr::ZarrReader;

/// Picks a reader from the file extension. `variable` selects the NetCDF variable or Zarr
/// array and is ignored by the other formats.
pub fn create_reader(
    file_name: String,
    variable: Option<String>,
) -> Result<Box<dyn RasterReader>, FileError> {
    match reader_from_filetype(file_name.as_ref()) {
        Ok(FileType::GeoTiff) => Ok(Box::new(GeoTiffReader { file_name })),
        Ok(FileType::NetCdf) => Ok(Box::new(NcReader {
            file_name,
            variable,
        })),
        Ok(FileType::Zarr) => Ok(Box::new(ZarrReader {
            file_name,
            variable,
        })),
        Ok(FileType::Gdal) => Ok(Box::new(GdalReader { file_name })),
        Err(e) => Err(e),
    }
}
