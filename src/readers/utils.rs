use super::types::{FileError, FileType};
use std::path::Path;

pub fn reader_from_filetype(path: &Path) -> Result<FileType, FileError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("tif") | Some("tiff") => Ok(FileType::GeoTiff),
        Some("nc") => Ok(FileType::NetCdf),
        Some("zarr") => Ok(FileType::Zarr),
        Some("vrt") | Some("asc") | Some("grd") | Some("img") => Ok(FileType::Gdal),
        _ => Err(FileError::UnknownFileType(path.display().to_string())),
    }
}
