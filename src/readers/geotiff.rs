use ndarray::Array2;
use std::fs::File;
use std::io::BufReader;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use super::{RasterReader, ReadError};
use crate::grid::{Band, Grid, Lattice};

/// Single band GeoTIFF reader that does not need GDAL. Georeferencing comes from the
/// ModelPixelScale and ModelTiepoint tags, nodata from the GDAL_NODATA tag.
pub struct GeoTiffReader {
    pub file_name: String,
}

impl GeoTiffReader {
    fn f64_tag<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
        tag: Tag,
    ) -> Result<Vec<f64>, ReadError> {
        decoder
            .find_tag(tag)
            .map_err(|e| ReadError::GeoTiff(format!("Failed to read {:?}: {}", tag, e)))?
            .ok_or_else(|| ReadError::GeoTiff(format!("Missing {:?} tag", tag)))?
            .into_f64_vec()
            .map_err(|e| ReadError::GeoTiff(format!("Invalid {:?}: {}", tag, e)))
    }

    fn nodata<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
    ) -> Result<Option<f64>, ReadError> {
        let Some(value) = decoder
            .find_tag(Tag::GdalNodata)
            .map_err(|e| ReadError::GeoTiff(format!("Failed to read GDAL_NODATA: {}", e)))?
        else {
            return Ok(None);
        };

        let text = value
            .into_string()
            .map_err(|e| ReadError::GeoTiff(format!("Invalid GDAL_NODATA: {}", e)))?;

        let text = text.trim_matches(char::from(0)).trim();
        text.parse::<f64>()
            .map(Some)
            .map_err(|e| ReadError::GeoTiff(format!("Invalid GDAL_NODATA `{}`: {}", text, e)))
    }
}

impl RasterReader for GeoTiffReader {
    fn read_band(&self, name: &str) -> Result<Grid, ReadError> {
        let file = File::open(&self.file_name)
            .map_err(|e| ReadError::GeoTiff(format!("Failed to open {}: {}", self.file_name, e)))?;

        let reader = BufReader::new(file);

        let mut decoder = Decoder::new(reader)
            .map_err(|e| ReadError::GeoTiff(format!("Failed to decode TIFF: {}", e)))?;

        let (width, height) = decoder
            .dimensions()
            .map_err(|e| ReadError::GeoTiff(format!("Failed to get dimensions: {}", e)))?;

        // [sx, sy, sz] and [i, j, k, x, y, z]
        let scale = Self::f64_tag(&mut decoder, Tag::ModelPixelScaleTag)?;
        let tiepoint = Self::f64_tag(&mut decoder, Tag::ModelTiepointTag)?;
        if scale.len() < 2 || tiepoint.len() < 6 {
            return Err(ReadError::GeoTiff(
                "Malformed georeferencing tags".to_string(),
            ));
        }

        let lattice = Lattice::new(
            tiepoint[3] - tiepoint[0] * scale[0],
            tiepoint[4] + tiepoint[1] * scale[1],
            scale[0],
            scale[1],
            width as usize,
            height as usize,
        )
        .map_err(ReadError::GeoTiff)?;

        let missing_value = Self::nodata(&mut decoder)?;

        let image_data: Vec<f64> = match decoder
            .read_image()
            .map_err(|e| ReadError::GeoTiff(format!("Failed to read image: {}", e)))?
        {
            DecodingResult::U8(data) => data.iter().map(|&x| x as f64).collect(),
            DecodingResult::U16(data) => data.iter().map(|&x| x as f64).collect(),
            DecodingResult::U32(data) => data.iter().map(|&x| x as f64).collect(),
            DecodingResult::I8(data) => data.iter().map(|&x| x as f64).collect(),
            DecodingResult::I16(data) => data.iter().map(|&x| x as f64).collect(),
            DecodingResult::I32(data) => data.iter().map(|&x| x as f64).collect(),
            DecodingResult::F32(data) => data.iter().map(|&x| x as f64).collect(),
            DecodingResult::F64(data) => data,
            _ => return Err(ReadError::GeoTiff("Unsupported pixel format".to_string())),
        };

        if image_data.len() != lattice.cell_count() {
            return Err(ReadError::Layout(format!(
                "{} holds {} samples for {} pixels, only single band images are supported",
                self.file_name,
                image_data.len(),
                lattice.cell_count()
            )));
        }

        let values = Array2::from_shape_vec(lattice.shape(), image_data)
            .map_err(|e| ReadError::Layout(e.to_string()))?;

        let grid = Grid::new(lattice, vec![Band::new(name, values)])?;
        Ok(match missing_value {
            Some(nodata) => grid.with_nodata(nodata),
            None => grid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tiff::encoder::{TiffEncoder, colortype};

    fn write_tiff(path: &std::path::Path, nodata: Option<&str>) {
        let file = File::create(path).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();
        let mut image = encoder.new_image::<colortype::Gray32Float>(3, 2).unwrap();
        image
            .encoder()
            .write_tag(Tag::ModelPixelScaleTag, &[0.25f64, 0.5, 0.0][..])
            .unwrap();
        image
            .encoder()
            .write_tag(Tag::ModelTiepointTag, &[0.0f64, 0.0, 0.0, -66.0, 45.0, 0.0][..])
            .unwrap();
        if let Some(nodata) = nodata {
            image.encoder().write_tag(Tag::GdalNodata, nodata).unwrap();
        }
        image
            .write_data(&[-120.0f32, -250.0, -9999.0, -3000.0, -4200.0, 15.0])
            .unwrap();
    }

    #[test]
    fn test_reads_georeferenced_band() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("depth.tif");
        write_tiff(&path, Some("-9999"));

        let reader = GeoTiffReader {
            file_name: path.to_string_lossy().to_string(),
        };
        let grid = reader.read_band("depth").unwrap();

        let lattice = grid.lattice();
        assert_eq!(lattice.shape(), (2, 3));
        assert_eq!((lattice.origin_x, lattice.origin_y), (-66.0, 45.0));
        assert_eq!((lattice.cell_width, lattice.cell_height), (0.25, 0.5));

        assert_eq!(grid.value(0, 0, 0), Some(-120.0));
        assert_eq!(grid.value(0, 0, 2), None);
        assert_eq!(grid.value(0, 1, 2), Some(15.0));
    }

    #[test]
    fn test_without_nodata_tag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("depth.tif");
        write_tiff(&path, None);

        let reader = GeoTiffReader {
            file_name: path.to_string_lossy().to_string(),
        };
        let grid = reader.read_band("depth").unwrap();
        assert_eq!(grid.value(0, 0, 2), Some(-9999.0));
    }

    #[test]
    fn test_missing_file() {
        let reader = GeoTiffReader {
            file_name: "does/not/exist.tif".to_string(),
        };
        assert!(matches!(
            reader.read_band("depth"),
            Err(ReadError::GeoTiff(_))
        ));
    }
}
