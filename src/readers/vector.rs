use gdal::Dataset;
use gdal::vector::LayerAccess;
use geo::{Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use tracing::debug;

use super::ReadError;
use crate::mask::{Mask, MaskGeometry};

#[derive(Default)]
struct Parts {
    polygons: Vec<Polygon<f64>>,
    lines: Vec<LineString<f64>>,
    points: Vec<Point<f64>>,
}

impl Parts {
    fn push(&mut self, geometry: Geometry<f64>) {
        match geometry {
            Geometry::Point(p) => self.points.push(p),
            Geometry::MultiPoint(mp) => self.points.extend(mp),
            Geometry::Line(l) => self.lines.push(LineString::from(l)),
            Geometry::LineString(l) => self.lines.push(l),
            Geometry::MultiLineString(ml) => self.lines.extend(ml),
            Geometry::Polygon(p) => self.polygons.push(p),
            Geometry::MultiPolygon(mp) => self.polygons.extend(mp),
            Geometry::Rect(r) => self.polygons.push(r.to_polygon()),
            Geometry::Triangle(t) => self.polygons.push(t.to_polygon()),
            Geometry::GeometryCollection(gc) => gc.into_iter().for_each(|g| self.push(g)),
        }
    }

    fn into_geometry(self) -> Result<MaskGeometry, String> {
        match (
            self.polygons.is_empty(),
            self.lines.is_empty(),
            self.points.is_empty(),
        ) {
            (false, true, true) => Ok(MaskGeometry::Polygons(MultiPolygon::new(self.polygons))),
            (true, false, true) => Ok(MaskGeometry::Lines(MultiLineString::new(self.lines))),
            (true, true, false) => Ok(MaskGeometry::Points(MultiPoint::new(self.points))),
            (true, true, true) => Err("no geometries found".to_string()),
            _ => Err("mixed polygon, line and point geometries".to_string()),
        }
    }
}

/// Reads every feature of every layer in `path` (shapefile, GeoJSON, GeoPackage...) into a
/// single mask. All features must share one geometry kind.
pub fn read_mask(path: &str, name: &str, buffer: f64) -> Result<Mask, ReadError> {
    let dataset = Dataset::open(path)?;
    let mut parts = Parts::default();

    for mut layer in dataset.layers() {
        for feature in layer.features() {
            if let Some(geometry) = feature.geometry() {
                parts.push(geometry.to_geo()?);
            }
        }
    }

    debug!(
        path,
        mask = name,
        polygons = parts.polygons.len(),
        lines = parts.lines.len(),
        points = parts.points.len(),
        "read mask"
    );

    let geometry = parts
        .into_geometry()
        .map_err(|e| ReadError::Vector(format!("{}: {}", path, e)))?;

    Ok(Mask::new(name, geometry).with_buffer(buffer))
}
