//! Geographic masks and their containment tests against a grid lattice.

use geo::{
    Contains, EuclideanDistance, Intersects, MultiLineString, MultiPoint, MultiPolygon, Point,
};
use ndarray::Array2;

use crate::grid::Lattice;

/// Anything able to say whether a lattice cell falls inside it.
pub trait CellMask {
    fn name(&self) -> &str;

    fn selects(&self, lattice: &Lattice, row: usize, col: usize) -> bool;

    /// Membership of every cell, computed once per lattice.
    fn selection(&self, lattice: &Lattice) -> Array2<bool> {
        Array2::from_shape_fn(lattice.shape(), |(row, col)| self.selects(lattice, row, col))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaskGeometry {
    Polygons(MultiPolygon<f64>),
    Lines(MultiLineString<f64>),
    Points(MultiPoint<f64>),
}

/// A named region: an EEZ polygon, a canyon polyline or a set of seamount / coral points.
///
/// With a zero buffer polygons select the cells whose centre they contain, lines select the
/// cells they cross and points select the cell they fall in. A positive buffer (lattice units)
/// additionally selects every cell whose centre lies within that distance of the geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    name: String,
    geometry: MaskGeometry,
    buffer: f64,
}

impl Mask {
    pub fn new(name: impl Into<String>, geometry: MaskGeometry) -> Self {
        Self {
            name: name.into(),
            geometry,
            buffer: 0.0,
        }
    }

    pub fn with_buffer(mut self, buffer: f64) -> Self {
        self.buffer = buffer.max(0.0);
        self
    }

    pub fn geometry(&self) -> &MaskGeometry {
        &self.geometry
    }

    pub fn buffer(&self) -> f64 {
        self.buffer
    }

    fn distance(&self, point: &Point<f64>) -> f64 {
        match &self.geometry {
            MaskGeometry::Polygons(polygons) => polygons
                .iter()
                .map(|p| point.euclidean_distance(p))
                .fold(f64::INFINITY, f64::min),
            MaskGeometry::Lines(lines) => lines
                .iter()
                .map(|l| point.euclidean_distance(l))
                .fold(f64::INFINITY, f64::min),
            MaskGeometry::Points(points) => points
                .iter()
                .map(|p| point.euclidean_distance(p))
                .fold(f64::INFINITY, f64::min),
        }
    }
}

impl CellMask for Mask {
    fn name(&self) -> &str {
        &self.name
    }

    fn selects(&self, lattice: &Lattice, row: usize, col: usize) -> bool {
        let center = Point::from(lattice.cell_center(row, col));

        let inside = match &self.geometry {
            MaskGeometry::Polygons(polygons) => polygons.contains(&center),
            MaskGeometry::Lines(lines) => {
                let cell = lattice.cell_rect(row, col).to_polygon();
                lines.iter().any(|line| line.intersects(&cell))
            }
            MaskGeometry::Points(points) => points
                .iter()
                .any(|p| lattice.cell_of(p.0) == Some((row, col))),
        };

        inside || (self.buffer > 0.0 && self.distance(&center) <= self.buffer)
    }

    fn selection(&self, lattice: &Lattice) -> Array2<bool> {
        // Points only ever touch a handful of cells, so look those up directly when unbuffered
        if let MaskGeometry::Points(points) = &self.geometry
            && self.buffer == 0.0
        {
            let mut selection = Array2::from_elem(lattice.shape(), false);
            for cell in points.iter().filter_map(|p| lattice.cell_of(p.0)) {
                selection[cell] = true;
            }
            return selection;
        }

        Array2::from_shape_fn(lattice.shape(), |(row, col)| self.selects(lattice, row, col))
    }
}
