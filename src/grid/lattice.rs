use geo::{Coord, Rect};

use crate::bbox::Bbox;

const GEOMETRY_TOLERANCE: f64 = 1e-9;

/// Regular lattice shared by every band of a grid.
///
/// The origin is the outer corner of the top-left cell and rows run southwards,
/// matching a north-up GDAL geotransform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    pub origin_x: f64,
    pub origin_y: f64,
    pub cell_width: f64,
    pub cell_height: f64,
    pub cols: usize,
    pub rows: usize,
}

/// Pixel window into a lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub col_off: usize,
    pub row_off: usize,
    pub cols: usize,
    pub rows: usize,
}

impl Lattice {
    pub fn new(
        origin_x: f64,
        origin_y: f64,
        cell_width: f64,
        cell_height: f64,
        cols: usize,
        rows: usize,
    ) -> Result<Self, String> {
        if !(cell_width > 0.0 && cell_height > 0.0) {
            return Err("Cell sizes must be strictly positive".to_string());
        }

        if cols == 0 || rows == 0 {
            return Err("Lattice must have at least one row and one column".to_string());
        }

        Ok(Self {
            origin_x,
            origin_y,
            cell_width,
            cell_height,
            cols,
            rows,
        })
    }

    // geotransform: [top_left_x, pixel_width, 0, top_left_y, 0, -pixel_height]
    pub fn from_geo_transform(gt: [f64; 6], cols: usize, rows: usize) -> Result<Self, String> {
        if gt[2] != 0.0 || gt[4] != 0.0 {
            return Err("Rotated geotransforms are not supported".to_string());
        }
        Self::new(gt[0], gt[3], gt[1], -gt[5], cols, rows)
    }

    pub fn geo_transform(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.cell_width,
            0.0,
            self.origin_y,
            0.0,
            -self.cell_height,
        ]
    }

    /// (rows, cols), the ndarray shape of every band on this lattice.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Never zero, the constructor rejects empty lattices.
    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    pub fn cell_center(&self, row: usize, col: usize) -> Coord<f64> {
        Coord {
            x: self.origin_x + (col as f64 + 0.5) * self.cell_width,
            y: self.origin_y - (row as f64 + 0.5) * self.cell_height,
        }
    }

    pub fn cell_rect(&self, row: usize, col: usize) -> Rect<f64> {
        let min = Coord {
            x: self.origin_x + col as f64 * self.cell_width,
            y: self.origin_y - (row + 1) as f64 * self.cell_height,
        };
        let max = Coord {
            x: min.x + self.cell_width,
            y: min.y + self.cell_height,
        };
        Rect::new(min, max)
    }

    /// Cell holding `coord`. Cells are closed on their west and north edges.
    pub fn cell_of(&self, coord: Coord<f64>) -> Option<(usize, usize)> {
        let col = ((coord.x - self.origin_x) / self.cell_width).floor();
        let row = ((self.origin_y - coord.y) / self.cell_height).floor();

        if !col.is_finite() || !row.is_finite() || col < 0.0 || row < 0.0 {
            return None;
        }

        let (row, col) = (row as usize, col as usize);
        (row < self.rows && col < self.cols).then_some((row, col))
    }

    /// Pixel window covering `bbox`, clamped to the lattice. `None` when they do not overlap.
    pub fn window(&self, bbox: &Bbox) -> Option<Window> {
        let pixel_min_x = ((bbox.xmin - self.origin_x) / self.cell_width).floor() as i64;
        let pixel_max_x = ((bbox.xmax - self.origin_x) / self.cell_width).ceil() as i64;
        let pixel_min_y = ((self.origin_y - bbox.ymax) / self.cell_height).floor() as i64;
        let pixel_max_y = ((self.origin_y - bbox.ymin) / self.cell_height).ceil() as i64;

        let start_x = pixel_min_x.max(0) as usize;
        let end_x = pixel_max_x.max(0).min(self.cols as i64) as usize;
        let start_y = pixel_min_y.max(0) as usize;
        let end_y = pixel_max_y.max(0).min(self.rows as i64) as usize;

        if start_x >= end_x || start_y >= end_y {
            return None;
        }

        Some(Window {
            col_off: start_x,
            row_off: start_y,
            cols: end_x - start_x,
            rows: end_y - start_y,
        })
    }

    pub fn subset(&self, window: &Window) -> Lattice {
        Lattice {
            origin_x: self.origin_x + window.col_off as f64 * self.cell_width,
            origin_y: self.origin_y - window.row_off as f64 * self.cell_height,
            cell_width: self.cell_width,
            cell_height: self.cell_height,
            cols: window.cols,
            rows: window.rows,
        }
    }

    /// Same cell count, spacing and extent.
    pub fn matches(&self, other: &Lattice) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() <= GEOMETRY_TOLERANCE * a.abs().max(1.0);

        self.cols == other.cols
            && self.rows == other.rows
            && close(self.origin_x, other.origin_x)
            && close(self.origin_y, other.origin_y)
            && close(self.cell_width, other.cell_width)
            && close(self.cell_height, other.cell_height)
    }
}

impl std::fmt::Display for Lattice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} cells of {}x{} from ({}, {})",
            self.cols, self.rows, self.cell_width, self.cell_height, self.origin_x, self.origin_y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lattice() -> Lattice {
        Lattice::new(-10.0, 5.0, 1.0, 1.0, 20, 10).unwrap()
    }

    #[test]
    fn test_rejects_degenerate_lattices() {
        assert!(Lattice::new(0.0, 0.0, 0.0, 1.0, 2, 2).is_err());
        assert!(Lattice::new(0.0, 0.0, 1.0, 1.0, 0, 2).is_err());
        assert_eq!(lattice().cell_count(), 200);
    }

    #[test]
    fn test_geo_transform_round_trip() {
        let gt = lattice().geo_transform();
        assert_eq!(gt, [-10.0, 1.0, 0.0, 5.0, 0.0, -1.0]);
        assert_eq!(Lattice::from_geo_transform(gt, 20, 10).unwrap(), lattice());
    }

    #[test]
    fn test_cell_center_and_lookup() {
        let lattice = lattice();
        let center = lattice.cell_center(0, 0);
        assert_eq!((center.x, center.y), (-9.5, 4.5));
        assert_eq!(lattice.cell_of(center), Some((0, 0)));

        // West and north edges belong to the cell
        assert_eq!(lattice.cell_of(Coord { x: -9.0, y: 4.0 }), Some((1, 1)));
        assert_eq!(lattice.cell_of(Coord { x: 10.0, y: 0.0 }), None);
        assert_eq!(lattice.cell_of(Coord { x: -11.0, y: 0.0 }), None);
    }

    #[test]
    fn test_window_clamps_to_lattice() {
        let lattice = lattice();
        let bbox = Bbox::new(-12.0, -7.5, 3.0, 10.0).unwrap();
        let window = lattice.window(&bbox).unwrap();

        assert_eq!(
            window,
            Window {
                col_off: 0,
                row_off: 0,
                cols: 3,
                rows: 2
            }
        );

        let subset = lattice.subset(&window);
        assert_eq!(subset.origin_x, -10.0);
        assert_eq!(subset.shape(), (2, 3));

        let outside = Bbox::new(50.0, 60.0, 0.0, 1.0).unwrap();
        assert!(lattice.window(&outside).is_none());
    }

    #[test]
    fn test_matches_tolerates_rounding() {
        let mut other = lattice();
        other.origin_x += 1e-12;
        assert!(lattice().matches(&other));

        other.cols += 1;
        assert!(!lattice().matches(&other));
    }
}
