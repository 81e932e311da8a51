//! Affine georeferencing of raster grids
//!
//! Coefficients are kept in GDAL order: a pixel at column `c` and row `r`
//! has its upper-left corner at
//! `x = origin_x + c * pixel_width + r * row_rotation` and
//! `y = origin_y + c * col_rotation + r * pixel_height`.

use crate::coordinate::{BoundingBox, Point};

/// Affine transform from pixel space to map space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    /// Negative for north-up rasters
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform without rotation
    pub fn new(origin_x: f64, pixel_width: f64, origin_y: f64, pixel_height: f64) -> Self {
        GeoTransform {
            origin_x,
            pixel_width,
            row_rotation: 0.0,
            origin_y,
            col_rotation: 0.0,
            pixel_height,
        }
    }

    pub fn from_gdal(gt: [f64; 6]) -> Self {
        GeoTransform {
            origin_x: gt[0],
            pixel_width: gt[1],
            row_rotation: gt[2],
            origin_y: gt[3],
            col_rotation: gt[4],
            pixel_height: gt[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [self.origin_x, self.pixel_width, self.row_rotation,
         self.origin_y, self.col_rotation, self.pixel_height]
    }

    pub fn is_north_up(&self) -> bool {
        self.row_rotation == 0.0 && self.col_rotation == 0.0
    }

    /// Absolute pixel size `(x, y)` for north-up grids
    pub fn resolution(&self) -> (f64, f64) {
        (self.pixel_width.abs(), self.pixel_height.abs())
    }

    /// Map coordinates of the fractional pixel position `(col, row)`
    pub fn pixel_to_geo(&self, col: f64, row: f64) -> Point {
        Point::new(
            self.origin_x + col * self.pixel_width + row * self.row_rotation,
            self.origin_y + col * self.col_rotation + row * self.pixel_height,
        )
    }

    /// Fractional `(row, col)` of a map coordinate, `None` for a degenerate transform
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation;
        if det == 0.0 || !det.is_finite() {
            return None;
        }

        let dx = x - self.origin_x;
        let dy = y - self.origin_y;
        let col = (self.pixel_height * dx - self.row_rotation * dy) / det;
        let row = (self.pixel_width * dy - self.col_rotation * dx) / det;
        Some((row, col))
    }

    /// Integer `(row, col)` of the pixel containing a map coordinate
    ///
    /// The fractional position is floored, so coordinates left of or above
    /// the origin give negative indices.
    pub fn rowcol(&self, x: f64, y: f64) -> Option<(i64, i64)> {
        let (row, col) = self.geo_to_pixel(x, y)?;
        if !row.is_finite() || !col.is_finite() {
            return None;
        }
        Some((row.floor() as i64, col.floor() as i64))
    }

    /// Transform whose origin is moved to pixel `(row, col)`
    pub fn shifted(&self, row: i64, col: i64) -> GeoTransform {
        let origin = self.pixel_to_geo(col as f64, row as f64);
        GeoTransform {
            origin_x: origin.x,
            origin_y: origin.y,
            ..*self
        }
    }

    /// Map-space extent of a `rows` x `cols` grid
    pub fn array_bounds(&self, rows: usize, cols: usize) -> BoundingBox {
        let corners = [
            self.pixel_to_geo(0.0, 0.0),
            self.pixel_to_geo(cols as f64, 0.0),
            self.pixel_to_geo(cols as f64, rows as f64),
            self.pixel_to_geo(0.0, rows as f64),
        ];
        // Four corners always produce a box
        BoundingBox::from_points(&corners).unwrap_or(BoundingBox::new(
            self.origin_x, self.origin_y, self.origin_x, self.origin_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rowcol_floors() {
        let gt = GeoTransform::new(10.0, 0.5, 50.0, -0.5);
        assert_eq!(gt.rowcol(10.0, 50.0), Some((0, 0)));
        assert_eq!(gt.rowcol(10.49, 49.51), Some((0, 0)));
        assert_eq!(gt.rowcol(10.5, 49.5), Some((1, 1)));
        assert_eq!(gt.rowcol(9.9, 50.1), Some((-1, -1)));
    }

    #[test]
    fn test_rotated_inverse() {
        let gt = GeoTransform::from_gdal([100.0, 2.0, 0.5, 200.0, 0.25, -2.0]);
        let p = gt.pixel_to_geo(3.25, 7.5);
        let (row, col) = gt.geo_to_pixel(p.x, p.y).unwrap();
        assert_relative_eq!(row, 7.5, epsilon = 1e-9);
        assert_relative_eq!(col, 3.25, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate() {
        let gt = GeoTransform::new(0.0, 0.0, 0.0, -1.0);
        assert!(gt.rowcol(1.0, 1.0).is_none());
    }

    #[test]
    fn test_shift_and_bounds() {
        let gt = GeoTransform::new(10.0, 0.5, 50.0, -0.5);
        let shifted = gt.shifted(2, 4);
        assert_eq!(shifted.origin_x, 12.0);
        assert_eq!(shifted.origin_y, 49.0);

        let bounds = gt.array_bounds(4, 6);
        assert_eq!(bounds, BoundingBox::new(10.0, 48.0, 13.0, 50.0));
    }
}
