//! In-memory georeferenced raster

use ndarray::Array3;

use super::transform::GeoTransform;
use crate::coordinate::BoundingBox;

/// Band-major `(bands, rows, cols)` pixel array with its georeferencing
#[derive(Debug, Clone)]
pub struct Raster {
    pub data: Array3<f64>,
    pub transform: GeoTransform,
    pub nodata: Option<f64>,
}

impl Raster {
    pub fn new(data: Array3<f64>, transform: GeoTransform, nodata: Option<f64>) -> Self {
        Raster { data, transform, nodata }
    }

    pub fn band_count(&self) -> usize {
        self.data.dim().0
    }

    pub fn height(&self) -> usize {
        self.data.dim().1
    }

    pub fn width(&self) -> usize {
        self.data.dim().2
    }

    pub fn bounds(&self) -> BoundingBox {
        self.transform.array_bounds(self.height(), self.width())
    }

    /// Whether a sample is missing: NaN, or equal to the nodata marker
    pub fn is_nodata(&self, value: f64) -> bool {
        value.is_nan() || self.nodata.is_some_and(|nodata| value == nodata)
    }
}
