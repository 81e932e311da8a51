//! Point features
//!
//! `PointSource` is the seam between chip extraction and vector I/O.

mod geojson_source;

pub use geojson_source::GeoJsonPointSource;

use crate::coordinate::Point;
use crate::errors::ChipResult;

/// Supplies the lon/lat points chips are cut around, in a stable order
pub trait PointSource {
    fn read_points(&self) -> ChipResult<Vec<Point>>;
}

impl PointSource for Vec<Point> {
    fn read_points(&self) -> ChipResult<Vec<Point>> {
        Ok(self.clone())
    }
}

impl PointSource for [Point] {
    fn read_points(&self) -> ChipResult<Vec<Point>> {
        Ok(self.to_vec())
    }
}
