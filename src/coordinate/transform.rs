//! Coordinate transformation functionality

use super::point::Point;
use std::f64::consts::PI;

/// Converts Web Mercator coordinates back to WGS84
pub struct CoordinateTransformer;

impl CoordinateTransformer {
    /// Earth radius in meters
    pub const EARTH_RADIUS: f64 = 6378137.0;

    /// Convert from Web Mercator (EPSG:3857) to WGS84 (EPSG:4326)
    pub fn web_mercator_to_wgs84(&self, x: f64, y: f64) -> Point {
        let lon = x * 180.0 / (Self::EARTH_RADIUS * PI);
        let lat = 180.0 / PI * (2.0 * f64::atan(f64::exp(y / Self::EARTH_RADIUS)) - PI / 2.0);

        Point::new(lon, lat)
    }

    /// Half the circumference of the Web Mercator square, in meters
    pub fn mercator_extent(&self) -> f64 {
        Self::EARTH_RADIUS * PI
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_origin_maps_to_origin() {
        let point = CoordinateTransformer.web_mercator_to_wgs84(0.0, 0.0);
        assert_relative_eq!(point.x, 0.0);
        assert_relative_eq!(point.y, 0.0);
    }

    #[test]
    fn test_world_corner() {
        let transformer = CoordinateTransformer;
        let extent = transformer.mercator_extent();
        let corner = transformer.web_mercator_to_wgs84(extent, extent);
        assert_relative_eq!(corner.x, 180.0, epsilon = 1e-9);
        assert_relative_eq!(corner.y, 85.051_128_779_806_59, epsilon = 1e-9);
    }
}
