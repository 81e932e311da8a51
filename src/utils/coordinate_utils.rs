//! Coordinate utility functions
//!
//! Conversion between ground distances in meters and angular distances in
//! degrees. The spherical approximation matches what raster tiles were
//! cut with, so buffers derived here line up with the tile grid.

use std::f64::consts::PI;

/// Meters spanned by one degree of longitude at the equator
pub const METERS_PER_DEGREE_AT_EQUATOR: f64 = 111_320.0;

/// Calculate meters per degree of longitude at a given latitude
///
/// The length of a degree of longitude varies considerably with latitude,
/// being largest at the equator and approaching zero at the poles.
pub fn meters_per_longitude_degree(latitude: f64) -> f64 {
    let lat_rad = latitude * PI / 180.0;
    METERS_PER_DEGREE_AT_EQUATOR * f64::cos(lat_rad)
}

/// Convert a distance in meters to decimal degrees at a given latitude
///
/// # Arguments
/// * `meters` - Distance in meters
/// * `latitude` - Latitude in degrees
///
/// # Returns
/// The distance in degrees of longitude. There is no guard at the poles:
/// at +/-90 degrees the result is unbounded.
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    meters / meters_per_longitude_degree(latitude)
}
