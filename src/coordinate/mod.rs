//! Coordinate handling for geospatial data
//!
//! Points and bounding boxes in lon/lat, the WGS84/Web Mercator
//! transformer and the slippy-map tiling scheme used to name raster tiles.

mod bbox;
mod point;
mod tiling;
mod transform;

// Re-export key types
pub use self::bbox::BoundingBox;
pub use self::point::Point;
pub use self::tiling::{TileId, TilingScheme, WebMercatorTiling};
pub use self::transform::CoordinateTransformer;
