//! Georeferenced rasters
//!
//! In-memory rasters with their affine transform, GeoTIFF decoding into
//! them, and mosaicking of adjacent tiles.

mod georaster;
mod layout;
mod strip_reader;
mod tile_reader;
pub mod mosaic;
pub mod provider;
pub mod sample;
pub mod transform;

pub use georaster::Raster;
pub use mosaic::merge;
pub use provider::{GeoTiffProvider, RasterProvider};
pub use sample::SampleType;
pub use transform::GeoTransform;
