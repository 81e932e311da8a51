pub mod io;
pub mod tiff;
pub mod utils;
pub mod compression;
pub mod coordinate;
pub mod raster;
pub mod vector;
pub mod extractor;
pub mod commands;
pub mod api;
pub mod errors;

pub use crate::api::ChipKit;
pub use crate::errors::{ChipError, ChipResult};

pub use coordinate::{BoundingBox, Point, TileId, TilingScheme, WebMercatorTiling};
pub use extractor::{Chip, ChipDataset, ChipExtractor, EdgePolicy, ExtractionOptions};
pub use raster::{GeoTransform, Raster};
pub use utils::coordinate_utils::meters_to_degrees;
