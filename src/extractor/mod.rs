//! Chip extraction from tiled rasters
//!
//! Scans a raster directory, mosaics the tiles covering a set of points
//! and cuts a window per point and observation year.

mod chip;
mod chip_extractor;
mod chip_writer;
mod dataset;
mod inventory;
mod options;

pub use chip::{Chip, ChipWindow};
pub use chip_extractor::ChipExtractor;
pub use chip_writer::{npy_header, write_npy, ChipFormat, ChipWriter};
pub use dataset::ChipDataset;
pub use inventory::TileInventory;
pub use options::{EdgePolicy, ExtractionOptions};
