use std::path::{Path, PathBuf};
use log::info;

use crate::coordinate::Point;
use crate::errors::ChipResult;
use crate::extractor::{Chip, ChipDataset, ChipExtractor, ChipFormat, ChipWriter, ExtractionOptions, TileInventory};
use crate::vector::GeoJsonPointSource;

/// Main interface to the ChipKit library
pub struct ChipKit {
    extractor: ChipExtractor,
}

impl ChipKit {
    /// Create a new ChipKit instance
    ///
    /// # Arguments
    /// * `options` - Chip size, pixel size, years and bands per year plus edge handling
    pub fn new(options: ExtractionOptions) -> Self {
        ChipKit { extractor: ChipExtractor::new(options) }
    }

    /// Create a ChipKit instance from a TOML options file
    pub fn from_config(path: &Path) -> ChipResult<Self> {
        Ok(Self::new(ExtractionOptions::from_toml_file(path)?))
    }

    pub fn options(&self) -> &ExtractionOptions {
        self.extractor.options()
    }

    /// Extract chips around the points of a GeoJSON file
    ///
    /// # Returns
    /// One chip per point and year, point-major
    pub fn extract(&self, points_file: &Path, raster_dir: &Path) -> ChipResult<Vec<Chip>> {
        info!("Extracting chips for {} from {}", points_file.display(), raster_dir.display());
        self.extractor.extract(&GeoJsonPointSource::new(points_file), raster_dir)
    }

    /// Extract chips around in-memory points
    pub fn extract_points(&self, points: &[Point], raster_dir: &Path) -> ChipResult<Vec<Chip>> {
        self.extractor.extract(points, raster_dir)
    }

    /// Extract chips and pair each with its point
    pub fn dataset(&self, points: &[Point], raster_dir: &Path) -> ChipResult<ChipDataset> {
        Ok(ChipDataset::from_chips(self.extract_points(points, raster_dir)?))
    }

    /// Write chips to a directory, returning the manifest path
    pub fn export(&self, chips: &[Chip], output_dir: &Path, format: ChipFormat) -> ChipResult<PathBuf> {
        ChipWriter::new(output_dir, format).write_all(chips)
    }

    /// Scan a raster directory without loading any tile
    pub fn inspect(&self, raster_dir: &Path) -> ChipResult<TileInventory> {
        TileInventory::scan(raster_dir)
    }
}
