//! Chip extraction
//!
//! The pipeline runs strictly in sequence and produces either every chip
//! or an error, never a partial result:
//!
//! 1. read the points and buffer each into a square in degree space
//! 2. enclose all buffer vertices in one bounding box
//! 3. scan the raster directory and resolve the tiles under the box corners
//! 4. require the two tile sets to be equal
//! 5. merge the tiles into a mosaic
//! 6. map each point to its mosaic pixel and cut one window per year

use log::{debug, info};
use ndarray::Array3;
use std::collections::BTreeSet;
use std::path::Path;

use super::chip::{Chip, ChipWindow};
use super::inventory::TileInventory;
use super::options::ExtractionOptions;
use crate::coordinate::{BoundingBox, Point, TileId, TilingScheme, WebMercatorTiling};
use crate::errors::{ChipError, ChipResult};
use crate::raster::{merge, GeoTiffProvider, Raster, RasterProvider};
use crate::utils::coordinate_utils::meters_to_degrees;
use crate::utils::progress::ProgressTracker;
use crate::vector::PointSource;

/// Extracts chips around points from a directory of raster tiles
pub struct ChipExtractor<P = GeoTiffProvider, T = WebMercatorTiling> {
    options: ExtractionOptions,
    provider: P,
    tiling: T,
}

impl ChipExtractor {
    /// Extractor reading GeoTIFF tiles named after Web Mercator tiles
    pub fn new(options: ExtractionOptions) -> Self {
        ChipExtractor::with_collaborators(options, GeoTiffProvider, WebMercatorTiling)
    }
}

impl<P: RasterProvider, T: TilingScheme> ChipExtractor<P, T> {
    pub fn with_collaborators(options: ExtractionOptions, provider: P, tiling: T) -> Self {
        ChipExtractor { options, provider, tiling }
    }

    pub fn options(&self) -> &ExtractionOptions {
        &self.options
    }

    /// Runs the full extraction
    ///
    /// Chips are ordered point-major, year-minor: every year of point 0,
    /// then every year of point 1, and so on.
    pub fn extract<S>(&self, points: &S, raster_dir: &Path) -> ChipResult<Vec<Chip>>
    where
        S: PointSource + ?Sized,
    {
        self.options.validate()?;

        let points = points.read_points()?;
        if points.is_empty() {
            return Err(ChipError::Precondition("No points to extract chips for".to_string()));
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(ChipError::Precondition(format!(
                "Point {} has non-finite coordinates {}", index, points[index])));
        }
        info!("Extracting chips for {} points over {} years", points.len(), self.options.observation_years);

        let bbox = self.buffered_bbox(&points);
        debug!("Buffered bounding box: {:?}", bbox);

        let inventory = TileInventory::scan(raster_dir)?;
        let zoom = self.resolve_zoom(&inventory)?;

        let required = self.required_tiles(&bbox, zoom);
        let available = inventory.tile_ids();
        if required != available {
            return Err(ChipError::TileAvailability { required, available });
        }

        let mosaic = self.build_mosaic(&inventory, &required)?;
        self.slice_chips(&mosaic, &points)
    }

    /// Like `extract`, keeping only the sample arrays
    pub fn extract_arrays<S>(&self, points: &S, raster_dir: &Path) -> ChipResult<Vec<Array3<f64>>>
    where
        S: PointSource + ?Sized,
    {
        Ok(self.extract(points, raster_dir)?.into_iter().map(|chip| chip.data).collect())
    }

    /// Half-width in degrees of the square buffered around a point
    pub fn buffer_half_width(&self, point: &Point) -> f64 {
        let meters = self.options.pixel_size_meters * self.options.chip_size as f64 + 1.0;
        meters_to_degrees(meters, point.lat())
    }

    /// Bounding box of the buffers of all points; `points` must not be empty
    pub fn buffered_bbox(&self, points: &[Point]) -> BoundingBox {
        let vertices: Vec<Point> = points.iter()
            .flat_map(|p| BoundingBox::from_point_buffer(p, self.buffer_half_width(p)).corners())
            .collect();
        BoundingBox::from_points(&vertices).unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0))
    }

    /// Tiles under the four corners of `bbox`
    pub fn required_tiles(&self, bbox: &BoundingBox, zoom: u8) -> BTreeSet<TileId> {
        bbox.corners()
            .iter()
            .map(|corner| self.tiling.tile(corner.lon(), corner.lat(), zoom))
            .collect()
    }

    fn resolve_zoom(&self, inventory: &TileInventory) -> ChipResult<u8> {
        match self.options.zoom {
            Some(zoom) if zoom != inventory.zoom() => Err(ChipError::Precondition(format!(
                "Expected tiles at zoom {}, raster directory holds zoom {}", zoom, inventory.zoom()))),
            _ => Ok(inventory.zoom()),
        }
    }

    /// Loads `tiles` in ascending order and merges them
    fn build_mosaic(&self, inventory: &TileInventory, tiles: &BTreeSet<TileId>) -> ChipResult<Raster> {
        let progress = ProgressTracker::new(tiles.len() as u64, "Loading tiles", self.options.show_progress);

        let mut rasters = Vec::with_capacity(tiles.len());
        for tile in tiles {
            let path = inventory.path(tile)
                .ok_or_else(|| ChipError::Precondition(format!("Tile {} is not in the inventory", tile)))?;
            rasters.push(self.provider.load(path)?);
            progress.increment(1);
        }
        progress.finish();

        merge(&rasters)
    }

    /// Cuts one chip per point and year out of `mosaic`
    pub fn slice_chips(&self, mosaic: &Raster, points: &[Point]) -> ChipResult<Vec<Chip>> {
        let options = &self.options;
        let total = points.len() * options.observation_years;
        let progress = ProgressTracker::new(total as u64, "Slicing chips", options.show_progress);

        let mut chips = Vec::with_capacity(total);
        for (point_index, point) in points.iter().enumerate() {
            let (row, col) = mosaic.transform.rowcol(point.lon(), point.lat())
                .ok_or_else(|| ChipError::Raster("Mosaic transform is not invertible".to_string()))?;
            debug!("Point {} {} -> pixel ({}, {})", point_index, point, row, col);

            for year in 0..options.observation_years {
                let window = ChipWindow::around(row, col, options.chip_size, year, options.bands_per_year);
                let (data, (first_row, first_col)) = window
                    .cut(&mosaic.data, options.edge_policy, options.pad_value)
                    .ok_or(ChipError::ChipOutOfBounds { point_index, year })?;

                chips.push(Chip {
                    point_index,
                    year,
                    point: *point,
                    data,
                    transform: mosaic.transform.shifted(first_row, first_col),
                });
                progress.increment(1);
            }
        }
        progress.finish();

        info!("Extracted {} chips", chips.len());
        Ok(chips)
    }
}
