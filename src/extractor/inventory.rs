//! Raster directory inventory
//!
//! Scans a directory of tiles named `{x}_{y}_{zoom}.tif` once, up front,
//! and records the zoom level together with the path of every tile.

use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::coordinate::TileId;
use crate::errors::{ChipError, ChipResult};

lazy_static! {
    static ref TILE_NAME: Regex =
        Regex::new(r"(?i)^(\d+)_(\d+)_(\d+)\.(tif|tiff)$").expect("tile name pattern is valid");
}

/// Tiles found in a raster directory, all at one zoom level
#[derive(Debug, Clone)]
pub struct TileInventory {
    zoom: u8,
    tiles: BTreeMap<TileId, PathBuf>,
}

impl TileInventory {
    /// Parses a tile file name such as `540_347_10.tif`
    pub fn parse_tile_name(name: &str) -> ChipResult<TileId> {
        let captures = TILE_NAME.captures(name).ok_or_else(|| ChipError::Precondition(format!(
            "'{}' does not follow the {{x}}_{{y}}_{{zoom}}.tif naming scheme", name)))?;

        let stem = format!("{}_{}_{}", &captures[1], &captures[2], &captures[3]);
        stem.parse::<TileId>().map_err(ChipError::Precondition)
    }

    /// Scans `dir`, failing if it is empty, holds a file that is not a
    /// tile, or mixes zoom levels
    pub fn scan(dir: &Path) -> ChipResult<Self> {
        if !dir.is_dir() {
            return Err(ChipError::Precondition(format!(
                "Raster directory {} does not exist", dir.display())));
        }

        let mut tiles = BTreeMap::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                debug!("Skipping non-file entry {}", path.display());
                continue;
            }

            let name = path.file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| ChipError::Precondition(format!(
                    "File name {} is not valid UTF-8", path.display())))?;
            let tile = Self::parse_tile_name(name)?;

            if let Some(previous) = tiles.insert(tile, path.clone()) {
                return Err(ChipError::Precondition(format!(
                    "Tile {} is stored twice: {} and {}", tile, previous.display(), path.display())));
            }
        }

        let zooms: BTreeSet<u8> = tiles.keys().map(|t| t.z).collect();
        let zoom = match zooms.len() {
            0 => return Err(ChipError::Precondition(format!(
                "Raster directory {} contains no tiles", dir.display()))),
            1 => zooms.iter().next().copied().unwrap_or_default(),
            _ => return Err(ChipError::Precondition(format!(
                "Raster directory {} mixes zoom levels {:?}", dir.display(), zooms))),
        };

        info!("Found {} tiles at zoom {} in {}", tiles.len(), zoom, dir.display());
        Ok(TileInventory { zoom, tiles })
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn tile_ids(&self) -> BTreeSet<TileId> {
        self.tiles.keys().copied().collect()
    }

    pub fn path(&self, tile: &TileId) -> Option<&Path> {
        self.tiles.get(tile).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
