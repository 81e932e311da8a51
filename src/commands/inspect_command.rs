//! Raster directory inspection command
//!
//! Lists the tiles a directory holds and the zoom level they share,
//! without loading any of them.

use clap::ArgMatches;
use log::info;
use std::path::PathBuf;

use crate::commands::command_traits::Command;
use crate::coordinate::{TilingScheme, WebMercatorTiling};
use crate::errors::{ChipError, ChipResult};
use crate::extractor::TileInventory;

pub struct InspectCommand {
    raster_dir: PathBuf,
}

impl InspectCommand {
    pub fn new(args: &ArgMatches) -> ChipResult<Self> {
        let raster_dir = args.get_one::<String>("raster_dir")
            .ok_or_else(|| ChipError::Config("Missing raster directory".to_string()))?;

        Ok(InspectCommand { raster_dir: PathBuf::from(raster_dir) })
    }

    /// Renders the inventory listing printed by `execute`
    pub fn report(&self) -> ChipResult<String> {
        let inventory = TileInventory::scan(&self.raster_dir)?;
        let tiling = WebMercatorTiling;

        let mut report = format!("Raster directory: {}\n", self.raster_dir.display());
        report.push_str(&format!("  Zoom: {}\n", inventory.zoom()));
        report.push_str(&format!("  Tiles: {}\n", inventory.len()));

        for tile in inventory.tile_ids() {
            let bounds = tiling.bounds(tile);
            report.push_str(&format!("    {} [{:.6}, {:.6}, {:.6}, {:.6}]\n",
                                     tile, bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y));
        }

        Ok(report)
    }
}

impl Command for InspectCommand {
    fn execute(&self) -> ChipResult<()> {
        info!("Inspecting raster directory {}", self.raster_dir.display());
        print!("{}", self.report()?);
        Ok(())
    }
}
