//! CLI command implementations
//!
//! Commands follow the Command pattern; `ChipkitCommandFactory` decides
//! which one the parsed arguments ask for.

pub mod command_traits;
pub mod extract_command;
pub mod inspect_command;

pub use command_traits::{Command, CommandFactory};
pub use extract_command::ExtractCommand;
pub use inspect_command::InspectCommand;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command as ClapCommand};

use crate::errors::ChipResult;

/// Builds the `chipkit` argument parser
pub fn build_cli() -> ClapCommand {
    ClapCommand::new("chipkit")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extract multi-year image chips around points from tiled GeoTIFF rasters")
        .arg(
            Arg::new("points")
                .help("GeoJSON file with the point locations")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("raster_dir")
                .help("Directory of tiles named {x}_{y}_{z}.tif")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("TOML file with extraction options")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("chip-size")
                .long("chip-size")
                .help("Chip half-width in pixels")
                .value_name("N")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("pixel-size")
                .long("pixel-size")
                .help("Raster pixel size in meters")
                .value_name("M")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("years")
                .long("years")
                .help("Number of observation years")
                .value_name("N")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("bands-per-year")
                .long("bands-per-year")
                .help("Bands per observation year")
                .value_name("N")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("zoom")
                .long("zoom")
                .help("Zoom level the tiles must be at")
                .value_name("Z")
                .value_parser(value_parser!(u8)),
        )
        .arg(
            Arg::new("edge-policy")
                .long("edge-policy")
                .help("Chips leaving the mosaic: truncate, pad or reject")
                .value_name("POLICY"),
        )
        .arg(
            Arg::new("pad-value")
                .long("pad-value")
                .help("Fill value for the pad edge policy")
                .value_name("V")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Directory to write chips and manifest.csv to")
                .value_name("DIR"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .help("Chip file format: npy or tif")
                .value_name("FORMAT")
                .default_value("npy"),
        )
        .arg(
            Arg::new("inspect")
                .long("inspect")
                .help("List the tiles in the raster directory and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("progress")
                .long("progress")
                .help("Show progress bars")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Also write log messages to this file")
                .value_name("FILE"),
        )
}

/// Factory for creating command instances based on CLI arguments
#[derive(Debug, Default)]
pub struct ChipkitCommandFactory;

impl ChipkitCommandFactory {
    pub fn new() -> Self {
        ChipkitCommandFactory
    }
}

impl CommandFactory for ChipkitCommandFactory {
    fn create_command(&self, args: &ArgMatches) -> ChipResult<Box<dyn Command>> {
        if args.get_flag("inspect") {
            Ok(Box::new(InspectCommand::new(args)?))
        } else {
            Ok(Box::new(ExtractCommand::new(args)?))
        }
    }
}
