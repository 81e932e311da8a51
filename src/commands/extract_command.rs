//! Chip extraction command
//!
//! Resolves extraction options from an optional TOML file and CLI
//! overrides, runs the extraction and either prints a per-chip summary or
//! exports the chips.

use clap::ArgMatches;
use log::info;
use std::path::{Path, PathBuf};

use crate::commands::command_traits::Command;
use crate::errors::{ChipError, ChipResult};
use crate::extractor::{Chip, ChipExtractor, ChipFormat, ChipWriter, EdgePolicy, ExtractionOptions};
use crate::vector::GeoJsonPointSource;

/// Command extracting chips around the points of a GeoJSON file
pub struct ExtractCommand {
    points_file: PathBuf,
    raster_dir: PathBuf,
    options: ExtractionOptions,
    /// Export directory; chips are only summarized when absent
    output_dir: Option<PathBuf>,
    format: ChipFormat,
}

/// Looks up an argument that must be given when no config file is
fn required<T: Clone + Send + Sync + 'static>(args: &ArgMatches, id: &str) -> ChipResult<T> {
    args.get_one::<T>(id)
        .cloned()
        .ok_or_else(|| ChipError::Config(format!("--{} is required when no --config file is given", id)))
}

impl ExtractCommand {
    pub fn new(args: &ArgMatches) -> ChipResult<Self> {
        let points_file = args.get_one::<String>("points")
            .ok_or_else(|| ChipError::Config("Missing points file".to_string()))?;
        let raster_dir = args.get_one::<String>("raster_dir")
            .ok_or_else(|| ChipError::Config("Missing raster directory".to_string()))?;

        let options = Self::resolve_options(args)?;
        info!("Extraction options: {:?}", options);

        let format = match args.get_one::<String>("format") {
            Some(format) => format.parse()?,
            None => ChipFormat::default(),
        };

        Ok(ExtractCommand {
            points_file: PathBuf::from(points_file),
            raster_dir: PathBuf::from(raster_dir),
            options,
            output_dir: args.get_one::<String>("output").map(PathBuf::from),
            format,
        })
    }

    /// Loads the config file if any, then applies CLI overrides
    fn resolve_options(args: &ArgMatches) -> ChipResult<ExtractionOptions> {
        let mut options = match args.get_one::<String>("config") {
            Some(path) => {
                info!("Loading options from {}", path);
                ExtractionOptions::from_toml_file(Path::new(path))?
            },
            None => ExtractionOptions::new(
                required(args, "chip-size")?,
                required(args, "pixel-size")?,
                required(args, "years")?,
                required(args, "bands-per-year")?,
            ),
        };

        if let Some(chip_size) = args.get_one::<usize>("chip-size") {
            options.chip_size = *chip_size;
        }
        if let Some(pixel_size) = args.get_one::<f64>("pixel-size") {
            options.pixel_size_meters = *pixel_size;
        }
        if let Some(years) = args.get_one::<usize>("years") {
            options.observation_years = *years;
        }
        if let Some(bands) = args.get_one::<usize>("bands-per-year") {
            options.bands_per_year = *bands;
        }
        if let Some(zoom) = args.get_one::<u8>("zoom") {
            options.zoom = Some(*zoom);
        }
        if let Some(policy) = args.get_one::<String>("edge-policy") {
            options.edge_policy = policy.parse::<EdgePolicy>()?;
        }
        if let Some(pad_value) = args.get_one::<f64>("pad-value") {
            options.pad_value = *pad_value;
        }
        if args.get_flag("progress") {
            options.show_progress = true;
        }

        options.validate()?;
        Ok(options)
    }

    pub fn options(&self) -> &ExtractionOptions {
        &self.options
    }

    fn print_summary(&self, chips: &[Chip]) {
        println!("Extracted {} chips", chips.len());
        for chip in chips {
            let (bands, rows, cols) = chip.shape();
            println!("  point {} year {} ({:.6}, {:.6}): {}x{}x{}{}",
                     chip.point_index, chip.year, chip.point.lon(), chip.point.lat(),
                     bands, rows, cols,
                     if chip.is_complete(self.options.bands_per_year, self.options.chip_size) { "" } else { " (partial)" });
        }
    }
}

impl Command for ExtractCommand {
    fn execute(&self) -> ChipResult<()> {
        let source = GeoJsonPointSource::new(&self.points_file);
        let extractor = ChipExtractor::new(self.options.clone());
        let chips = extractor.extract(&source, &self.raster_dir)?;

        match &self.output_dir {
            Some(dir) => {
                let manifest = ChipWriter::new(dir, self.format).write_all(&chips)?;
                println!("Wrote {} chips, manifest at {}", chips.len(), manifest.display());
            },
            None => self.print_summary(&chips),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::build_cli;

    fn matches(extra: &[&str]) -> ArgMatches {
        let mut argv = vec!["chipkit", "points.geojson", "tiles"];
        argv.extend_from_slice(extra);
        build_cli().try_get_matches_from(argv).unwrap()
    }

    #[test]
    fn test_options_from_flags() {
        let args = matches(&["--chip-size", "2", "--pixel-size", "10", "--years", "2",
                             "--bands-per-year", "4", "--edge-policy", "pad", "--format", "tif"]);
        let command = ExtractCommand::new(&args).unwrap();

        assert_eq!(command.options().chip_size, 2);
        assert_eq!(command.options().edge_policy, EdgePolicy::Pad);
        assert_eq!(command.format, ChipFormat::GeoTiff);
        assert!(command.output_dir.is_none());
    }

    #[test]
    fn test_missing_core_flag_without_config() {
        let args = matches(&["--chip-size", "2", "--pixel-size", "10", "--years", "2"]);
        assert!(matches!(ExtractCommand::new(&args), Err(ChipError::Config(_))));
    }

    #[test]
    fn test_flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("chips.toml");
        std::fs::write(&config, "chip_size = 2\npixel_size_meters = 10.0\nobservation_years = 2\n\
                                 bands_per_year = 4\nedge_policy = \"reject\"\n").unwrap();

        let args = matches(&["--config", config.to_str().unwrap(), "--chip-size", "3", "--progress"]);
        let options = ExtractCommand::new(&args).unwrap().options;

        assert_eq!(options.chip_size, 3);
        assert_eq!(options.bands_per_year, 4);
        assert_eq!(options.edge_policy, EdgePolicy::Reject);
        assert!(options.show_progress);
    }

    #[test]
    fn test_invalid_edge_policy() {
        let args = matches(&["--chip-size", "2", "--pixel-size", "10", "--years", "2",
                             "--bands-per-year", "4", "--edge-policy", "wrap"]);
        assert!(matches!(ExtractCommand::new(&args), Err(ChipError::Config(_))));
    }
}
