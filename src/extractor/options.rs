//! Extraction parameters
//!
//! `ExtractionOptions` can be built in code or loaded from a TOML file:
//!
//! ```toml
//! chip_size = 2
//! pixel_size_meters = 10.0
//! observation_years = 2
//! bands_per_year = 4
//! edge_policy = "pad"
//! pad_value = -9999.0
//! ```

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::errors::{ChipError, ChipResult};

/// What to do with a chip window that leaves the mosaic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgePolicy {
    /// Clamp the window to the mosaic, yielding a smaller or empty chip
    #[default]
    Truncate,
    /// Keep the full chip shape, filling cells outside the mosaic
    Pad,
    /// Fail the whole extraction
    Reject,
}

impl FromStr for EdgePolicy {
    type Err = ChipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "truncate" => Ok(EdgePolicy::Truncate),
            "pad" => Ok(EdgePolicy::Pad),
            "reject" => Ok(EdgePolicy::Reject),
            other => Err(ChipError::Config(format!(
                "Unknown edge policy '{}', expected truncate, pad or reject", other))),
        }
    }
}

impl fmt::Display for EdgePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EdgePolicy::Truncate => "truncate",
            EdgePolicy::Pad => "pad",
            EdgePolicy::Reject => "reject",
        };
        write!(f, "{}", name)
    }
}

fn default_pad_value() -> f64 {
    f64::NAN
}

/// Parameters of one extraction run
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractionOptions {
    /// Half-width of a chip in pixels; chips are `2 * chip_size + 1` square
    pub chip_size: usize,
    /// Ground sample distance of the rasters
    pub pixel_size_meters: f64,
    pub observation_years: usize,
    pub bands_per_year: usize,
    /// Zoom level the raster directory must be at
    #[serde(default)]
    pub zoom: Option<u8>,
    #[serde(default)]
    pub edge_policy: EdgePolicy,
    /// Fill value for the `pad` edge policy
    #[serde(default = "default_pad_value")]
    pub pad_value: f64,
    #[serde(default)]
    pub show_progress: bool,
}

impl ExtractionOptions {
    pub fn new(chip_size: usize, pixel_size_meters: f64, observation_years: usize, bands_per_year: usize) -> Self {
        ExtractionOptions {
            chip_size,
            pixel_size_meters,
            observation_years,
            bands_per_year,
            zoom: None,
            edge_policy: EdgePolicy::default(),
            pad_value: default_pad_value(),
            show_progress: false,
        }
    }

    pub fn with_edge_policy(mut self, edge_policy: EdgePolicy) -> Self {
        self.edge_policy = edge_policy;
        self
    }

    pub fn with_pad_value(mut self, pad_value: f64) -> Self {
        self.pad_value = pad_value;
        self
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = Some(zoom);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn from_toml_str(text: &str) -> ChipResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Loads options from a TOML file; a missing file is an I/O error
    pub fn from_toml_file(path: &Path) -> ChipResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Side length of a full chip in pixels
    pub fn window_size(&self) -> usize {
        2 * self.chip_size + 1
    }

    /// Checks the parameters the extraction cannot run without
    pub fn validate(&self) -> ChipResult<()> {
        if !self.pixel_size_meters.is_finite() || self.pixel_size_meters < 0.0 {
            return Err(ChipError::Precondition(format!(
                "pixel size must be a finite, non-negative number of meters, got {}", self.pixel_size_meters)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_defaults() {
        let options = ExtractionOptions::from_toml_str(
            "chip_size = 2\npixel_size_meters = 10.0\nobservation_years = 2\nbands_per_year = 4\n").unwrap();

        assert_eq!(options.chip_size, 2);
        assert_eq!(options.window_size(), 5);
        assert_eq!(options.edge_policy, EdgePolicy::Truncate);
        assert!(options.pad_value.is_nan());
        assert_eq!(options.zoom, None);
        assert!(!options.show_progress);
    }

    #[test]
    fn test_toml_policy_and_zoom() {
        let options = ExtractionOptions::from_toml_str(r#"
            chip_size = 1
            pixel_size_meters = 30.0
            observation_years = 1
            bands_per_year = 6
            zoom = 12
            edge_policy = "reject"
        "#).unwrap();

        assert_eq!(options.edge_policy, EdgePolicy::Reject);
        assert_eq!(options.zoom, Some(12));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        assert!(matches!(ExtractionOptions::from_toml_str("chip_size = 'x'"), Err(ChipError::Config(_))));
        let unknown_policy = "chip_size = 1\npixel_size_meters = 1.0\nobservation_years = 1\nbands_per_year = 1\nedge_policy = \"wrap\"\n";
        assert!(matches!(ExtractionOptions::from_toml_str(unknown_policy), Err(ChipError::Config(_))));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("PAD".parse::<EdgePolicy>().unwrap(), EdgePolicy::Pad);
        assert!("clamp".parse::<EdgePolicy>().is_err());
        assert_eq!(EdgePolicy::Reject.to_string(), "reject");
    }

    #[test]
    fn test_validate_pixel_size() {
        assert!(ExtractionOptions::new(2, 10.0, 1, 1).validate().is_ok());
        assert!(ExtractionOptions::new(2, -1.0, 1, 1).validate().is_err());
        assert!(ExtractionOptions::new(2, f64::NAN, 1, 1).validate().is_err());
    }
}
