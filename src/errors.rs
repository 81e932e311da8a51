//! Error types for chip extraction
//!
//! `ChipError` is what every public operation of the crate returns. The
//! TIFF layer keeps its own `TiffError`; converting it never hides an
//! underlying I/O error, which is surfaced as `ChipError::Io` unchanged.

use std::collections::BTreeSet;
use std::fmt;
use std::io;

use crate::coordinate::TileId;
use crate::tiff::errors::TiffError;

/// Chip extraction error types
#[derive(Debug)]
pub enum ChipError {
    /// I/O error while reading points or rasters, or writing chips
    Io(io::Error),
    /// Inputs violate a precondition (empty/malformed raster directory,
    /// unparseable tile name, no points, invalid parameters)
    Precondition(String),
    /// Tiles needed to cover the buffered points differ from the tiles on disk
    TileAvailability {
        /// Tiles derived from the buffered bounding box
        required: BTreeSet<TileId>,
        /// Tiles found in the raster directory
        available: BTreeSet<TileId>,
    },
    /// A chip window leaves the mosaic under the `reject` edge policy
    ChipOutOfBounds {
        /// Index of the point in input order
        point_index: usize,
        /// Observation year (0-based)
        year: usize,
    },
    /// Raster decoding or mosaicking failure
    Raster(String),
    /// Point-feature decoding failure
    Vector(String),
    /// Invalid configuration file or option value
    Config(String),
}

/// Formats a tile set as `{x_y_z, ...}`
fn format_tile_set(tiles: &BTreeSet<TileId>) -> String {
    let names: Vec<String> = tiles.iter().map(|t| t.to_string()).collect();
    format!("{{{}}}", names.join(", "))
}

impl fmt::Display for ChipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChipError::Io(e) => write!(f, "I/O error: {}", e),
            ChipError::Precondition(msg) => write!(f, "Precondition failed: {}", msg),
            ChipError::TileAvailability { required, available } => write!(
                f,
                "Tile set mismatch: expecting {} in raster directory, found {}",
                format_tile_set(required),
                format_tile_set(available)
            ),
            ChipError::ChipOutOfBounds { point_index, year } => write!(
                f,
                "Chip window for point {} (year {}) extends beyond the mosaic",
                point_index, year
            ),
            ChipError::Raster(msg) => write!(f, "Raster error: {}", msg),
            ChipError::Vector(msg) => write!(f, "Vector error: {}", msg),
            ChipError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ChipError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChipError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ChipError {
    fn from(error: io::Error) -> Self {
        ChipError::Io(error)
    }
}

impl From<TiffError> for ChipError {
    fn from(error: TiffError) -> Self {
        match error {
            TiffError::IoError(e) => ChipError::Io(e),
            other => ChipError::Raster(other.to_string()),
        }
    }
}

impl From<geojson::Error> for ChipError {
    fn from(error: geojson::Error) -> Self {
        ChipError::Vector(error.to_string())
    }
}

impl From<toml::de::Error> for ChipError {
    fn from(error: toml::de::Error) -> Self {
        ChipError::Config(error.to_string())
    }
}

/// Result type for chip extraction operations
pub type ChipResult<T> = Result<T, ChipError>;
