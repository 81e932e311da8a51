//! Chip export
//!
//! Writes one file per chip, either as a NumPy `.npy` array or as a
//! float64 GeoTIFF carrying the chip's own georeferencing, plus a
//! `manifest.csv` listing every chip.

use log::{info, warn};
use ndarray::Array3;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::chip::Chip;
use crate::errors::{ChipError, ChipResult};
use crate::raster::SampleType;
use crate::tiff::writer::GeoTiffWriter;

/// File format of exported chips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChipFormat {
    #[default]
    Npy,
    GeoTiff,
}

impl ChipFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ChipFormat::Npy => "npy",
            ChipFormat::GeoTiff => "tif",
        }
    }
}

impl FromStr for ChipFormat {
    type Err = ChipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "npy" => Ok(ChipFormat::Npy),
            "tif" | "tiff" | "geotiff" => Ok(ChipFormat::GeoTiff),
            other => Err(ChipError::Config(format!("Unsupported chip format '{}', expected npy or tif", other))),
        }
    }
}

impl fmt::Display for ChipFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Writes chips into an output directory
pub struct ChipWriter {
    output_dir: PathBuf,
    format: ChipFormat,
}

impl ChipWriter {
    pub fn new<P: AsRef<Path>>(output_dir: P, format: ChipFormat) -> Self {
        ChipWriter {
            output_dir: output_dir.as_ref().to_path_buf(),
            format,
        }
    }

    /// File name of a chip, unique per point and year
    pub fn file_name(&self, chip: &Chip) -> String {
        format!("chip_{}_{}.{}", chip.point_index, chip.year, self.format.extension())
    }

    /// Writes every chip and the manifest, returning the manifest path
    pub fn write_all(&self, chips: &[Chip]) -> ChipResult<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        info!("Writing {} chips as {} to {}", chips.len(), self.format, self.output_dir.display());

        let manifest_path = self.output_dir.join("manifest.csv");
        let mut manifest = BufWriter::new(File::create(&manifest_path)?);
        writeln!(manifest, "index,point_index,year,lon,lat,bands,rows,cols,file")?;

        for (index, chip) in chips.iter().enumerate() {
            let name = self.file_name(chip);
            let written = match self.format {
                ChipFormat::Npy => {
                    write_npy(&self.output_dir.join(&name), &chip.data)?;
                    true
                },
                ChipFormat::GeoTiff if chip.data.is_empty() => {
                    warn!("Chip {} is empty, no GeoTIFF written", index);
                    false
                },
                ChipFormat::GeoTiff => {
                    GeoTiffWriter::new(SampleType::F64)
                        .write(&self.output_dir.join(&name), &chip.data, chip.transform.to_gdal(), None)?;
                    true
                },
            };

            let (bands, rows, cols) = chip.shape();
            writeln!(manifest, "{},{},{},{},{},{},{},{},{}",
                     index, chip.point_index, chip.year, chip.point.lon(), chip.point.lat(),
                     bands, rows, cols, if written { name.as_str() } else { "" })?;
        }

        manifest.flush()?;
        Ok(manifest_path)
    }
}

/// Builds the NPY v1.0 header for a C-order little-endian float64 array
///
/// The header is padded with spaces so that magic, version, length field
/// and header together are a multiple of 64 bytes.
pub fn npy_header(shape: (usize, usize, usize)) -> Vec<u8> {
    let dict = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({}, {}, {}), }}",
        shape.0, shape.1, shape.2
    );

    // magic (6) + version (2) + header length (2) + dict + newline
    let unpadded = 10 + dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    let header = format!("{}{}\n", dict, " ".repeat(padding));

    let mut bytes = Vec::with_capacity(10 + header.len());
    bytes.extend_from_slice(b"\x93NUMPY");
    bytes.extend_from_slice(&[0x01, 0x00]);
    bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    bytes
}

/// Saves an array as a NumPy NPY file
pub fn write_npy(path: &Path, data: &Array3<f64>) -> ChipResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&npy_header(data.dim()))?;

    // Logical iteration order is C order regardless of memory layout
    for value in data.iter() {
        writer.write_all(&value.to_le_bytes())?;
    }

    writer.flush()?;
    Ok(())
}
