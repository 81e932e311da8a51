//! Pixel layout of a TIFF image
//!
//! Collects everything a chunk decoder needs from the IFD: dimensions,
//! sample type, planar configuration, predictor and compression.

use log::debug;
use std::io::SeekFrom;

use super::sample::SampleType;
use crate::compression::{CompressionFactory, CompressionHandler};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{compression, planar, predictor, sample_format, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;

/// Decoding parameters of one image
pub struct PixelLayout {
    pub width: usize,
    pub height: usize,
    pub bands: usize,
    pub sample_type: SampleType,
    pub planar_configuration: u16,
    pub predictor: u16,
    pub compression: Box<dyn CompressionHandler>,
}

impl PixelLayout {
    pub fn from_ifd(reader: &mut dyn SeekableReader, tiff_reader: &TiffReader, ifd: &IFD) -> TiffResult<Self> {
        let (width, height) = ifd.get_dimensions().ok_or(TiffError::MissingDimensions)?;
        if width == 0 || height == 0 {
            return Err(TiffError::MissingDimensions);
        }
        let bands = ifd.get_samples_per_pixel() as usize;

        let bits = Self::uniform_value(reader, tiff_reader, ifd, tags::BITS_PER_SAMPLE, 1)?;
        let format = Self::uniform_value(reader, tiff_reader, ifd, tags::SAMPLE_FORMAT, sample_format::UINT as u64)?;
        let sample_type = SampleType::from_tags(bits as u16, format as u16)?;

        let planar_configuration = ifd.get_tag_value(tags::PLANAR_CONFIGURATION)
            .unwrap_or(planar::CHUNKY as u64) as u16;
        if planar_configuration != planar::CHUNKY && planar_configuration != planar::SEPARATE {
            return Err(TiffError::UnsupportedLayout(format!(
                "planar configuration {}", planar_configuration)));
        }

        let predictor = ifd.get_tag_value(tags::PREDICTOR).unwrap_or(predictor::NONE as u64) as u16;
        let compression = CompressionFactory::create_handler(
            ifd.get_tag_value(tags::COMPRESSION).unwrap_or(compression::NONE as u64))?;

        debug!("Layout {}x{}x{} {:?}, planar {}, predictor {}, {}",
               bands, height, width, sample_type, planar_configuration, predictor, compression.name());

        Ok(PixelLayout {
            width: width as usize,
            height: height as usize,
            bands,
            sample_type,
            planar_configuration,
            predictor,
            compression,
        })
    }

    /// Reads a per-sample tag that must hold the same value for every band
    fn uniform_value(
        reader: &mut dyn SeekableReader,
        tiff_reader: &TiffReader,
        ifd: &IFD,
        tag: u16,
        default: u64
    ) -> TiffResult<u64> {
        if !ifd.has_tag(tag) {
            return Ok(default);
        }

        let values = tiff_reader.read_tag_values(reader, ifd, tag)?;
        let first = *values.first().ok_or(TiffError::TagNotFound(tag))?;
        if values.iter().any(|v| *v != first) {
            return Err(TiffError::UnsupportedLayout(format!(
                "tag {} differs between bands: {:?}", tag, values)));
        }
        Ok(first)
    }

    pub fn is_separate(&self) -> bool {
        self.planar_configuration == planar::SEPARATE
    }

    /// Number of sample planes stored one after another
    pub fn planes(&self) -> usize {
        if self.is_separate() { self.bands } else { 1 }
    }

    /// Number of samples interleaved per pixel within a chunk
    pub fn channels(&self) -> usize {
        if self.is_separate() { 1 } else { self.bands }
    }

    /// Reads and decompresses the chunk at `offset`
    pub fn read_chunk(&self, reader: &mut dyn SeekableReader, offset: u64, byte_count: u64) -> TiffResult<Vec<u8>> {
        reader.seek(SeekFrom::Start(offset))?;
        let mut compressed = vec![0u8; byte_count as usize];
        reader.read_exact(&mut compressed)?;
        self.compression.decompress(&compressed)
    }
}
