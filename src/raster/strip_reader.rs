//! Strip-based image data decoding
//!
//! Stripped TIFFs organize image data in horizontal strips across the
//! entire width of the image. With separate planes, all strips of band 0
//! come first, then those of band 1, and so on.

use log::debug;
use ndarray::Array3;

use super::layout::PixelLayout;
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::tags;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;

/// Decodes the pixel data of stripped TIFF files
pub struct StripReader<'a, R: SeekableReader> {
    /// Reader for accessing the TIFF file
    reader: R,
    /// IFD containing the image metadata
    ifd: &'a IFD,
    /// TIFF reader for accessing tag values
    tiff_reader: &'a TiffReader,
    layout: &'a PixelLayout,
}

impl<'a, R: SeekableReader> StripReader<'a, R> {
    pub fn new(reader: R, ifd: &'a IFD, tiff_reader: &'a TiffReader, layout: &'a PixelLayout) -> Self {
        StripReader {
            reader,
            ifd,
            tiff_reader,
            layout,
        }
    }

    /// Rows per strip, defaulting to the whole image
    fn rows_per_strip(&self) -> usize {
        let height = self.layout.height as u64;
        self.ifd.get_tag_value(tags::ROWS_PER_STRIP)
            .unwrap_or(height)
            .clamp(1, height) as usize
    }

    /// Decodes every strip into `data`, shaped `(bands, height, width)`
    pub fn read_into(&mut self, data: &mut Array3<f64>) -> TiffResult<()> {
        let layout = self.layout;
        let rows_per_strip = self.rows_per_strip();
        let strips_per_plane = layout.height.div_ceil(rows_per_strip);
        let channels = layout.channels();

        let offsets = self.tiff_reader.read_tag_values(&mut self.reader, self.ifd, tags::STRIP_OFFSETS)?;
        let byte_counts = self.tiff_reader.read_tag_values(&mut self.reader, self.ifd, tags::STRIP_BYTE_COUNTS)?;

        let needed = strips_per_plane * layout.planes();
        if offsets.len() < needed || byte_counts.len() < needed {
            return Err(TiffError::GenericError(format!(
                "Found {} strip offsets and {} byte counts, expected {}",
                offsets.len(), byte_counts.len(), needed)));
        }
        debug!("Decoding {} strips of {} rows", needed, rows_per_strip);

        let handler = self.tiff_reader.handler()?;
        for plane in 0..layout.planes() {
            for strip in 0..strips_per_plane {
                let index = plane * strips_per_plane + strip;
                let first_row = strip * rows_per_strip;
                let rows = rows_per_strip.min(layout.height - first_row);

                let bytes = layout.read_chunk(&mut self.reader, offsets[index], byte_counts[index])?;
                let values = layout.sample_type.decode_chunk(
                    &bytes, handler, layout.width, rows, channels, layout.predictor)?;

                for r in 0..rows {
                    for c in 0..layout.width {
                        for ch in 0..channels {
                            let band = if layout.is_separate() { plane } else { ch };
                            data[[band, first_row + r, c]] = values[(r * layout.width + c) * channels + ch];
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
