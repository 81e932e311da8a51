//! Tile-based image data decoding
//!
//! Tiled TIFFs store rectangular blocks in row-major tile order. Tiles on
//! the right and bottom edges are padded to full size; the padding is
//! discarded while copying.

use log::debug;
use ndarray::Array3;

use super::layout::PixelLayout;
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::tags;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;

/// Decodes the pixel data of tiled TIFF files
pub struct TileReader<'a, R: SeekableReader> {
    reader: R,
    ifd: &'a IFD,
    tiff_reader: &'a TiffReader,
    layout: &'a PixelLayout,
}

impl<'a, R: SeekableReader> TileReader<'a, R> {
    pub fn new(reader: R, ifd: &'a IFD, tiff_reader: &'a TiffReader, layout: &'a PixelLayout) -> Self {
        TileReader {
            reader,
            ifd,
            tiff_reader,
            layout,
        }
    }

    fn tile_size(&self) -> TiffResult<(usize, usize)> {
        let width = self.ifd.get_tag_value(tags::TILE_WIDTH).ok_or(TiffError::TagNotFound(tags::TILE_WIDTH))?;
        let height = self.ifd.get_tag_value(tags::TILE_LENGTH).ok_or(TiffError::TagNotFound(tags::TILE_LENGTH))?;
        if width == 0 || height == 0 {
            return Err(TiffError::UnsupportedLayout(format!("tile size {}x{}", width, height)));
        }
        Ok((width as usize, height as usize))
    }

    /// Decodes every tile into `data`, shaped `(bands, height, width)`
    pub fn read_into(&mut self, data: &mut Array3<f64>) -> TiffResult<()> {
        let layout = self.layout;
        let (tile_width, tile_height) = self.tile_size()?;
        let tiles_across = layout.width.div_ceil(tile_width);
        let tiles_down = layout.height.div_ceil(tile_height);
        let tiles_per_plane = tiles_across * tiles_down;
        let channels = layout.channels();

        let offsets = self.tiff_reader.read_tag_values(&mut self.reader, self.ifd, tags::TILE_OFFSETS)?;
        let byte_counts = self.tiff_reader.read_tag_values(&mut self.reader, self.ifd, tags::TILE_BYTE_COUNTS)?;

        let needed = tiles_per_plane * layout.planes();
        if offsets.len() < needed || byte_counts.len() < needed {
            return Err(TiffError::GenericError(format!(
                "Found {} tile offsets and {} byte counts, expected {}",
                offsets.len(), byte_counts.len(), needed)));
        }
        debug!("Decoding {} tiles of {}x{}", needed, tile_width, tile_height);

        let handler = self.tiff_reader.handler()?;
        for plane in 0..layout.planes() {
            for tile in 0..tiles_per_plane {
                let index = plane * tiles_per_plane + tile;
                let first_row = (tile / tiles_across) * tile_height;
                let first_col = (tile % tiles_across) * tile_width;
                let rows = tile_height.min(layout.height - first_row);
                let cols = tile_width.min(layout.width - first_col);

                let bytes = layout.read_chunk(&mut self.reader, offsets[index], byte_counts[index])?;
                let values = layout.sample_type.decode_chunk(
                    &bytes, handler, tile_width, tile_height, channels, layout.predictor)?;

                for r in 0..rows {
                    for c in 0..cols {
                        for ch in 0..channels {
                            let band = if layout.is_separate() { plane } else { ch };
                            data[[band, first_row + r, first_col + c]] = values[(r * tile_width + c) * channels + ch];
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
