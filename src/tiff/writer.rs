//! GeoTIFF writer
//!
//! Writes a band-major `(bands, rows, cols)` array as a little-endian
//! classic TIFF with EPSG:4326 georeferencing. The file is assembled in
//! memory in this order: header, image chunks, out-of-line tag values and
//! finally the single IFD, whose offset is patched into the header.

use log::{debug, info};
use ndarray::Array3;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::compression::{CompressionHandler, UncompressedHandler};
use crate::raster::sample::SampleType;
use crate::tiff::constants::{field_types, geokeys, header, photometric, planar, predictor, tags};
use crate::tiff::errors::{TiffError, TiffResult};

/// How image data is split into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkLayout {
    /// Horizontal strips of `rows_per_strip` rows
    Strips { rows_per_strip: usize },
    /// Rectangular tiles; TIFF requires both sides to be multiples of 16
    Tiles { width: usize, height: usize },
}

/// Value of a tag to be written
enum TagValue {
    Shorts(Vec<u16>),
    Longs(Vec<u32>),
    Doubles(Vec<f64>),
    Ascii(String),
}

impl TagValue {
    fn field_type(&self) -> u16 {
        match self {
            TagValue::Shorts(_) => field_types::SHORT,
            TagValue::Longs(_) => field_types::LONG,
            TagValue::Doubles(_) => field_types::DOUBLE,
            TagValue::Ascii(_) => field_types::ASCII,
        }
    }

    fn count(&self) -> u32 {
        match self {
            TagValue::Shorts(v) => v.len() as u32,
            TagValue::Longs(v) => v.len() as u32,
            TagValue::Doubles(v) => v.len() as u32,
            TagValue::Ascii(s) => s.len() as u32 + 1,
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        match self {
            TagValue::Shorts(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            TagValue::Longs(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            TagValue::Doubles(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            TagValue::Ascii(s) => {
                let mut bytes = s.as_bytes().to_vec();
                bytes.push(0);
                bytes
            }
        }
    }
}

/// Builder-style writer for single-image GeoTIFFs
pub struct GeoTiffWriter {
    sample_type: SampleType,
    compression: Box<dyn CompressionHandler>,
    layout: ChunkLayout,
    planar_configuration: u16,
    predictor: u16,
}

impl Default for GeoTiffWriter {
    fn default() -> Self {
        Self::new(SampleType::F64)
    }
}

impl GeoTiffWriter {
    /// Creates an uncompressed, chunky, single-strip writer
    pub fn new(sample_type: SampleType) -> Self {
        GeoTiffWriter {
            sample_type,
            compression: Box::new(UncompressedHandler),
            layout: ChunkLayout::Strips { rows_per_strip: usize::MAX },
            planar_configuration: planar::CHUNKY,
            predictor: predictor::NONE,
        }
    }

    pub fn with_compression(mut self, compression: Box<dyn CompressionHandler>) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_layout(mut self, layout: ChunkLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Stores one plane per band instead of interleaving samples
    pub fn with_separate_planes(mut self) -> Self {
        self.planar_configuration = planar::SEPARATE;
        self
    }

    pub fn with_horizontal_predictor(mut self) -> Self {
        self.predictor = predictor::HORIZONTAL_DIFFERENCING;
        self
    }

    /// Writes `data` to `path`
    pub fn write(
        &self,
        path: &Path,
        data: &Array3<f64>,
        geotransform: [f64; 6],
        nodata: Option<f64>
    ) -> TiffResult<()> {
        info!("Writing GeoTIFF to {}", path.display());
        let bytes = self.encode(data, geotransform, nodata)?;

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Encodes `data` into the bytes of a complete TIFF file
    pub fn encode(
        &self,
        data: &Array3<f64>,
        geotransform: [f64; 6],
        nodata: Option<f64>
    ) -> TiffResult<Vec<u8>> {
        let (bands, height, width) = data.dim();
        if bands == 0 || height == 0 || width == 0 {
            return Err(TiffError::MissingDimensions);
        }

        let mut buffer = Vec::new();
        buffer.extend_from_slice(&header::LITTLE_ENDIAN_MARKER);
        buffer.extend_from_slice(&header::TIFF_VERSION.to_le_bytes());
        buffer.extend_from_slice(&[0u8; 4]); // first IFD offset, patched below

        let chunks = self.build_chunks(data)?;
        let mut offsets = Vec::with_capacity(chunks.len());
        let mut byte_counts = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            offsets.push(Self::checked_u32(buffer.len())?);
            byte_counts.push(Self::checked_u32(chunk.len())?);
            buffer.extend_from_slice(chunk);
            Self::align(&mut buffer);
        }
        debug!("Wrote {} {} chunks", chunks.len(), self.compression.name());

        let entries = self.build_entries(bands, height, width, offsets, byte_counts, geotransform, nodata);

        // Out-of-line values go before the IFD so that their offsets are known
        let mut value_fields = Vec::with_capacity(entries.len());
        for (_, value) in &entries {
            let bytes = value.to_bytes();
            if bytes.len() <= 4 {
                let mut inline = [0u8; 4];
                inline[..bytes.len()].copy_from_slice(&bytes);
                value_fields.push(inline);
            } else {
                let offset = Self::checked_u32(buffer.len())?;
                buffer.extend_from_slice(&bytes);
                Self::align(&mut buffer);
                value_fields.push(offset.to_le_bytes());
            }
        }

        let ifd_offset = Self::checked_u32(buffer.len())?;
        buffer[4..8].copy_from_slice(&ifd_offset.to_le_bytes());

        buffer.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for ((tag, value), field) in entries.iter().zip(value_fields) {
            buffer.extend_from_slice(&tag.to_le_bytes());
            buffer.extend_from_slice(&value.field_type().to_le_bytes());
            buffer.extend_from_slice(&value.count().to_le_bytes());
            buffer.extend_from_slice(&field);
        }
        buffer.extend_from_slice(&[0u8; 4]); // no next IFD

        Ok(buffer)
    }

    /// Splits the array into encoded and compressed chunks, plane by plane
    fn build_chunks(&self, data: &Array3<f64>) -> TiffResult<Vec<Vec<u8>>> {
        let (bands, height, width) = data.dim();
        let separate = self.planar_configuration == planar::SEPARATE;
        let planes = if separate { bands } else { 1 };
        let channels = if separate { 1 } else { bands };

        let (chunk_width, chunk_height, across, down) = match self.layout {
            ChunkLayout::Strips { rows_per_strip } => {
                let rows = rows_per_strip.clamp(1, height);
                (width, rows, 1, height.div_ceil(rows))
            },
            ChunkLayout::Tiles { width: tw, height: th } => {
                if tw == 0 || th == 0 || tw % 16 != 0 || th % 16 != 0 {
                    return Err(TiffError::UnsupportedLayout(format!(
                        "tile size {}x{} is not a positive multiple of 16", tw, th)));
                }
                (tw, th, width.div_ceil(tw), height.div_ceil(th))
            },
        };
        let tiled = matches!(self.layout, ChunkLayout::Tiles { .. });

        let mut chunks = Vec::with_capacity(planes * across * down);
        for plane in 0..planes {
            for chunk_row in 0..down {
                for chunk_col in 0..across {
                    let row0 = chunk_row * chunk_height;
                    let col0 = chunk_col * chunk_width;
                    // Strips stop at the image edge, tiles are padded with zeros
                    let rows = if tiled { chunk_height } else { chunk_height.min(height - row0) };

                    let mut values = Vec::with_capacity(rows * chunk_width * channels);
                    for r in 0..rows {
                        for c in 0..chunk_width {
                            for ch in 0..channels {
                                let band = if separate { plane } else { ch };
                                let value = data.get((band, row0 + r, col0 + c)).copied().unwrap_or(0.0);
                                values.push(value);
                            }
                        }
                    }

                    let raw = self.sample_type.encode_chunk(&values, chunk_width, channels, self.predictor)?;
                    chunks.push(self.compression.compress(&raw)?);
                }
            }
        }

        Ok(chunks)
    }

    /// Builds the IFD entries, sorted by tag
    #[allow(clippy::too_many_arguments)]
    fn build_entries(
        &self,
        bands: usize,
        height: usize,
        width: usize,
        offsets: Vec<u32>,
        byte_counts: Vec<u32>,
        geotransform: [f64; 6],
        nodata: Option<f64>
    ) -> Vec<(u16, TagValue)> {
        let bits = self.sample_type.bits();
        let mut entries = vec![
            (tags::IMAGE_WIDTH, TagValue::Longs(vec![width as u32])),
            (tags::IMAGE_LENGTH, TagValue::Longs(vec![height as u32])),
            (tags::BITS_PER_SAMPLE, TagValue::Shorts(vec![bits; bands])),
            (tags::COMPRESSION, TagValue::Shorts(vec![self.compression.code()])),
            (tags::PHOTOMETRIC_INTERPRETATION, TagValue::Shorts(vec![photometric::BLACK_IS_ZERO])),
            (tags::SAMPLES_PER_PIXEL, TagValue::Shorts(vec![bands as u16])),
            (tags::PLANAR_CONFIGURATION, TagValue::Shorts(vec![self.planar_configuration])),
            (tags::PREDICTOR, TagValue::Shorts(vec![self.predictor])),
            (tags::SAMPLE_FORMAT, TagValue::Shorts(vec![self.sample_type.format_code(); bands])),
        ];

        match self.layout {
            ChunkLayout::Strips { rows_per_strip } => {
                let rows = rows_per_strip.clamp(1, height) as u32;
                entries.push((tags::STRIP_OFFSETS, TagValue::Longs(offsets)));
                entries.push((tags::ROWS_PER_STRIP, TagValue::Longs(vec![rows])));
                entries.push((tags::STRIP_BYTE_COUNTS, TagValue::Longs(byte_counts)));
            },
            ChunkLayout::Tiles { width: tw, height: th } => {
                entries.push((tags::TILE_WIDTH, TagValue::Longs(vec![tw as u32])));
                entries.push((tags::TILE_LENGTH, TagValue::Longs(vec![th as u32])));
                entries.push((tags::TILE_OFFSETS, TagValue::Longs(offsets)));
                entries.push((tags::TILE_BYTE_COUNTS, TagValue::Longs(byte_counts)));
            },
        }

        let [origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height] = geotransform;
        if row_rotation == 0.0 && col_rotation == 0.0 {
            entries.push((tags::MODEL_PIXEL_SCALE_TAG, TagValue::Doubles(vec![pixel_width, -pixel_height, 0.0])));
            entries.push((tags::MODEL_TIEPOINT_TAG, TagValue::Doubles(vec![0.0, 0.0, 0.0, origin_x, origin_y, 0.0])));
        } else {
            entries.push((tags::MODEL_TRANSFORMATION_TAG, TagValue::Doubles(vec![
                pixel_width, row_rotation, 0.0, origin_x,
                col_rotation, pixel_height, 0.0, origin_y,
                0.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ])));
        }

        entries.push((tags::GEO_KEY_DIRECTORY_TAG, TagValue::Shorts(vec![
            1, 1, 0, 3,
            geokeys::GT_MODEL_TYPE, 0, 1, geokeys::MODEL_TYPE_GEOGRAPHIC,
            geokeys::GT_RASTER_TYPE, 0, 1, geokeys::RASTER_PIXEL_IS_AREA,
            geokeys::GEOGRAPHIC_TYPE, 0, 1, geokeys::EPSG_WGS84,
        ])));

        if let Some(value) = nodata {
            entries.push((tags::GDAL_NODATA, TagValue::Ascii(value.to_string())));
        }

        entries.sort_by_key(|(tag, _)| *tag);
        entries
    }

    fn align(buffer: &mut Vec<u8>) {
        while buffer.len() % 4 != 0 {
            buffer.push(0);
        }
    }

    fn checked_u32(value: usize) -> TiffResult<u32> {
        u32::try_from(value)
            .map_err(|_| TiffError::GenericError("File exceeds the classic TIFF 4 GiB limit".to_string()))
    }
}
