//! Sample encoding and decoding
//!
//! Converts between the raw bytes of a decompressed strip or tile and
//! `f64` sample values, applying or removing the horizontal predictor.
//! Floating point samples travel through the same path as their IEEE bit
//! patterns.

use byteorder::ReadBytesExt;
use std::io::Cursor;

use crate::io::byte_order::ByteOrderHandler;
use crate::tiff::constants::{predictor, sample_format};
use crate::tiff::errors::{TiffError, TiffResult};

/// Numeric type of the samples stored in a raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl SampleType {
    /// Resolves BitsPerSample and SampleFormat into a sample type
    pub fn from_tags(bits: u16, format: u16) -> TiffResult<Self> {
        let sample_type = match (format, bits) {
            (sample_format::UINT, 8) => SampleType::U8,
            (sample_format::UINT, 16) => SampleType::U16,
            (sample_format::UINT, 32) => SampleType::U32,
            (sample_format::UINT, 64) => SampleType::U64,
            (sample_format::INT, 8) => SampleType::I8,
            (sample_format::INT, 16) => SampleType::I16,
            (sample_format::INT, 32) => SampleType::I32,
            (sample_format::INT, 64) => SampleType::I64,
            (sample_format::IEEE_FP, 32) => SampleType::F32,
            (sample_format::IEEE_FP, 64) => SampleType::F64,
            _ => {
                return Err(TiffError::UnsupportedLayout(format!(
                    "{}-bit samples with sample format {}", bits, format)))
            }
        };
        Ok(sample_type)
    }

    /// Bits per sample
    pub fn bits(&self) -> u16 {
        self.bytes() as u16 * 8
    }

    /// Bytes per sample
    pub fn bytes(&self) -> usize {
        match self {
            SampleType::U8 | SampleType::I8 => 1,
            SampleType::U16 | SampleType::I16 => 2,
            SampleType::U32 | SampleType::I32 | SampleType::F32 => 4,
            SampleType::U64 | SampleType::I64 | SampleType::F64 => 8,
        }
    }

    /// SampleFormat tag value
    pub fn format_code(&self) -> u16 {
        match self {
            SampleType::U8 | SampleType::U16 | SampleType::U32 | SampleType::U64 => sample_format::UINT,
            SampleType::I8 | SampleType::I16 | SampleType::I32 | SampleType::I64 => sample_format::INT,
            SampleType::F32 | SampleType::F64 => sample_format::IEEE_FP,
        }
    }

    /// Whether samples are IEEE floating point
    pub fn is_float(&self) -> bool {
        self.format_code() == sample_format::IEEE_FP
    }

    fn mask(&self) -> u64 {
        match self.bytes() {
            8 => u64::MAX,
            n => (1u64 << (n * 8)) - 1,
        }
    }

    fn raw_to_f64(&self, raw: u64) -> f64 {
        match self {
            SampleType::U8 | SampleType::U16 | SampleType::U32 | SampleType::U64 => raw as f64,
            SampleType::I8 => raw as u8 as i8 as f64,
            SampleType::I16 => raw as u16 as i16 as f64,
            SampleType::I32 => raw as u32 as i32 as f64,
            SampleType::I64 => raw as i64 as f64,
            SampleType::F32 => f32::from_bits(raw as u32) as f64,
            SampleType::F64 => f64::from_bits(raw),
        }
    }

    // Float-to-int `as` casts saturate and map NaN to 0
    fn f64_to_raw(&self, value: f64) -> u64 {
        match self {
            SampleType::U8 => value.round() as u8 as u64,
            SampleType::U16 => value.round() as u16 as u64,
            SampleType::U32 => value.round() as u32 as u64,
            SampleType::U64 => value.round() as u64,
            SampleType::I8 => value.round() as i8 as u8 as u64,
            SampleType::I16 => value.round() as i16 as u16 as u64,
            SampleType::I32 => value.round() as i32 as u32 as u64,
            SampleType::I64 => value.round() as i64 as u64,
            SampleType::F32 => (value as f32).to_bits() as u64,
            SampleType::F64 => value.to_bits(),
        }
    }

    fn check_predictor(&self, predictor_code: u16) -> TiffResult<bool> {
        match predictor_code {
            predictor::NONE => Ok(false),
            predictor::HORIZONTAL_DIFFERENCING if !self.is_float() => Ok(true),
            other => Err(TiffError::UnsupportedLayout(format!(
                "predictor {} with {:?} samples", other, self))),
        }
    }

    /// Decodes a decompressed chunk of `rows` x `width` pixels with
    /// `channels` interleaved samples each
    pub fn decode_chunk(
        &self,
        data: &[u8],
        handler: &dyn ByteOrderHandler,
        width: usize,
        rows: usize,
        channels: usize,
        predictor_code: u16
    ) -> TiffResult<Vec<f64>> {
        let differenced = self.check_predictor(predictor_code)?;
        let count = width * rows * channels;
        let needed = count * self.bytes();
        if data.len() < needed {
            return Err(TiffError::GenericError(format!(
                "Chunk holds {} bytes, expected at least {}", data.len(), needed)));
        }

        let mut cursor = Cursor::new(data);
        let mut raw = Vec::with_capacity(count);
        for _ in 0..count {
            let value = match self.bytes() {
                1 => cursor.read_u8()? as u64,
                2 => handler.read_u16(&mut cursor)? as u64,
                4 => handler.read_u32(&mut cursor)? as u64,
                _ => handler.read_u64(&mut cursor)?,
            };
            raw.push(value);
        }

        if differenced {
            let mask = self.mask();
            let row_len = width * channels;
            for row in raw.chunks_mut(row_len) {
                for i in channels..row.len() {
                    row[i] = row[i].wrapping_add(row[i - channels]) & mask;
                }
            }
        }

        Ok(raw.into_iter().map(|r| self.raw_to_f64(r)).collect())
    }

    /// Encodes a chunk as little-endian bytes, the inverse of `decode_chunk`
    pub fn encode_chunk(
        &self,
        values: &[f64],
        width: usize,
        channels: usize,
        predictor_code: u16
    ) -> TiffResult<Vec<u8>> {
        let differenced = self.check_predictor(predictor_code)?;
        let mut raw: Vec<u64> = values.iter().map(|v| self.f64_to_raw(*v)).collect();

        if differenced {
            let mask = self.mask();
            for row in raw.chunks_mut(width * channels) {
                for i in (channels..row.len()).rev() {
                    row[i] = row[i].wrapping_sub(row[i - channels]) & mask;
                }
            }
        }

        let mut bytes = Vec::with_capacity(raw.len() * self.bytes());
        for value in raw {
            match self.bytes() {
                1 => bytes.push(value as u8),
                2 => bytes.extend_from_slice(&(value as u16).to_le_bytes()),
                4 => bytes.extend_from_slice(&(value as u32).to_le_bytes()),
                _ => bytes.extend_from_slice(&value.to_le_bytes()),
            }
        }

        Ok(bytes)
    }
}
