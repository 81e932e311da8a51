//! TIFF file format module
//!
//! Structures and functions for reading TIFF and BigTIFF headers, IFDs
//! and GeoTIFF georeferencing, plus a writer for single-image GeoTIFFs.

pub mod errors;
pub mod ifd;
pub(crate) mod types;
pub mod reader;
pub mod writer;
pub(crate) mod constants;
pub mod geo_key_parser;
#[cfg(test)]
pub(crate) mod tests;

pub use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use errors::{TiffError, TiffResult};
pub use ifd::{IFD, IFDEntry};
pub use reader::TiffReader;
pub use types::TIFF;
pub use writer::{ChunkLayout, GeoTiffWriter};
