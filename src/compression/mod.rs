//! Compression handling for raster tiles
//!
//! Strategy objects for the compression schemes found in GeoTIFF tiles.
//! Decompression is used when loading tiles; compression when exporting
//! chips and fabricating tiles in tests.

mod handler;
mod uncompressed;
mod deflate;
mod factory;
mod zstd;

pub use handler::CompressionHandler;
pub use uncompressed::UncompressedHandler;
pub use deflate::AdobeDeflateHandler;
pub use factory::CompressionFactory;
pub use zstd::ZstdHandler;
