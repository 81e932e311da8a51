//! Low-level I/O helpers for reading raster tiles

pub mod seekable;
pub mod byte_order;
