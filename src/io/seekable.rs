//! Seekable reader trait
//!
//! Unifies files, buffered readers and in-memory cursors behind one
//! object-safe trait so the TIFF parser can take `&mut dyn SeekableReader`.

use std::io::{Read, Seek};

/// Trait for readers that can both read and seek
pub trait SeekableReader: Read + Seek + Send + Sync {}

impl<T: Read + Seek + Send + Sync> SeekableReader for T {}
