//! TIFF file reader implementation
//!
//! Parses the header and IFD chain of TIFF/BigTIFF files and reads tag
//! value arrays. The byte order found in the header selects the
//! `ByteOrderHandler` strategy used for every subsequent read.

use byteorder::ReadBytesExt;
use log::{debug, warn};
use std::fs::File;
use std::io::{BufReader, Cursor, SeekFrom};
use std::path::{Path, PathBuf};

use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{field_types, header};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::{IFDEntry, IFD};
use crate::tiff::types::TIFF;

/// Upper bound on the IFD chain length, guards against offset loops
const MAX_IFDS: usize = 100;

/// Reader for TIFF and BigTIFF files
pub struct TiffReader {
    /// Current byte order handler
    byte_order_handler: Option<Box<dyn ByteOrderHandler>>,
    /// Current file path
    current_file: Option<PathBuf>,
    /// Whether currently reading BigTIFF format
    is_big_tiff: bool,
}

impl Default for TiffReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TiffReader {
    /// Creates a new TIFF reader
    pub fn new() -> Self {
        TiffReader {
            byte_order_handler: None,
            current_file: None,
            is_big_tiff: false,
        }
    }

    /// Opens a buffered reader on the file loaded last
    pub fn create_reader(&self) -> TiffResult<BufReader<File>> {
        match &self.current_file {
            Some(path) => Ok(BufReader::with_capacity(1024 * 1024, File::open(path)?)),
            None => Err(TiffError::GenericError("No file path specified".to_string())),
        }
    }

    /// Returns the byte order handler, failing if no header was read yet
    pub fn handler(&self) -> TiffResult<&dyn ByteOrderHandler> {
        self.byte_order_handler
            .as_deref()
            .ok_or_else(|| TiffError::GenericError("Byte order not yet determined".to_string()))
    }

    /// Loads a TIFF file from the given path
    pub fn load(&mut self, filepath: &Path) -> TiffResult<TIFF> {
        debug!("Loading TIFF file: {}", filepath.display());
        self.current_file = Some(filepath.to_path_buf());

        let file = File::open(filepath)?;
        let mut reader = BufReader::with_capacity(1024 * 1024, file);

        self.read(&mut reader)
    }

    /// Reads a TIFF file from the given reader
    ///
    /// 1. Detect byte order (little/big endian)
    /// 2. Check for TIFF or BigTIFF format
    /// 3. Read all IFDs (Image File Directories)
    pub fn read(&mut self, reader: &mut dyn SeekableReader) -> TiffResult<TIFF> {
        reader.seek(SeekFrom::Start(0))?;

        let byte_order = ByteOrder::detect(reader)?;
        debug!("Detected byte order: {}", byte_order.name());
        self.byte_order_handler = Some(byte_order.create_handler());

        self.is_big_tiff = self.read_version(reader)?;
        let first_ifd_offset = self.read_offset(reader)?;
        debug!("First IFD offset: {}", first_ifd_offset);

        let file_size = reader.seek(SeekFrom::End(0))?;
        if first_ifd_offset < 8 || first_ifd_offset >= file_size {
            return Err(TiffError::GenericError(format!(
                "First IFD offset {} outside file of {} bytes", first_ifd_offset, file_size)));
        }

        let mut tiff = TIFF::new(self.is_big_tiff, byte_order);
        tiff.ifds = self.read_ifd_chain(reader, first_ifd_offset, file_size)?;

        if tiff.ifds.is_empty() {
            return Err(TiffError::GenericError("No IFDs found in TIFF file".to_string()));
        }

        debug!("Read {} IFDs", tiff.ifds.len());
        Ok(tiff)
    }

    /// Reads the version field, returning whether the file is a BigTIFF
    fn read_version(&self, reader: &mut dyn SeekableReader) -> TiffResult<bool> {
        let handler = self.handler()?;
        let version = handler.read_u16(reader)?;

        match version {
            header::TIFF_VERSION => Ok(false),
            header::BIG_TIFF_VERSION => {
                let offset_size = handler.read_u16(reader)?;
                let reserved = handler.read_u16(reader)?;
                if offset_size != header::BIGTIFF_OFFSET_SIZE || reserved != 0 {
                    return Err(TiffError::InvalidBigTIFFHeader);
                }
                Ok(true)
            },
            _ => Err(TiffError::UnsupportedVersion(version)),
        }
    }

    /// Reads a 4- or 8-byte offset depending on the format
    fn read_offset(&self, reader: &mut dyn SeekableReader) -> TiffResult<u64> {
        let handler = self.handler()?;
        if self.is_big_tiff {
            Ok(handler.read_u64(reader)?)
        } else {
            Ok(handler.read_u32(reader)? as u64)
        }
    }

    /// Reads a chain of IFDs starting from the given offset
    fn read_ifd_chain(&self, reader: &mut dyn SeekableReader, first_ifd_offset: u64, file_size: u64) -> TiffResult<Vec<IFD>> {
        let mut ifds = Vec::new();
        let mut ifd_offset = first_ifd_offset;

        while ifd_offset != 0 && ifds.len() < MAX_IFDS {
            if ifd_offset >= file_size {
                warn!("IFD offset {} exceeds file size {}, stopping IFD chain", ifd_offset, file_size);
                break;
            }

            let ifd = self.read_ifd(reader, ifd_offset, ifds.len())?;
            // The reader now sits on the next-IFD offset field
            let next_offset = self.read_offset(reader)?;
            ifds.push(ifd);
            ifd_offset = next_offset;
        }

        Ok(ifds)
    }

    /// Reads an IFD located at `offset`
    pub fn read_ifd(&self, reader: &mut dyn SeekableReader, offset: u64, number: usize) -> TiffResult<IFD> {
        reader.seek(SeekFrom::Start(offset))?;

        let handler = self.handler()?;
        let entry_count = if self.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u16(reader)? as u64
        };
        debug!("IFD #{} at {} has {} entries", number, offset, entry_count);

        let mut ifd = IFD::new(number, offset);
        for _ in 0..entry_count {
            ifd.add_entry(self.read_ifd_entry(reader)?);
        }

        Ok(ifd)
    }

    /// Reads a single IFD entry
    fn read_ifd_entry(&self, reader: &mut dyn SeekableReader) -> TiffResult<IFDEntry> {
        let handler = self.handler()?;

        let tag = handler.read_u16(reader)?;
        let field_type = handler.read_u16(reader)?;
        let count = if self.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u32(reader)? as u64
        };

        let value_field_pos = reader.stream_position()?;
        let mut raw = vec![0u8; if self.is_big_tiff { 8 } else { 4 }];
        reader.read_exact(&mut raw)?;

        let mut probe = IFDEntry::new(tag, field_type, count, 0, value_field_pos);
        let mut cursor = Cursor::new(raw);

        probe.value_offset = if probe.is_value_inline(self.is_big_tiff) && count == 1 {
            match field_type {
                field_types::BYTE | field_types::SBYTE | field_types::UNDEFINED | field_types::ASCII => {
                    cursor.read_u8()? as u64
                },
                field_types::SHORT | field_types::SSHORT => handler.read_u16(&mut cursor)? as u64,
                field_types::LONG | field_types::SLONG | field_types::FLOAT => handler.read_u32(&mut cursor)? as u64,
                _ => handler.read_u64(&mut cursor)?,
            }
        } else if self.is_big_tiff {
            handler.read_u64(&mut cursor)?
        } else {
            handler.read_u32(&mut cursor)? as u64
        };

        Ok(probe)
    }

    /// Reads an integer-typed tag's values as u64
    pub fn read_tag_values(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> TiffResult<Vec<u64>> {
        let entry = ifd.get_entry(tag).ok_or(TiffError::TagNotFound(tag))?;
        let handler = self.handler()?;

        reader.seek(SeekFrom::Start(entry.data_position(self.is_big_tiff)))?;

        let mut values = Vec::with_capacity(entry.count as usize);
        for _ in 0..entry.count {
            let value = match entry.field_type {
                field_types::BYTE | field_types::SBYTE | field_types::UNDEFINED => reader.read_u8()? as u64,
                field_types::SHORT | field_types::SSHORT => handler.read_u16(reader)? as u64,
                field_types::LONG | field_types::SLONG => handler.read_u32(reader)? as u64,
                field_types::LONG8 | field_types::SLONG8 | field_types::IFD8 => handler.read_u64(reader)?,
                other => return Err(TiffError::UnsupportedFieldType(other)),
            };
            values.push(value);
        }

        Ok(values)
    }

    /// Reads a tag's values as f64, accepting floating point and integer types
    pub fn read_tag_f64_values(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> TiffResult<Vec<f64>> {
        let entry = ifd.get_entry(tag).ok_or(TiffError::TagNotFound(tag))?;
        let handler = self.handler()?;

        match entry.field_type {
            field_types::DOUBLE | field_types::FLOAT => {
                reader.seek(SeekFrom::Start(entry.data_position(self.is_big_tiff)))?;
                let mut values = Vec::with_capacity(entry.count as usize);
                for _ in 0..entry.count {
                    let value = if entry.field_type == field_types::DOUBLE {
                        handler.read_f64(reader)?
                    } else {
                        handler.read_f32(reader)? as f64
                    };
                    values.push(value);
                }
                Ok(values)
            },
            _ => Ok(self.read_tag_values(reader, ifd, tag)?
                .into_iter()
                .map(|v| v as f64)
                .collect()),
        }
    }

    /// Reads an ASCII tag, with trailing NULs and whitespace removed
    pub fn read_tag_ascii(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> TiffResult<String> {
        let entry = ifd.get_entry(tag).ok_or(TiffError::TagNotFound(tag))?;
        if entry.field_type != field_types::ASCII {
            return Err(TiffError::UnsupportedFieldType(entry.field_type));
        }

        reader.seek(SeekFrom::Start(entry.data_position(self.is_big_tiff)))?;
        let mut buffer = vec![0u8; entry.count as usize];
        reader.read_exact(&mut buffer)?;

        let text = String::from_utf8_lossy(&buffer);
        Ok(text.trim_end_matches('\0').trim().to_string())
    }

    /// Gets the file path if available
    pub fn get_file_path(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    /// Returns whether the current file is a BigTIFF
    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }
}
