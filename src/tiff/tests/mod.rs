//! Unit tests for TIFF parsing and writing
