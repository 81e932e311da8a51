//! Logger utility for application-wide logging
//!
//! This module provides a custom logger implementation that works alongside
//! the standard log crate, but adds file output capabilities. Records are
//! written to the log file and echoed to stderr.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use log::{Log, Record, Metadata, LevelFilter};

/// File-backed logger
pub struct Logger {
    /// File handle for log output
    file: Mutex<File>,
    /// Most verbose level that gets written
    level: LevelFilter,
}

impl Logger {
    /// Creates a new logger writing to `log_file`
    ///
    /// # Arguments
    ///
    /// * `log_file` - Path to the log file, truncated if it exists
    /// * `level` - Most verbose level to record
    pub fn new(log_file: &Path, level: LevelFilter) -> io::Result<Self> {
        let file = File::create(log_file)?;
        Ok(Logger {
            file: Mutex::new(file),
            level,
        })
    }

    /// Writes one line to the log file
    pub fn write_line(&self, message: &str) -> io::Result<()> {
        let mut file = self.file
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        writeln!(file, "{}", message)?;
        file.flush()
    }

    /// Installs a `Logger` as the global `log` backend
    pub fn init_global_logger(log_file: &Path, level: LevelFilter) -> io::Result<()> {
        let global_logger = Logger::new(log_file, level)?;

        if log::set_boxed_logger(Box::new(global_logger)).is_err() {
            eprintln!("Warning: Global logger was already initialized");
        }

        log::set_max_level(level);
        Ok(())
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = format!("[{}] {}: {}", record.level(), record.target(), record.args());
            let _ = self.write_line(&message);

            eprintln!("{}", message);
        }
    }

    fn flush(&self) {
        // Already flushing in write_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;
    use std::fs;

    #[test]
    fn test_writes_enabled_records_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chipkit.log");
        let logger = Logger::new(&path, LevelFilter::Info).unwrap();

        logger.log(&Record::builder().level(Level::Info).args(format_args!("kept")).build());
        logger.log(&Record::builder().level(Level::Debug).args(format_args!("dropped")).build());

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[INFO]"));
        assert!(content.contains("kept"));
        assert!(!content.contains("dropped"));
    }
}
