//! Byte source trait
//!
//! Defines the interface for reading raw bytes from evidence files.
//! This abstraction lets the scanners work on files, memory maps or
//! in-memory buffers (archive members, tests) alike.

use std::io;
use thiserror::Error;

/// Errors that can occur when reading from a byte source
#[derive(Error, Debug)]
pub enum ByteSourceError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Read error at offset {offset}: {message}")]
    ReadError { offset: u64, message: String },

    #[error("Source error: {0}")]
    Other(String),
}

impl ByteSourceError {
    /// Maps an open error for `path` onto the taxonomy
    pub fn from_open(path: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => ByteSourceError::PermissionDenied(path.to_string()),
            io::ErrorKind::NotFound => ByteSourceError::NotFound(path.to_string()),
            _ => ByteSourceError::IoError(err),
        }
    }
}

/// Trait for positioned reads over a finite byte sequence
///
/// # Example
///
/// ```ignore
/// let source = FileSource::open("backup.rem")?;
/// let header = source.read_at(0, 4)?;
/// ```
pub trait ByteSource: Send + Sync {
    /// Human-readable name (usually the path)
    fn label(&self) -> &str;

    /// Total length in bytes
    fn size(&self) -> u64;

    /// Reads up to `length` bytes starting at `offset`
    ///
    /// Returns fewer bytes only when the end of the source is reached, and
    /// an empty vector when `offset` is at or past the end.
    fn read_at(&self, offset: u64, length: usize) -> Result<Vec<u8>, ByteSourceError>;

    /// Zero-copy view of the whole source, when the backing store has one
    fn as_slice(&self) -> Option<&[u8]> {
        None
    }

    /// Reads the whole source, capped at `limit` bytes
    fn read_prefix(&self, limit: usize) -> Result<Vec<u8>, ByteSourceError> {
        self.read_at(0, limit)
    }
}
