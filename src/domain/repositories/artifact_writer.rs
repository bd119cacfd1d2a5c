//! Artifact writer trait
//!
//! Defines the interface for persisting carved bytes into a run's output
//! namespace.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when writing carved artifacts
#[derive(Error, Debug)]
pub enum ArtifactWriterError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("File already exists: {0}")]
    FileExists(String),

    #[error("Invalid artifact name: {0}")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Trait for writing carved artifacts to storage
///
/// One writer serves one run; its output directory is not shared with
/// other runs, so names derived from byte offsets cannot collide across
/// concurrent runs.
///
/// # Example
///
/// ```ignore
/// let writer = LocalArtifactWriter::new(&session.output_dir())?;
/// let path = writer.write("backup_0000000400.jpg", &bytes)?;
/// ```
pub trait ArtifactWriter: Send + Sync {
    /// Writes `data` under `file_name` inside the output directory
    fn write(&self, file_name: &str, data: &[u8]) -> Result<PathBuf, ArtifactWriterError>;

    /// Returns the output directory
    fn output_dir(&self) -> &Path;

    /// Returns the number of files written so far
    fn files_written(&self) -> usize;

    /// Returns the total bytes written so far
    fn bytes_written(&self) -> u64;
}
