//! Archive reader trait
//!
//! Archive formats are delegated to an off-the-shelf unzip implementation;
//! the domain only needs member names and member bytes.

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Not an archive: {0}")]
    NotAnArchive(String),

    #[error("Archive is corrupt: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Trait for reading members out of an archive file
pub trait ArchiveReader: Send + Sync {
    /// Whether `path` looks like an archive this reader understands
    fn is_archive(&self, path: &Path) -> bool;

    /// Lists member paths (directories excluded), at most `limit` of them
    fn member_names(&self, path: &Path, limit: usize) -> Result<Vec<String>, ArchiveError>;

    /// Calls `visit(name, bytes)` for each readable member until it returns
    /// false. Oversized or unreadable members are skipped.
    fn for_each_member(
        &self,
        path: &Path,
        visit: &mut dyn FnMut(&str, &[u8]) -> bool,
    ) -> Result<(), ArchiveError>;
}
