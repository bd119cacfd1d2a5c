//! Directory walker trait
//!
//! Produces the flat file list every analysis starts from.

use crate::domain::entities::FileEntry;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default recursion bound for a walk
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Errors that abort a walk. Per-directory failures are not errors.
#[derive(Error, Debug)]
pub enum WalkError {
    #[error("Root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Root is not readable: {0}")]
    RootUnreadable(String),
}

/// Trait for listing regular files under a root
pub trait DirectoryWalker: Send + Sync {
    /// Lists regular files at most `max_depth` levels below `root`
    ///
    /// Unreadable directories and broken links are skipped; only a missing
    /// or unreadable root fails the walk.
    fn walk(&self, root: &Path, max_depth: usize) -> Result<Vec<FileEntry>, WalkError>;
}
