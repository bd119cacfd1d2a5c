//! File entry entity
//!
//! One regular file found by the directory walk.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// A regular file below an analysis root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Absolute (or root-joined) path to the file
    pub path: PathBuf,
    /// Path relative to the walk root, `/`-separated
    pub relative_path: String,
    /// Size in bytes at walk time
    pub size: u64,
    /// Lower-cased extension without the dot, empty if none
    pub extension: String,
}

impl FileEntry {
    /// Builds an entry from a path found under `root`
    pub fn new(root: &Path, path: PathBuf, size: u64) -> Self {
        let relative_path = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Self {
            path,
            relative_path,
            size,
            extension,
        }
    }

    /// Final path component
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Relative path lower-cased with unified separators
    pub fn normalized_path(&self) -> String {
        self.relative_path.to_lowercase()
    }

    pub fn has_extension(&self, ext: &str) -> bool {
        self.extension == ext
    }
}
