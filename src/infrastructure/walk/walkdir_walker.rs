//! walkdir-backed directory walker

use crate::domain::entities::FileEntry;
use crate::domain::repositories::{DirectoryWalker, WalkError};
use std::path::Path;
use walkdir::WalkDir;

/// Lists regular files with a bounded-depth walk
///
/// Symbolic links are not followed. Entries are sorted by file name inside
/// each directory so runs over the same tree visit files in the same order.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkdirWalker;

impl WalkdirWalker {
    pub fn new() -> Self {
        Self
    }
}

impl DirectoryWalker for WalkdirWalker {
    fn walk(&self, root: &Path, max_depth: usize) -> Result<Vec<FileEntry>, WalkError> {
        if !root.exists() {
            return Err(WalkError::RootNotFound(root.to_path_buf()));
        }
        if root.is_file() {
            let size = root
                .metadata()
                .map_err(|e| WalkError::RootUnreadable(format!("{}: {}", root.display(), e)))?
                .len();
            let base = root.parent().unwrap_or(root);
            return Ok(vec![FileEntry::new(base, root.to_path_buf(), size)]);
        }
        std::fs::read_dir(root)
            .map_err(|e| WalkError::RootUnreadable(format!("{}: {}", root.display(), e)))?;

        let mut entries = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .max_depth(max_depth)
            .sort_by_file_name();

        for item in walker {
            let entry = match item {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable walk entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let size = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(e) => {
                    tracing::debug!(path = %entry.path().display(), error = %e, "no metadata; skipped");
                    continue;
                }
            };
            entries.push(FileEntry::new(root, entry.into_path(), size));
        }

        Ok(entries)
    }
}
