//! ZIP archive reader
//!
//! `.bbb` backups and zip files found in a tree are read through the `zip`
//! crate. Members are bounded in size and count so a hostile archive cannot
//! exhaust memory.

use crate::domain::repositories::{ArchiveError, ArchiveReader};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use zip::ZipArchive;
use zip::result::ZipError;

/// Largest member read into memory (100 MiB)
pub const MAX_MEMBER_SIZE: u64 = 100 * 1024 * 1024;
/// Members visited per archive
pub const MAX_ARCHIVE_ENTRIES: usize = 10_000;

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

#[derive(Debug, Clone, Copy)]
pub struct ZipArchiveReader {
    max_member_size: u64,
    max_entries: usize,
}

impl Default for ZipArchiveReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ZipArchiveReader {
    pub fn new() -> Self {
        Self {
            max_member_size: MAX_MEMBER_SIZE,
            max_entries: MAX_ARCHIVE_ENTRIES,
        }
    }

    pub fn with_max_member_size(mut self, size: u64) -> Self {
        self.max_member_size = size;
        self
    }

    pub fn with_max_entries(mut self, count: usize) -> Self {
        self.max_entries = count;
        self
    }

    fn open(path: &Path) -> Result<ZipArchive<File>, ArchiveError> {
        let file = File::open(path)?;
        ZipArchive::new(file).map_err(|e| corrupt(path, e))
    }
}

fn corrupt(path: &Path, err: ZipError) -> ArchiveError {
    match err {
        ZipError::Io(e) => ArchiveError::IoError(e),
        other @ (ZipError::InvalidArchive(_) | ZipError::UnsupportedArchive(_)) => {
            ArchiveError::NotAnArchive(format!("{}: {}", path.display(), other))
        }
        other => ArchiveError::Corrupt(format!("{}: {}", path.display(), other)),
    }
}

fn has_zip_magic(path: &Path) -> bool {
    let mut magic = [0u8; 4];
    File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .map(|_| magic == ZIP_MAGIC)
        .unwrap_or(false)
}

impl ArchiveReader for ZipArchiveReader {
    fn is_archive(&self, path: &Path) -> bool {
        let by_extension = path
            .extension()
            .map(|e| {
                let e = e.to_string_lossy().to_lowercase();
                e == "zip" || e == "bbb"
            })
            .unwrap_or(false);
        by_extension || has_zip_magic(path)
    }

    fn member_names(&self, path: &Path, limit: usize) -> Result<Vec<String>, ArchiveError> {
        let archive = Self::open(path)?;
        Ok(archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .take(limit.min(self.max_entries))
            .map(str::to_string)
            .collect())
    }

    fn for_each_member(
        &self,
        path: &Path,
        visit: &mut dyn FnMut(&str, &[u8]) -> bool,
    ) -> Result<(), ArchiveError> {
        let mut archive = Self::open(path)?;
        let count = archive.len().min(self.max_entries);

        for i in 0..count {
            let mut entry = match archive.by_index(i) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(archive = %path.display(), index = i, error = %e, "unreadable member");
                    continue;
                }
            };
            if entry.is_dir() {
                continue;
            }
            if entry.size() > self.max_member_size {
                tracing::debug!(
                    archive = %path.display(),
                    member = entry.name(),
                    size = entry.size(),
                    "member too large; skipped"
                );
                continue;
            }

            let name = entry.name().to_string();
            let mut data = Vec::with_capacity(entry.size() as usize);
            if let Err(e) = read_bounded(&mut entry, self.max_member_size, &mut data) {
                tracing::debug!(archive = %path.display(), member = %name, error = %e, "member read failed");
                continue;
            }
            if !visit(&name, &data) {
                break;
            }
        }
        Ok(())
    }
}

/// Reads at most `limit` bytes; the declared size of a member is not trusted
fn read_bounded<R: Read>(reader: &mut R, limit: u64, out: &mut Vec<u8>) -> std::io::Result<()> {
    reader.take(limit).read_to_end(out)?;
    Ok(())
}

/// Lists member names from any seekable zip stream
pub fn list_members<R: Read + Seek>(reader: R, limit: usize) -> Result<Vec<String>, ArchiveError> {
    let archive = ZipArchive::new(reader)
        .map_err(|e| ArchiveError::NotAnArchive(e.to_string()))?;
    Ok(archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .take(limit)
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn make_zip(path: &Path, members: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, data) in members {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn lists_and_reads_members() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backup.bbb");
        make_zip(&path, &[("PkgInfo", b"pkg"), ("Archive/a.tar", b"tar bytes")]);

        let reader = ZipArchiveReader::new();
        assert!(reader.is_archive(&path));
        assert_eq!(
            reader.member_names(&path, 10).unwrap(),
            vec!["PkgInfo".to_string(), "Archive/a.tar".to_string()]
        );

        let mut seen = Vec::new();
        reader
            .for_each_member(&path, &mut |name, data| {
                seen.push((name.to_string(), data.len()));
                true
            })
            .unwrap();
        assert_eq!(seen, vec![("PkgInfo".to_string(), 3), ("Archive/a.tar".to_string(), 9)]);
    }

    #[test]
    fn oversized_members_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.zip");
        make_zip(&path, &[("big", &[7u8; 64]), ("small", b"ok")]);

        let mut seen = Vec::new();
        ZipArchiveReader::new()
            .with_max_member_size(16)
            .for_each_member(&path, &mut |name, _| {
                seen.push(name.to_string());
                true
            })
            .unwrap();
        assert_eq!(seen, vec!["small".to_string()]);
    }

    #[test]
    fn plain_file_is_not_an_archive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();
        let reader = ZipArchiveReader::new();
        assert!(!reader.is_archive(&path));
        assert!(reader.member_names(&path, 10).is_err());
    }
}
