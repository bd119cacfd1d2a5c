//! Local artifact writer
//!
//! Writes carved bytes into a run's output directory on the local
//! filesystem.

use crate::domain::repositories::{ArtifactWriter, ArtifactWriterError};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Local file system writer
pub struct LocalArtifactWriter {
    output_dir: PathBuf,
    files_written: AtomicUsize,
    bytes_written: AtomicU64,
}

impl LocalArtifactWriter {
    /// Creates the output directory if needed
    pub fn new(output_dir: &Path) -> Result<Self, ArtifactWriterError> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir).map_err(|e| {
                if e.kind() == std::io::ErrorKind::PermissionDenied {
                    ArtifactWriterError::PermissionDenied(output_dir.display().to_string())
                } else {
                    ArtifactWriterError::IoError(e)
                }
            })?;
        }

        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            files_written: AtomicUsize::new(0),
            bytes_written: AtomicU64::new(0),
        })
    }
}

impl ArtifactWriter for LocalArtifactWriter {
    fn write(&self, file_name: &str, data: &[u8]) -> Result<PathBuf, ArtifactWriterError> {
        if file_name.is_empty()
            || file_name.contains(['/', '\\'])
            || file_name == "."
            || file_name == ".."
        {
            return Err(ArtifactWriterError::InvalidName(file_name.to_string()));
        }

        let output_path = self.output_dir.join(file_name);
        if output_path.exists() {
            return Err(ArtifactWriterError::FileExists(
                output_path.display().to_string(),
            ));
        }

        let mut output_file = File::create(&output_path)?;
        output_file.write_all(data)?;
        output_file.sync_all()?;

        self.files_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written
            .fetch_add(data.len() as u64, Ordering::Relaxed);

        Ok(output_path)
    }

    fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn files_written(&self) -> usize {
        self.files_written.load(Ordering::Relaxed)
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_and_counts() {
        let dir = TempDir::new().unwrap();
        let writer = LocalArtifactWriter::new(&dir.path().join("run-1")).unwrap();
        let path = writer.write("a_0000000000.jpg", b"hello").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello");
        assert_eq!(writer.files_written(), 1);
        assert_eq!(writer.bytes_written(), 5);
    }

    #[test]
    fn refuses_overwrite_and_path_names() {
        let dir = TempDir::new().unwrap();
        let writer = LocalArtifactWriter::new(dir.path()).unwrap();
        writer.write("x.bin", b"1").unwrap();
        assert!(matches!(
            writer.write("x.bin", b"2"),
            Err(ArtifactWriterError::FileExists(_))
        ));
        assert!(matches!(
            writer.write("../escape.bin", b"2"),
            Err(ArtifactWriterError::InvalidName(_))
        ));
    }
}
