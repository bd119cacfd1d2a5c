//! Memory-mapped byte source
//!
//! Whole-file carving maps the input once and hands the mapping to the
//! matcher as a single slice.

use crate::domain::repositories::{ByteSource, ByteSourceError};
use memmap2::Mmap;
use std::fs::OpenOptions;
use std::path::Path;

/// Read-only mapping of a file
///
/// Empty files are not mapped; they read as an empty slice.
#[derive(Debug)]
pub struct MmapSource {
    mmap: Option<Mmap>,
    label: String,
}

impl MmapSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ByteSourceError> {
        let path = path.as_ref();
        let label = path.display().to_string();

        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|e| ByteSourceError::from_open(&label, e))?;

        let mmap = if file.metadata()?.len() == 0 {
            None
        } else {
            // SAFETY: the mapping is read-only. Evidence files are not
            // expected to change while a run reads them.
            Some(unsafe { Mmap::map(&file) }.map_err(|e| {
                ByteSourceError::Other(format!("Failed to memory-map {}: {}", label, e))
            })?)
        };

        Ok(Self { mmap, label })
    }

    #[inline]
    fn bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }
}

impl ByteSource for MmapSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn size(&self) -> u64 {
        self.bytes().len() as u64
    }

    fn read_at(&self, offset: u64, length: usize) -> Result<Vec<u8>, ByteSourceError> {
        let data = self.bytes();
        let start = (offset.min(data.len() as u64)) as usize;
        let end = start.saturating_add(length).min(data.len());
        Ok(data[start..end].to_vec())
    }

    fn as_slice(&self) -> Option<&[u8]> {
        Some(self.bytes())
    }
}
