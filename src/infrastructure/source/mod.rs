//! Byte source implementations

mod file_source;
mod memory_source;
mod mmap_source;

pub use file_source::FileSource;
pub use memory_source::MemorySource;
pub use mmap_source::MmapSource;

use crate::domain::repositories::{ByteSource, ByteSourceError};
use std::path::Path;

/// Opens `path` mapped when it is below `map_threshold` bytes, otherwise
/// for positioned reads
pub fn open_source(
    path: &Path,
    size: u64,
    map_threshold: u64,
) -> Result<Box<dyn ByteSource>, ByteSourceError> {
    if size < map_threshold {
        Ok(Box::new(MmapSource::open(path)?))
    } else {
        Ok(Box::new(FileSource::open(path)?))
    }
}
