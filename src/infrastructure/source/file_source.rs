//! Positioned reads over a regular file
//!
//! Used for files too large to map in one piece. Each read seeks and reads
//! under a lock, so the source can be shared between threads.

use crate::domain::repositories::{ByteSource, ByteSourceError};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

/// File-backed byte source
///
/// # Example
///
/// ```ignore
/// let source = FileSource::open("backup/Databases/00000001.rem")?;
/// let magic = source.read_at(0, 4)?;
/// ```
#[derive(Debug)]
pub struct FileSource {
    file: Mutex<File>,
    label: String,
    size: u64,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ByteSourceError> {
        let path = path.as_ref();
        let label = path.display().to_string();

        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|e| ByteSourceError::from_open(&label, e))?;
        let size = file.metadata()?.len();

        Ok(Self {
            file: Mutex::new(file),
            label,
            size,
        })
    }
}

impl ByteSource for FileSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn read_at(&self, offset: u64, length: usize) -> Result<Vec<u8>, ByteSourceError> {
        if offset >= self.size || length == 0 {
            return Ok(Vec::new());
        }

        let available = (self.size - offset).min(length as u64) as usize;
        let mut buffer = vec![0u8; available];

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        // The file may have shrunk since it was opened
        let mut filled = 0;
        while filled < buffer.len() {
            match file.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(ByteSourceError::ReadError {
                        offset: offset + filled as u64,
                        message: e.to_string(),
                    });
                }
            }
        }
        buffer.truncate(filled);
        Ok(buffer)
    }
}
