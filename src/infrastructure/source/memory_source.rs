//! In-memory byte source for archive members and tests

use crate::domain::repositories::{ByteSource, ByteSourceError};

#[derive(Debug, Clone)]
pub struct MemorySource {
    label: String,
    data: Vec<u8>,
}

impl MemorySource {
    pub fn new(label: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            data,
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl ByteSource for MemorySource {
    fn label(&self) -> &str {
        &self.label
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_at(&self, offset: u64, length: usize) -> Result<Vec<u8>, ByteSourceError> {
        let start = (offset.min(self.data.len() as u64)) as usize;
        let end = start.saturating_add(length).min(self.data.len());
        Ok(self.data[start..end].to_vec())
    }

    fn as_slice(&self) -> Option<&[u8]> {
        Some(&self.data)
    }
}
