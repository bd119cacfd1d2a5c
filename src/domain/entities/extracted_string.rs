//! Extracted string entity

use serde::Serialize;

/// Longest value kept for a single extracted string
pub const MAX_STRING_CHARS: usize = 500;

/// A run of printable ASCII found in raw bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedString {
    /// Offset of the first byte of the run
    pub offset: u64,
    /// Decoded text, truncated to [`MAX_STRING_CHARS`]
    pub value: String,
    /// Full length of the run in bytes
    pub run_length: u64,
    /// Encoding tag; only `ascii` is produced
    pub encoding: &'static str,
}

impl ExtractedString {
    pub fn is_truncated(&self) -> bool {
        self.run_length as usize > self.value.len()
    }
}
