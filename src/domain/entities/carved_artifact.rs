//! Carved artifact entity
//!
//! An embedded file recovered from raw bytes by header/footer signature.

use serde::Serialize;
use std::path::PathBuf;

/// A header/footer match accepted by the carver, before it is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarveMatch {
    /// Index of the signature in the snapshot that produced the match
    pub signature: usize,
    /// Byte offset of the header within the source
    pub offset: u64,
    /// Length from the header to the end of the footer (or fixed window)
    pub length: u64,
}

impl CarveMatch {
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// A persisted carved file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarvedArtifact {
    /// Name of the signature that matched
    pub signature: String,
    /// Source file, relative to the analysis root
    pub source: String,
    /// Byte offset of the header in the source file
    pub offset: u64,
    /// Length in bytes
    pub length: u64,
    /// Where the bytes were written
    pub output_path: PathBuf,
    /// SHA-256 of the carved bytes, lower-case hex
    pub sha256: String,
}

impl CarvedArtifact {
    /// Builds the output file name for a match
    ///
    /// The sanitized source path is only for readability. The `tag`
    /// (a digest of the unsanitized relative path) keeps names from
    /// different sources apart.
    pub fn file_name(source: &str, tag: &str, offset: u64, extension: &str) -> String {
        let stem: String = source
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        format!("{}_{}_{:010x}.{}", stem, tag, offset, extension)
    }

    /// `name` with `-<n>` inserted before the extension
    pub fn numbered(name: &str, n: usize) -> String {
        match name.rsplit_once('.') {
            Some((stem, ext)) => format!("{}-{}.{}", stem, n, ext),
            None => format!("{}-{}", name, n),
        }
    }
}
