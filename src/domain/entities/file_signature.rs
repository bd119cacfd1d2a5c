//! File signature entity
//!
//! Represents the magic bytes (header and optional footer) that identify
//! an embedded file. This is the foundation of file carving.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A carving signature: header bytes, optional footer bytes and a size bound
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Unique name used for enable/disable lookups (e.g. "jpeg")
    name: String,
    /// The header bytes (magic bytes at the start of the file)
    #[serde(with = "hex::serde")]
    header: Vec<u8>,
    /// Optional footer bytes (magic bytes at the end of the file)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    footer: Option<HexBytes>,
    /// Bytes after the footer that still belong to the artifact
    #[serde(default)]
    trailer: u64,
    /// Maximum expected artifact size in bytes
    max_size: u64,
    /// Extension used when writing carved artifacts
    extension: String,
    /// Whether the signature takes part in carving
    enabled: bool,
}

/// Hex-encoded byte string for configuration files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexBytes(#[serde(with = "hex::serde")] pub Vec<u8>);

impl Signature {
    /// Creates a new, enabled signature
    pub fn new(
        name: impl Into<String>,
        header: Vec<u8>,
        footer: Option<Vec<u8>>,
        max_size: u64,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            header,
            footer: footer.map(HexBytes),
            trailer: 0,
            max_size,
            extension: extension.into(),
            enabled: true,
        }
    }

    /// Sets how many bytes after the footer are part of the artifact
    pub fn with_trailer(mut self, trailer: u64) -> Self {
        self.trailer = trailer;
        self
    }

    /// Returns the signature disabled
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &[u8] {
        &self.header
    }

    pub fn footer(&self) -> Option<&[u8]> {
        self.footer.as_ref().map(|f| f.0.as_slice())
    }

    pub fn trailer(&self) -> u64 {
        self.trailer
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Longest byte pattern this signature contributes to a scan
    pub fn longest_pattern(&self) -> usize {
        self.header
            .len()
            .max(self.footer().map(<[u8]>::len).unwrap_or(0))
    }

    /// Checks if the given data starts with this signature's header
    pub fn matches_header(&self, data: &[u8]) -> bool {
        data.starts_with(&self.header)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (.{})", self.name, self.extension)
    }
}
