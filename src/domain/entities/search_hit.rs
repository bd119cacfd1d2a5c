//! Search hit entity

use serde::Serialize;
use std::fmt;

/// How a query is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Literal text, optionally ASCII case-insensitive
    Text,
    /// Raw bytes given as hex digits
    Hex,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchKind::Text => f.write_str("text"),
            MatchKind::Hex => f.write_str("hex"),
        }
    }
}

/// One occurrence of a query in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// Relative path of the file (`archive!member` for archive members)
    pub source: String,
    /// Byte offset of the match within that file
    pub offset: u64,
    /// Hex bytes (hex mode) or a text snippet (text mode) around the match
    pub context: String,
    pub kind: MatchKind,
    /// The query as the caller typed it
    pub query: String,
}
