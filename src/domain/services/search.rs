//! Keyword and hex search
//!
//! A query is compiled once into an Aho-Corasick automaton and run over
//! every window of a chunked scan. Hit context is fetched afterwards with a
//! positioned read, so it never depends on where a chunk boundary fell.

use super::cancellation::CancellationToken;
use super::chunked_scanner::{ChunkedScanner, ScanControl, ScanOutcome, Window};
use crate::core::{AnalysisError, AnalysisResult};
use crate::domain::entities::MatchKind;
use crate::domain::repositories::{ByteSource, ByteSourceError};
use aho_corasick::AhoCorasick;

/// Hits kept per run
pub const MAX_SEARCH_HITS: usize = 500;
/// Longest text snippet around a hit
pub const TEXT_CONTEXT_CHARS: usize = 200;
pub const HEX_CONTEXT_BYTES: usize = 16;
/// Hex context starts this many bytes before the hit
pub const HEX_CONTEXT_LEAD: u64 = 4;

/// A compiled search query
#[derive(Debug, Clone)]
pub struct SearchQuery {
    raw: String,
    kind: MatchKind,
    needle: Vec<u8>,
    matcher: AhoCorasick,
}

impl SearchQuery {
    /// Literal text; ASCII case folding unless `case_sensitive`
    pub fn text(query: &str, case_sensitive: bool) -> AnalysisResult<Self> {
        if query.is_empty() {
            return Err(AnalysisError::InvalidQuery("empty query".to_string()));
        }
        Self::build(query, MatchKind::Text, query.as_bytes().to_vec(), !case_sensitive)
    }

    /// Hex digits, with `0x` prefixes, commas and whitespace ignored
    pub fn hex(query: &str) -> AnalysisResult<Self> {
        let needle = parse_hex(query)?;
        Self::build(query, MatchKind::Hex, needle, false)
    }

    pub fn new(query: &str, kind: MatchKind, case_sensitive: bool) -> AnalysisResult<Self> {
        match kind {
            MatchKind::Text => Self::text(query, case_sensitive),
            MatchKind::Hex => Self::hex(query),
        }
    }

    fn build(
        raw: &str,
        kind: MatchKind,
        needle: Vec<u8>,
        case_insensitive: bool,
    ) -> AnalysisResult<Self> {
        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(case_insensitive)
            .build([&needle])
            .map_err(|e| AnalysisError::InvalidQuery(e.to_string()))?;
        Ok(Self {
            raw: raw.to_string(),
            kind,
            needle,
            matcher,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> MatchKind {
        self.kind
    }

    pub fn needle(&self) -> &[u8] {
        &self.needle
    }

    /// Overlap needed between scan windows
    pub fn overlap(&self) -> usize {
        ChunkedScanner::overlap_for(self.needle.len())
    }

    /// Start indices of every (overlapping) occurrence in `data`
    pub fn find_all(&self, data: &[u8]) -> Vec<usize> {
        self.matcher
            .find_overlapping_iter(data)
            .map(|m| m.start())
            .collect()
    }

    /// Source offsets of occurrences first visible in `window`
    pub fn find_in_window<'w>(&'w self, window: &'w Window<'w>) -> impl Iterator<Item = u64> + 'w {
        let len = self.needle.len();
        self.matcher
            .find_overlapping_iter(window.data)
            .filter(move |m| window.is_new_match(m.start(), len))
            .map(move |m| window.global(m.start()))
    }

    /// Byte range to read for a hit at `offset`: (start, length)
    pub fn context_span(&self, offset: u64) -> (u64, usize) {
        match self.kind {
            MatchKind::Hex => (offset.saturating_sub(HEX_CONTEXT_LEAD), HEX_CONTEXT_BYTES),
            MatchKind::Text => {
                let lead = (TEXT_CONTEXT_CHARS.saturating_sub(self.needle.len()) / 2) as u64;
                (offset.saturating_sub(lead), TEXT_CONTEXT_CHARS)
            }
        }
    }

    /// Renders bytes read from [`Self::context_span`]
    pub fn render_context(&self, bytes: &[u8]) -> String {
        match self.kind {
            MatchKind::Hex => hex::encode(bytes),
            MatchKind::Text => bytes
                .iter()
                .take(TEXT_CONTEXT_CHARS)
                .map(|&b| if (0x20..=0x7E).contains(&b) { b as char } else { '.' })
                .collect(),
        }
    }

    /// Context for a hit in a byte source
    pub fn context_at<S>(&self, source: &S, offset: u64) -> Result<String, ByteSourceError>
    where
        S: ByteSource + ?Sized,
    {
        let (start, len) = self.context_span(offset);
        let bytes = source.read_at(start, len)?;
        Ok(self.render_context(&bytes))
    }

    /// Context for a hit in an in-memory buffer
    pub fn context_in(&self, data: &[u8], offset: usize) -> String {
        let (start, len) = self.context_span(offset as u64);
        let start = (start as usize).min(data.len());
        let end = start.saturating_add(len).min(data.len());
        self.render_context(&data[start..end])
    }
}

/// Parses a hex query into bytes
///
/// Strips `0x`/`0X` prefixes, commas and whitespace. Empty input, an odd
/// digit count or a non-hex character is an invalid query.
pub fn parse_hex(query: &str) -> AnalysisResult<Vec<u8>> {
    let digits: String = query
        .replace("0x", "")
        .replace("0X", "")
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if digits.is_empty() {
        return Err(AnalysisError::InvalidQuery("empty hex query".to_string()));
    }
    if digits.len() % 2 != 0 {
        return Err(AnalysisError::InvalidQuery(format!(
            "odd number of hex digits in {:?}",
            query
        )));
    }
    hex::decode(&digits).map_err(|e| AnalysisError::InvalidQuery(format!("{:?}: {}", query, e)))
}

/// Offsets found in one source
#[derive(Debug, Clone, Default)]
pub struct SourceHits {
    pub offsets: Vec<u64>,
    /// A hit past the budget was seen and dropped
    pub overflowed: bool,
    pub outcome: ScanOutcome,
}

/// Finds query offsets in one source through the chunked scanner
///
/// At most `budget` offsets are kept. The scan stops at the first hit past
/// the budget, so a budget of zero only checks whether any hit exists.
pub fn scan_source<S>(
    query: &SearchQuery,
    scanner: &ChunkedScanner,
    source: &S,
    budget: usize,
    cancel: &CancellationToken,
) -> Result<SourceHits, ByteSourceError>
where
    S: ByteSource + ?Sized,
{
    let mut offsets = Vec::new();
    let mut overflowed = false;
    let outcome = scanner.scan(source, query.overlap(), cancel, |window| {
        for offset in query.find_in_window(window) {
            if offsets.len() >= budget {
                overflowed = true;
                return ScanControl::Stop;
            }
            offsets.push(offset);
        }
        ScanControl::Continue
    })?;
    Ok(SourceHits {
        offsets,
        overflowed,
        outcome,
    })
}
