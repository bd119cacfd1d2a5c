//! Printable string extraction
//!
//! A run is a maximal sequence of bytes in `0x20..=0x7E`. Runs of at least
//! the minimum length are reported with their starting offset. The streaming
//! extractor carries an unfinished run from one read into the next, so
//! results do not depend on chunk size.

use crate::domain::entities::{ExtractedString, MAX_STRING_CHARS};

pub const DEFAULT_MIN_LENGTH: usize = 4;
/// Strings kept per run
pub const MAX_STRINGS: usize = 5000;

#[inline]
pub fn is_printable(byte: u8) -> bool {
    (0x20..=0x7E).contains(&byte)
}

/// Iterator over printable runs of a buffer as `(start, bytes)`
#[derive(Debug, Clone)]
pub struct PrintableRuns<'a> {
    data: &'a [u8],
    pos: usize,
    min_length: usize,
}

impl<'a> PrintableRuns<'a> {
    pub fn new(data: &'a [u8], min_length: usize) -> Self {
        Self {
            data,
            pos: 0,
            min_length: min_length.max(1),
        }
    }
}

impl<'a> Iterator for PrintableRuns<'a> {
    type Item = (usize, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.data.len() {
            let rest = &self.data[self.pos..];
            let Some(skip) = rest.iter().position(|&b| is_printable(b)) else {
                self.pos = self.data.len();
                return None;
            };
            let start = self.pos + skip;
            let len = self.data[start..]
                .iter()
                .position(|&b| !is_printable(b))
                .unwrap_or(self.data.len() - start);
            self.pos = start + len;
            if len >= self.min_length {
                return Some((start, &self.data[start..start + len]));
            }
        }
        None
    }
}

/// Number of printable runs of at least `min_length` bytes
pub fn count_strings(data: &[u8], min_length: usize) -> usize {
    PrintableRuns::new(data, min_length).count()
}

/// Extracts every run from an in-memory buffer
pub fn extract_strings(data: &[u8], min_length: usize) -> Vec<ExtractedString> {
    PrintableRuns::new(data, min_length)
        .map(|(start, run)| make_string(start as u64, run, run.len() as u64))
        .collect()
}

fn make_string(offset: u64, text: &[u8], run_length: u64) -> ExtractedString {
    let kept = &text[..text.len().min(MAX_STRING_CHARS)];
    ExtractedString {
        offset,
        // Printable ASCII is valid UTF-8
        value: String::from_utf8_lossy(kept).into_owned(),
        run_length,
        encoding: "ascii",
    }
}

/// Run accumulator for chunked reads
#[derive(Debug, Clone)]
pub struct StringExtractor {
    min_length: usize,
    run_start: u64,
    run_length: u64,
    /// First [`MAX_STRING_CHARS`] bytes of the current run
    prefix: Vec<u8>,
    /// Most strings `out` may hold
    limit: usize,
    overflowed: bool,
}

impl StringExtractor {
    pub fn new(min_length: usize) -> Self {
        Self {
            min_length: min_length.max(1),
            run_start: 0,
            run_length: 0,
            prefix: Vec::new(),
            limit: usize::MAX,
            overflowed: false,
        }
    }

    /// Stops collecting once the output holds `limit` strings
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// True once a run was dropped because the output was full
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Consumes `data`, which starts at source offset `offset` and must
    /// directly follow the previously fed bytes.
    ///
    /// Returns `false` (and stops early) when a completed run finds `out`
    /// already holding `limit` strings.
    pub fn feed(&mut self, offset: u64, data: &[u8], out: &mut Vec<ExtractedString>) -> bool {
        if self.overflowed {
            return false;
        }
        for (i, &byte) in data.iter().enumerate() {
            if is_printable(byte) {
                if self.run_length == 0 {
                    self.run_start = offset + i as u64;
                }
                self.run_length += 1;
                if self.prefix.len() < MAX_STRING_CHARS {
                    self.prefix.push(byte);
                }
            } else if let Some(s) = self.close_run() {
                if out.len() >= self.limit {
                    self.overflowed = true;
                    return false;
                }
                out.push(s);
            }
        }
        true
    }

    /// Flushes a run that reaches the end of the source
    ///
    /// Returns `false` when that run did not fit under the limit.
    pub fn finish(mut self, out: &mut Vec<ExtractedString>) -> bool {
        if self.overflowed {
            return false;
        }
        match self.close_run() {
            Some(_) if out.len() >= self.limit => false,
            Some(s) => {
                out.push(s);
                true
            }
            None => true,
        }
    }

    fn close_run(&mut self) -> Option<ExtractedString> {
        let result = (self.run_length >= self.min_length as u64)
            .then(|| make_string(self.run_start, &self.prefix, self.run_length));
        self.run_length = 0;
        self.prefix.clear();
        result
    }
}
