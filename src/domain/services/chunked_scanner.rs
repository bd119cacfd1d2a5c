//! Chunked pattern scanner
//!
//! Reads a byte source in bounded windows that re-read the last `overlap`
//! bytes of the previous window, so a pattern straddling a read boundary is
//! still seen in one piece. Memory use is O(chunk size) regardless of the
//! source length.

use super::cancellation::CancellationToken;
use crate::domain::repositories::{ByteSource, ByteSourceError};

/// Default read size for streaming scans
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024 * 1024;

/// One read window
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    /// Source offset of `data[0]`
    pub offset: u64,
    pub data: &'a [u8],
    /// Leading bytes re-read from the previous window
    pub carry: usize,
}

impl<'a> Window<'a> {
    /// A single window covering a whole in-memory buffer
    pub fn whole(data: &'a [u8]) -> Self {
        Self {
            offset: 0,
            data,
            carry: 0,
        }
    }

    #[inline]
    pub fn global(&self, index: usize) -> u64 {
        self.offset + index as u64
    }

    /// Source offset one past the last byte of the window
    #[inline]
    pub fn end(&self) -> u64 {
        self.offset + self.data.len() as u64
    }

    /// Whether a match at `start` of `len` bytes was not already visible to
    /// the previous window.
    ///
    /// The previous window ended exactly where the carried prefix ends, so
    /// only matches lying wholly inside the prefix were seen before.
    #[inline]
    pub fn is_new_match(&self, start: usize, len: usize) -> bool {
        start + len > self.carry
    }

    /// The bytes this window reads for the first time
    pub fn fresh(&self) -> &'a [u8] {
        &self.data[self.carry.min(self.data.len())..]
    }
}

/// What the visitor wants after a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanControl {
    Continue,
    /// A result cap was reached
    Stop,
}

/// How a scan ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Bytes visited for the first time
    pub bytes_scanned: u64,
    pub windows: usize,
    /// The visitor asked to stop
    pub stopped: bool,
    pub cancelled: bool,
}

/// Overlapping-window reader
#[derive(Debug, Clone, Copy)]
pub struct ChunkedScanner {
    chunk_size: usize,
}

impl Default for ChunkedScanner {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl ChunkedScanner {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap needed so a pattern of `max_pattern_len` bytes is never split
    pub fn overlap_for(max_pattern_len: usize) -> usize {
        max_pattern_len.saturating_sub(1)
    }

    /// Visits `source` window by window
    ///
    /// Each read covers `chunk_size + carry` bytes starting `carry` bytes
    /// before the first unscanned offset. The cursor then advances by the
    /// number of new bytes read, and `carry` becomes `overlap`. The loop ends
    /// when a read yields no new bytes, the visitor returns
    /// [`ScanControl::Stop`], or `cancel` fires.
    pub fn scan<S, F>(
        &self,
        source: &S,
        overlap: usize,
        cancel: &CancellationToken,
        mut visit: F,
    ) -> Result<ScanOutcome, ByteSourceError>
    where
        S: ByteSource + ?Sized,
        F: FnMut(&Window<'_>) -> ScanControl,
    {
        let mut outcome = ScanOutcome::default();
        let mut cursor: u64 = 0;
        let mut carry: usize = 0;

        loop {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                break;
            }

            let start = cursor.saturating_sub(carry as u64);
            let effective_carry = (cursor - start) as usize;
            let data = source.read_at(start, self.chunk_size + effective_carry)?;

            if data.len() <= effective_carry {
                break;
            }

            let window = Window {
                offset: start,
                data: &data,
                carry: effective_carry,
            };
            let control = visit(&window);

            let fresh = (data.len() - effective_carry) as u64;
            cursor += fresh;
            outcome.bytes_scanned += fresh;
            outcome.windows += 1;

            if control == ScanControl::Stop {
                outcome.stopped = true;
                break;
            }

            carry = overlap;
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::source::MemorySource;

    fn naive_offsets(data: &[u8], needle: &[u8]) -> Vec<u64> {
        data.windows(needle.len())
            .enumerate()
            .filter(|(_, w)| *w == needle)
            .map(|(i, _)| i as u64)
            .collect()
    }

    fn chunked_offsets(data: &[u8], needle: &[u8], chunk: usize) -> Vec<u64> {
        let source = MemorySource::new("mem", data.to_vec());
        let scanner = ChunkedScanner::new(chunk);
        let mut found = Vec::new();
        scanner
            .scan(
                &source,
                ChunkedScanner::overlap_for(needle.len()),
                &CancellationToken::new(),
                |w| {
                    for (i, win) in w.data.windows(needle.len()).enumerate() {
                        if win == needle && w.is_new_match(i, needle.len()) {
                            found.push(w.global(i));
                        }
                    }
                    ScanControl::Continue
                },
            )
            .unwrap();
        found
    }

    #[test]
    fn finds_needle_straddling_boundary() {
        let mut data = vec![0u8; 64];
        data[14..18].copy_from_slice(b"ABCD");
        assert_eq!(chunked_offsets(&data, b"ABCD", 16), vec![14]);
    }

    #[test]
    fn overlapping_occurrences_reported_once() {
        let data = b"AAAAAAAAAAAAAAAAAAAAAAAAA".to_vec();
        assert_eq!(chunked_offsets(&data, b"AAA", 4), naive_offsets(&data, b"AAA"));
    }

    #[test]
    fn visits_every_byte_once() {
        let source = MemorySource::new("mem", (0..100u8).collect());
        let mut fresh = Vec::new();
        let outcome = ChunkedScanner::new(7)
            .scan(&source, 3, &CancellationToken::new(), |w| {
                fresh.extend_from_slice(w.fresh());
                ScanControl::Continue
            })
            .unwrap();
        assert_eq!(fresh, (0..100u8).collect::<Vec<_>>());
        assert_eq!(outcome.bytes_scanned, 100);
    }

    #[test]
    fn stops_on_request_and_on_cancel() {
        let source = MemorySource::new("mem", vec![0u8; 100]);
        let outcome = ChunkedScanner::new(10)
            .scan(&source, 0, &CancellationToken::new(), |_| ScanControl::Stop)
            .unwrap();
        assert!(outcome.stopped);
        assert_eq!(outcome.windows, 1);

        let token = CancellationToken::new();
        token.cancel();
        let outcome = ChunkedScanner::new(10)
            .scan(&source, 0, &token, |_| ScanControl::Continue)
            .unwrap();
        assert!(outcome.cancelled);
        assert_eq!(outcome.bytes_scanned, 0);
    }

    #[test]
    fn empty_source_yields_no_windows() {
        let source = MemorySource::new("mem", Vec::new());
        let outcome = ChunkedScanner::new(10)
            .scan(&source, 3, &CancellationToken::new(), |_| ScanControl::Continue)
            .unwrap();
        assert_eq!(outcome.windows, 0);
    }
}
