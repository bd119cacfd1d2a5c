//! File carver
//!
//! Pairs signature headers with footers across read windows. Carving is a
//! small state machine: every header opens a pending match
//! (`awaiting-footer`), every footer closes the pending matches of its
//! signature, and a pending match is abandoned once `max_size` bytes have
//! gone by without a footer. The state survives window boundaries, so a
//! footer far beyond the chunk that held its header is still found.

use super::cancellation::CancellationToken;
use super::chunked_scanner::{ChunkedScanner, ScanControl, Window};
use super::signature_registry::{PatternRole, SignatureSet};
use crate::domain::entities::CarveMatch;
use crate::domain::repositories::{ByteSource, ByteSourceError};

/// Matches shorter than this are treated as false positives
pub const MIN_ARTIFACT_SIZE: u64 = 100;
/// Files at or above this size are carved by streaming
pub const DEFAULT_SYNC_THRESHOLD: u64 = 512 * 1024 * 1024;
/// Artifact caps per run
pub const MAX_ARTIFACTS_WHOLE_FILE: usize = 500;
pub const MAX_ARTIFACTS_STREAMING: usize = 200;
/// Upper bound on simultaneously open matches
pub const MAX_PENDING_MATCHES: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingMatch {
    signature: usize,
    offset: u64,
}

/// Header/footer pairing state carried across windows
#[derive(Debug)]
pub struct CarveStateMachine<'s> {
    set: &'s SignatureSet,
    source_len: u64,
    min_size: u64,
    pending: Vec<PendingMatch>,
    abandoned: usize,
    dropped: usize,
    /// Completions after which feeding stops
    limit: usize,
    emitted: usize,
    halted: bool,
}

impl<'s> CarveStateMachine<'s> {
    pub fn new(set: &'s SignatureSet, source_len: u64) -> Self {
        Self {
            set,
            source_len,
            min_size: MIN_ARTIFACT_SIZE,
            pending: Vec::new(),
            abandoned: 0,
            dropped: 0,
            limit: usize::MAX,
            emitted: 0,
            halted: false,
        }
    }

    /// Stops reading events once `limit` matches have completed
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// True once the limit cut a window short
    pub fn halted(&self) -> bool {
        self.halted
    }

    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Number of matches still awaiting a footer
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Matches given up on (no footer within `max_size`, or too many open)
    pub fn abandoned(&self) -> usize {
        self.abandoned + self.dropped
    }

    /// Processes one window and returns the matches it completed
    pub fn feed(&mut self, window: &Window<'_>) -> Vec<CarveMatch> {
        let set = self.set;
        let mut completed = Vec::new();
        if self.halted {
            return completed;
        }

        for event in set.events(window.data) {
            if self.emitted + completed.len() >= self.limit {
                self.halted = true;
                break;
            }
            if !window.is_new_match(event.start, event.len) {
                continue;
            }
            let Some(sig) = set.get(event.signature) else {
                continue;
            };
            let pos = window.global(event.start);

            match event.role {
                PatternRole::Footer => {
                    let footer_end = pos + event.len as u64;
                    let end = (footer_end + sig.trailer()).min(self.source_len);
                    let header_len = sig.header().len() as u64;
                    let min_size = self.min_size;
                    let mut closed_early = 0usize;

                    self.pending.retain(|p| {
                        if p.signature != event.signature || p.offset + header_len > pos {
                            return true;
                        }
                        if footer_end - p.offset > sig.max_size() {
                            closed_early += 1;
                            return false;
                        }
                        let length = end - p.offset;
                        if length >= min_size {
                            completed.push(CarveMatch {
                                signature: p.signature,
                                offset: p.offset,
                                length,
                            });
                        } else {
                            tracing::trace!(offset = p.offset, length, "discarding short match");
                        }
                        false
                    });
                    self.abandoned += closed_early;
                }
                PatternRole::Header => {
                    if sig.footer().is_none() {
                        let length = sig.max_size().min(self.source_len.saturating_sub(pos));
                        if length >= self.min_size {
                            completed.push(CarveMatch {
                                signature: event.signature,
                                offset: pos,
                                length,
                            });
                        }
                    } else if self.pending.len() < MAX_PENDING_MATCHES {
                        self.pending.push(PendingMatch {
                            signature: event.signature,
                            offset: pos,
                        });
                    } else {
                        self.dropped += 1;
                        tracing::debug!(offset = pos, signature = sig.name(), "too many open matches; header dropped");
                    }
                }
            }
        }

        self.emitted += completed.len();
        if !self.halted {
            self.expire(window.end());
        }
        completed
    }

    /// Abandons matches that can no longer see a footer within `max_size`
    ///
    /// Every footer ending at or before `scanned_to` has been seen, so a
    /// match whose size bound ends there is finished.
    fn expire(&mut self, scanned_to: u64) {
        let set = self.set;
        let before = self.pending.len();
        self.pending.retain(|p| {
            set.get(p.signature)
                .map(|sig| p.offset + sig.max_size() > scanned_to)
                .unwrap_or(false)
        });
        self.abandoned += before - self.pending.len();
    }
}

/// How a single source was carved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarveOutcome {
    /// Completed matches ordered by offset
    pub matches: Vec<CarveMatch>,
    /// The streaming path was used
    pub streaming: bool,
    /// The artifact budget ran out
    pub truncated: bool,
    pub cancelled: bool,
    pub abandoned: usize,
    pub bytes_scanned: u64,
}

/// Finds carvable matches in byte sources
#[derive(Debug, Clone)]
pub struct FileCarver {
    set: SignatureSet,
    scanner: ChunkedScanner,
    sync_threshold: u64,
    min_size: u64,
}

impl FileCarver {
    pub fn new(set: SignatureSet, scanner: ChunkedScanner) -> Self {
        Self {
            set,
            scanner,
            sync_threshold: DEFAULT_SYNC_THRESHOLD,
            min_size: MIN_ARTIFACT_SIZE,
        }
    }

    /// Sets the size at which carving switches to the streaming path
    pub fn with_sync_threshold(mut self, threshold: u64) -> Self {
        self.sync_threshold = threshold;
        self
    }

    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    pub fn signatures(&self) -> &SignatureSet {
        &self.set
    }

    /// Whether a source of `size` bytes is carved by streaming
    pub fn is_streaming(&self, size: u64) -> bool {
        size >= self.sync_threshold
    }

    /// Carves `source`, completing at most `budget` matches
    pub fn find_matches<S>(
        &self,
        source: &S,
        budget: usize,
        cancel: &CancellationToken,
    ) -> Result<CarveOutcome, ByteSourceError>
    where
        S: ByteSource + ?Sized,
    {
        let size = source.size();
        let mut outcome = CarveOutcome {
            streaming: self.is_streaming(size),
            ..CarveOutcome::default()
        };
        if budget == 0 {
            outcome.truncated = true;
            return Ok(outcome);
        }
        if self.set.is_empty() || size == 0 {
            return Ok(outcome);
        }

        let mut machine = CarveStateMachine::new(&self.set, size)
            .with_min_size(self.min_size)
            .with_limit(budget);

        if outcome.streaming {
            let overlap = ChunkedScanner::overlap_for(self.set.max_pattern_len());
            let scan = self.scanner.scan(source, overlap, cancel, |window| {
                outcome.matches.extend(machine.feed(window));
                if machine.halted() || outcome.matches.len() >= budget {
                    ScanControl::Stop
                } else {
                    ScanControl::Continue
                }
            })?;
            outcome.cancelled = scan.cancelled;
            outcome.bytes_scanned = scan.bytes_scanned;
        } else {
            let owned;
            let data = match source.as_slice() {
                Some(slice) => slice,
                None => {
                    owned = source.read_at(0, size as usize)?;
                    &owned[..]
                }
            };
            outcome.matches = machine.feed(&Window::whole(data));
            outcome.bytes_scanned = data.len() as u64;
        }

        if outcome.matches.len() >= budget {
            outcome.truncated =
                outcome.matches.len() > budget || machine.pending() > 0 || machine.halted();
            outcome.matches.truncate(budget);
        }
        outcome.abandoned = machine.abandoned();
        outcome.matches.sort_by_key(|m| (m.offset, m.signature));
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Signature;
    use crate::domain::services::SignatureRegistry;
    use crate::infrastructure::source::MemorySource;

    fn jpeg_only() -> SignatureSet {
        SignatureSet::new(vec![Signature::new(
            "jpeg",
            vec![0xFF, 0xD8, 0xFF],
            Some(vec![0xFF, 0xD9]),
            4096,
            "jpg",
        )])
    }

    fn embed_jpeg(data: &mut [u8], at: usize, len: usize) {
        data[at..at + 3].copy_from_slice(&[0xFF, 0xD8, 0xFF]);
        data[at + len - 2..at + len].copy_from_slice(&[0xFF, 0xD9]);
    }

    #[test]
    fn footer_beyond_header_chunk_is_found_when_streaming() {
        let mut data = vec![0u8; 2000];
        embed_jpeg(&mut data, 10, 1500);
        let source = MemorySource::new("mem", data);
        let carver = FileCarver::new(jpeg_only(), ChunkedScanner::new(64)).with_sync_threshold(0);

        let outcome = carver
            .find_matches(&source, 10, &CancellationToken::new())
            .unwrap();
        assert!(outcome.streaming);
        assert_eq!(
            outcome.matches,
            vec![CarveMatch {
                signature: 0,
                offset: 10,
                length: 1500
            }]
        );
    }

    #[test]
    fn pending_match_abandoned_after_max_size() {
        let mut data = vec![0u8; 10_000];
        data[0..3].copy_from_slice(&[0xFF, 0xD8, 0xFF]);
        data[9000..9002].copy_from_slice(&[0xFF, 0xD9]);
        let source = MemorySource::new("mem", data);
        let carver = FileCarver::new(jpeg_only(), ChunkedScanner::new(256)).with_sync_threshold(0);

        let outcome = carver
            .find_matches(&source, 10, &CancellationToken::new())
            .unwrap();
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.abandoned, 1);
    }

    #[test]
    fn short_matches_are_discarded() {
        let mut data = vec![0u8; 500];
        embed_jpeg(&mut data, 0, 50);
        let source = MemorySource::new("mem", data);
        let carver = FileCarver::new(jpeg_only(), ChunkedScanner::default());
        let outcome = carver
            .find_matches(&source, 10, &CancellationToken::new())
            .unwrap();
        assert!(outcome.matches.is_empty());
    }

    #[test]
    fn footerless_signature_takes_fixed_window() {
        let set = SignatureRegistry::default_signatures().snapshot();
        let mut data = vec![0u8; 3000];
        data[1000..1016].copy_from_slice(b"SQLite format 3\0");
        let source = MemorySource::new("mem", data);
        let carver = FileCarver::new(set, ChunkedScanner::default());
        let outcome = carver
            .find_matches(&source, 10, &CancellationToken::new())
            .unwrap();
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].offset, 1000);
        assert_eq!(outcome.matches[0].length, 2000);
    }

    #[test]
    fn budget_truncates() {
        let mut data = vec![0u8; 4000];
        for i in 0..3 {
            embed_jpeg(&mut data, i * 1000, 500);
        }
        let source = MemorySource::new("mem", data);
        let carver = FileCarver::new(jpeg_only(), ChunkedScanner::default());
        let outcome = carver
            .find_matches(&source, 2, &CancellationToken::new())
            .unwrap();
        assert_eq!(outcome.matches.len(), 2);
        assert!(outcome.truncated);
    }

    #[test]
    fn limit_stops_reading_a_dense_window() {
        let set = SignatureSet::new(vec![Signature::new("tag", b"TG".to_vec(), None, 10, "bin")]);
        let data = b"TG".repeat(50_000);
        let mut machine = CarveStateMachine::new(&set, data.len() as u64)
            .with_min_size(1)
            .with_limit(5);
        let completed = machine.feed(&Window::whole(&data));
        assert_eq!(completed.len(), 5);
        assert!(machine.halted());
        assert!(machine.feed(&Window::whole(&data)).is_empty());
    }

    #[test]
    fn footer_inside_header_does_not_close_it() {
        // The inner footer ends first, so it is yielded before the header
        let set = SignatureSet::new(vec![Signature::new(
            "inner",
            b"HEAD!ER".to_vec(),
            Some(b"!".to_vec()),
            4096,
            "bin",
        )]);
        let mut data = vec![b'.'; 300];
        data[10..17].copy_from_slice(b"HEAD!ER");
        data[250] = b'!';
        let mut machine = CarveStateMachine::new(&set, data.len() as u64);
        let completed = machine.feed(&Window::whole(&data));
        assert_eq!(
            completed,
            vec![CarveMatch {
                signature: 0,
                offset: 10,
                length: 241
            }]
        );
    }

    #[test]
    fn streaming_and_whole_file_agree() {
        let mut data = vec![0x11u8; 6000];
        embed_jpeg(&mut data, 100, 900);
        embed_jpeg(&mut data, 2500, 3000);
        let whole = FileCarver::new(jpeg_only(), ChunkedScanner::default())
            .find_matches(&MemorySource::new("a", data.clone()), 100, &CancellationToken::new())
            .unwrap();
        let streamed = FileCarver::new(jpeg_only(), ChunkedScanner::new(37))
            .with_sync_threshold(0)
            .find_matches(&MemorySource::new("b", data), 100, &CancellationToken::new())
            .unwrap();
        assert_eq!(whole.matches, streamed.matches);
        assert_eq!(whole.matches.len(), 2);
    }
}
