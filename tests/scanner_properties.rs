//! Property tests for the chunked scanner and everything built on it
//!
//! Streaming results must not depend on where read boundaries fall.

use proptest::prelude::*;
use remnant::domain::entities::Signature;
use remnant::domain::services::search::scan_source;
use remnant::domain::services::strings::extract_strings;
use remnant::domain::services::{
    CancellationToken, ChunkedScanner, FileCarver, SearchQuery, SignatureSet, StringExtractor,
};
use remnant::domain::repositories::ByteSource;
use remnant::infrastructure::source::MemorySource;

fn small_alphabet() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(vec![b'a', b'b', b'x', 0u8, 0xFF]), 0..600)
}

proptest! {
    #[test]
    fn search_offsets_do_not_depend_on_chunk_size(
        data in small_alphabet(),
        chunk in 1usize..64,
    ) {
        let query = SearchQuery::text("ab", true).unwrap();
        let expected: Vec<u64> = query.find_all(&data).into_iter().map(|i| i as u64).collect();

        let source = MemorySource::new("mem", data);
        let hits = scan_source(
            &query,
            &ChunkedScanner::new(chunk),
            &source,
            usize::MAX,
            &CancellationToken::new(),
        )
        .unwrap();
        prop_assert_eq!(hits.offsets, expected);
        prop_assert!(!hits.overflowed);
        prop_assert_eq!(hits.outcome.bytes_scanned, source.size());
    }

    #[test]
    fn streamed_strings_match_whole_buffer(
        data in small_alphabet(),
        chunk in 1usize..80,
    ) {
        let expected = extract_strings(&data, 3);
        let mut streamed = Vec::new();
        let mut extractor = StringExtractor::new(3);
        for (i, piece) in data.chunks(chunk).enumerate() {
            extractor.feed((i * chunk) as u64, piece, &mut streamed);
        }
        extractor.finish(&mut streamed);
        prop_assert_eq!(streamed, expected);
    }

    #[test]
    fn carve_matches_do_not_depend_on_path(
        gaps in prop::collection::vec((0usize..300, 100usize..400), 1..5),
        chunk in 16usize..256,
    ) {
        let set = SignatureSet::new(vec![Signature::new(
            "jpeg",
            vec![0xFF, 0xD8, 0xFF],
            Some(vec![0xFF, 0xD9]),
            1024,
            "jpg",
        )]);
        let mut data = Vec::new();
        for (gap, len) in &gaps {
            data.extend(std::iter::repeat_n(0x11u8, *gap));
            data.extend_from_slice(&[0xFF, 0xD8, 0xFF]);
            data.extend(std::iter::repeat_n(0x22u8, len - 5));
            data.extend_from_slice(&[0xFF, 0xD9]);
        }
        let source = MemorySource::new("mem", data);
        let cancel = CancellationToken::new();

        let whole = FileCarver::new(set.clone(), ChunkedScanner::new(chunk))
            .find_matches(&source, usize::MAX, &cancel)
            .unwrap();
        let streamed = FileCarver::new(set, ChunkedScanner::new(chunk))
            .with_sync_threshold(0)
            .find_matches(&source, usize::MAX, &cancel)
            .unwrap();

        prop_assert!(!whole.streaming);
        prop_assert!(streamed.streaming);
        prop_assert_eq!(whole.matches.len(), gaps.len());
        prop_assert_eq!(whole.matches, streamed.matches);
    }
}
