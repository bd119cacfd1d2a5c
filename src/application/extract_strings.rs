//! Extract strings use case
//!
//! Streams one file through the chunked scanner, collecting printable runs
//! and measuring the entropy of its leading bytes.

use crate::application::dto::{AnalysisConfig, RunContext};
use crate::core::{AnalysisError, AnalysisResult};
use crate::domain::entities::StringsResult;
use crate::domain::repositories::ByteSource;
use crate::domain::services::entropy::{ENTROPY_SAMPLE, is_likely_encrypted, shannon_entropy};
use crate::domain::services::{ChunkedScanner, ScanControl, StringExtractor};
use crate::infrastructure::source::FileSource;
use std::io;
use std::path::Path;

/// Extract strings use case
pub struct ExtractStringsUseCase {
    config: AnalysisConfig,
}

impl ExtractStringsUseCase {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, path: &Path, ctx: &RunContext) -> AnalysisResult<StringsResult> {
        if !path.exists() {
            return Err(AnalysisError::RootNotFound(path.to_path_buf()));
        }
        if path.is_dir() {
            return Err(AnalysisError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a directory", path.display()),
            )));
        }
        let source = FileSource::open(path)?;
        tracing::info!(path = %path.display(), size = source.size(), "extracting strings");
        self.execute_source(&source, ctx)
    }

    /// Runs over any byte source
    pub fn execute_source<S>(&self, source: &S, ctx: &RunContext) -> AnalysisResult<StringsResult>
    where
        S: ByteSource + ?Sized,
    {
        let mut result = StringsResult::default();

        let sample = source.read_at(0, ENTROPY_SAMPLE)?;
        result.entropy = shannon_entropy(&sample);
        result.likely_encrypted = is_likely_encrypted(result.entropy);

        let cap = self.config.max_strings;
        let size = source.size().max(1);
        let mut extractor = StringExtractor::new(self.config.min_string_length).with_limit(cap);
        let scanner = ChunkedScanner::new(self.config.chunk_size);

        // No pattern spans windows here; the extractor carries the open run
        let outcome = scanner.scan(source, 0, ctx.cancel_token(), |window| {
            if !extractor.feed(window.global(window.carry), window.fresh(), &mut result.strings) {
                return ScanControl::Stop;
            }
            ctx.report(
                (window.end() * 100 / size).min(99) as u8,
                "extracting strings",
            );
            ScanControl::Continue
        })?;

        result.truncated = if outcome.stopped || outcome.cancelled {
            extractor.overflowed()
        } else {
            !extractor.finish(&mut result.strings)
        };
        result.cancelled = outcome.cancelled;
        result.stats.record_file(outcome.bytes_scanned);

        ctx.report(100, "strings complete");
        tracing::info!(
            strings = result.strings.len(),
            entropy = result.entropy,
            likely_encrypted = result.likely_encrypted,
            "string extraction finished"
        );
        Ok(result)
    }
}
