//! Analyze BB backup use case
//!
//! One walk feeds every BB10 check: format classification, the known-path
//! artifact table, key files, `.rem` triage, timestamp recovery, event log
//! sizing, BBThumbs containers and, for records that look encrypted while
//! keys are present, a decryption attempt.

use super::decrypt_rem_file::{DecryptRemFileUseCase, load_key_entries};
use super::detect_backup_format::{classify_tree, read_magics};
use crate::application::dto::{AnalysisConfig, AnalysisSession, RunContext};
use crate::core::{AnalysisError, AnalysisResult};
use crate::domain::entities::{BbAnalysisResult, FileEntry, KeyMaterial, ThumbsContainer};
use crate::domain::repositories::{ArchiveReader, ByteSource, DirectoryWalker};
use crate::domain::services::bb_artifacts::{
    BBTHUMBS_MAGIC, KEY_DUMP_BYTES, count_event_entries, detect_artifacts, is_event_log,
    is_key_file, key_record, rem_record, scan_thumbnails,
};
use crate::domain::services::ChunkedScanner;
use crate::domain::services::date_scanner::{MAX_DATES, scan_dates, select_date_files};
use crate::infrastructure::source::FileSource;
use std::path::Path;

/// Analyze BB backup use case
pub struct AnalyzeBbBackupUseCase<D: DirectoryWalker, A: ArchiveReader> {
    walker: D,
    archives: A,
    decryptor: DecryptRemFileUseCase,
    config: AnalysisConfig,
}

fn read_prefix(entry: &FileEntry, limit: usize) -> Option<Vec<u8>> {
    FileSource::open(&entry.path)
        .and_then(|s| s.read_prefix(limit))
        .map_err(|e| tracing::debug!(path = %entry.relative_path, error = %e, "skipping unreadable file"))
        .ok()
}

impl<D: DirectoryWalker, A: ArchiveReader> AnalyzeBbBackupUseCase<D, A> {
    pub fn new(walker: D, archives: A, config: AnalysisConfig) -> Self {
        Self {
            walker,
            archives,
            decryptor: DecryptRemFileUseCase::new(&config),
            config,
        }
    }

    pub fn execute(
        &self,
        root: &Path,
        session: &AnalysisSession,
        ctx: &RunContext,
    ) -> AnalysisResult<BbAnalysisResult> {
        if !root.exists() {
            return Err(AnalysisError::RootNotFound(root.to_path_buf()));
        }
        let entries = self.walker.walk(root, self.config.max_walk_depth)?;
        tracing::info!(
            session = session.id(),
            root = %root.display(),
            files = entries.len(),
            "starting backup analysis"
        );

        ctx.report(0, "reading file headers");
        let magics = read_magics(&entries, &ctx.phase(0, 5));
        let format = classify_tree(&self.archives, &entries, &magics, &ctx.phase(5, 10));
        let mut result = BbAnalysisResult::new(session.id(), format);

        if !self.cancelled(ctx, &mut result) {
            ctx.report(10, "matching known artifact paths");
            result.artifacts = detect_artifacts(&entries);
        }
        if !self.cancelled(ctx, &mut result) {
            ctx.report(20, "reading key files");
            self.scan_key_files(&entries, &mut result);
        }
        let key_entries: Vec<&FileEntry> = entries.iter().filter(|e| is_key_file(e)).collect();
        let keys = load_key_entries(&key_entries);

        if !self.cancelled(ctx, &mut result) {
            ctx.report(30, "triaging record files");
            self.scan_rem_files(&entries, !keys.is_empty(), ctx, &mut result);
        }
        if !self.cancelled(ctx, &mut result) {
            ctx.report(50, "recovering timestamps");
            self.scan_dates(&entries, ctx, &mut result);
        }
        if !self.cancelled(ctx, &mut result) {
            ctx.report(65, "sizing event logs");
            self.scan_event_logs(&entries, &mut result);
        }
        if !self.cancelled(ctx, &mut result) {
            ctx.report(70, "counting thumbnails");
            self.scan_thumbs(&entries, &magics, ctx, &mut result);
        }
        if !self.cancelled(ctx, &mut result) {
            ctx.report(75, "attempting decryption");
            self.decrypt_records(&entries, &keys, ctx, &mut result);
        }

        ctx.report(100, "analysis complete");
        tracing::info!(
            session = session.id(),
            format = %result.format.format,
            categories = result.found_categories().count(),
            rem_files = result.rem_files.len(),
            dates = result.dates.len(),
            cancelled = result.cancelled,
            "backup analysis finished"
        );
        Ok(result)
    }

    fn cancelled(&self, ctx: &RunContext, result: &mut BbAnalysisResult) -> bool {
        if ctx.is_cancelled() {
            result.cancelled = true;
        }
        result.cancelled
    }

    fn scan_key_files(&self, entries: &[FileEntry], result: &mut BbAnalysisResult) {
        for entry in entries.iter().filter(|e| is_key_file(e)) {
            match read_prefix(entry, KEY_DUMP_BYTES) {
                Some(head) => {
                    result.stats.record_file(head.len() as u64);
                    result.key_files.push(key_record(entry, &head));
                }
                None => result.stats.record_skip(),
            }
        }
    }

    fn scan_rem_files(
        &self,
        entries: &[FileEntry],
        keys_available: bool,
        ctx: &RunContext,
        result: &mut BbAnalysisResult,
    ) {
        for entry in entries.iter().filter(|e| e.has_extension("rem")) {
            if self.cancelled(ctx, result) {
                return;
            }
            match read_prefix(entry, self.config.rem_sample) {
                Some(sample) => {
                    result.stats.record_file(sample.len() as u64);
                    result.rem_files.push(rem_record(entry, &sample, keys_available));
                }
                None => result.stats.record_skip(),
            }
        }
    }

    fn scan_dates(&self, entries: &[FileEntry], ctx: &RunContext, result: &mut BbAnalysisResult) {
        for entry in select_date_files(entries) {
            if result.dates.len() >= MAX_DATES || self.cancelled(ctx, result) {
                break;
            }
            let Some(data) = read_prefix(entry, self.config.date_scan_limit) else {
                result.stats.record_skip();
                continue;
            };
            result.stats.record_file(data.len() as u64);
            result.dates.extend(scan_dates(&entry.relative_path, &data));
        }
        result.dates.truncate(MAX_DATES);
    }

    fn scan_event_logs(&self, entries: &[FileEntry], result: &mut BbAnalysisResult) {
        let log = &mut result.event_log;
        for entry in entries.iter().filter(|e| is_event_log(e)) {
            let Some(data) = read_prefix(entry, self.config.date_scan_limit) else {
                continue;
            };
            let (newlines, markers) = count_event_entries(&data);
            log.files += 1;
            log.newline_count += newlines;
            log.marker_count += markers;
        }
        log.estimated_entries = log.newline_count.max(log.marker_count);
    }

    fn scan_thumbs(
        &self,
        entries: &[FileEntry],
        magics: &[Option<Vec<u8>>],
        ctx: &RunContext,
        result: &mut BbAnalysisResult,
    ) {
        let scanner = ChunkedScanner::new(self.config.chunk_size);
        for (entry, magic) in entries.iter().zip(magics) {
            let is_container = magic
                .as_deref()
                .is_some_and(|m| m.starts_with(&BBTHUMBS_MAGIC));
            if !is_container || self.cancelled(ctx, result) {
                continue;
            }
            let counted = FileSource::open(&entry.path)
                .and_then(|source| scan_thumbnails(&source, &scanner, ctx.cancel_token()));
            match counted {
                Ok(Some(thumbnail_count)) => result.thumbs.push(ThumbsContainer {
                    relative_path: entry.relative_path.clone(),
                    thumbnail_count,
                }),
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(path = %entry.relative_path, error = %e, "thumbnail container unreadable")
                }
            }
        }
    }

    fn decrypt_records(
        &self,
        entries: &[FileEntry],
        keys: &[KeyMaterial],
        ctx: &RunContext,
        result: &mut BbAnalysisResult,
    ) {
        if keys.is_empty() {
            return;
        }
        let candidates: Vec<String> = result
            .rem_files
            .iter()
            .filter(|r| r.decryptable)
            .map(|r| r.relative_path.clone())
            .collect();

        // Progress comes from this loop; attempts only share the token
        let attempt_ctx = RunContext::new().with_cancel(ctx.cancel_token().clone());
        let total = candidates.len();
        for (index, relative_path) in candidates.into_iter().enumerate() {
            if self.cancelled(ctx, result) {
                return;
            }
            ctx.report(75 + (index * 25 / total.max(1)) as u8, &relative_path);
            let Some(entry) = entries.iter().find(|e| e.relative_path == relative_path) else {
                continue;
            };
            let source = match FileSource::open(&entry.path) {
                Ok(source) => source,
                Err(e) => {
                    tracing::debug!(path = %relative_path, error = %e, "record unreadable");
                    continue;
                }
            };
            match self
                .decryptor
                .execute_source(&relative_path, &source, keys, &attempt_ctx)
            {
                Ok(attempt) => result.decryption.push(attempt),
                Err(e) => tracing::debug!(path = %relative_path, error = %e, "decryption skipped"),
            }
        }
    }
}
