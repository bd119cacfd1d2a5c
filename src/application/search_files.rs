//! Search files use case
//!
//! Runs one text or hex query over every file below a root, and optionally
//! over the members of zip-like archives.

use crate::application::dto::{AnalysisConfig, RunContext};
use crate::core::{AnalysisError, AnalysisResult};
use crate::domain::entities::{FileEntry, MatchKind, SearchHit, SearchResult};
use crate::domain::repositories::{ArchiveReader, DirectoryWalker};
use crate::domain::services::search::scan_source;
use crate::domain::services::{ChunkedScanner, SearchQuery};
use crate::infrastructure::source::FileSource;
use std::path::Path;

/// A query as received from the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub kind: MatchKind,
    /// Text mode only
    pub case_sensitive: bool,
    pub match_in_archives: bool,
}

impl SearchRequest {
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            kind: MatchKind::Text,
            case_sensitive: false,
            match_in_archives: false,
        }
    }

    pub fn hex(query: impl Into<String>) -> Self {
        Self {
            kind: MatchKind::Hex,
            ..Self::text(query)
        }
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    pub fn in_archives(mut self, yes: bool) -> Self {
        self.match_in_archives = yes;
        self
    }

    /// Compiles the query; malformed input is `InvalidQuery`
    pub fn compile(&self) -> AnalysisResult<SearchQuery> {
        SearchQuery::new(&self.query, self.kind, self.case_sensitive)
    }
}

/// Search files use case
pub struct SearchFilesUseCase<D: DirectoryWalker, A: ArchiveReader> {
    walker: D,
    archives: A,
    config: AnalysisConfig,
}

impl<D: DirectoryWalker, A: ArchiveReader> SearchFilesUseCase<D, A> {
    pub fn new(walker: D, archives: A, config: AnalysisConfig) -> Self {
        Self {
            walker,
            archives,
            config,
        }
    }

    pub fn execute(
        &self,
        root: &Path,
        request: &SearchRequest,
        ctx: &RunContext,
    ) -> AnalysisResult<SearchResult> {
        let query = request.compile()?;
        if !root.exists() {
            return Err(AnalysisError::RootNotFound(root.to_path_buf()));
        }

        let entries = self.walker.walk(root, self.config.max_walk_depth)?;
        let scanner = ChunkedScanner::new(self.config.chunk_size);
        let cap = self.config.max_search_hits;
        tracing::info!(
            root = %root.display(),
            files = entries.len(),
            kind = %query.kind(),
            "starting search"
        );

        let mut result = SearchResult::default();
        let total = entries.len();

        for (index, entry) in entries.iter().enumerate() {
            if ctx.is_cancelled() {
                result.cancelled = true;
                break;
            }
            ctx.report_file(index, total, &entry.relative_path);

            // Once full, files are only scanned up to their first hit, which
            // marks the result truncated and ends the run
            if !self.search_file(entry, &query, &scanner, cap, ctx, &mut result) {
                result.stats.record_skip();
                continue;
            }

            if request.match_in_archives
                && !result.truncated
                && self.archives.is_archive(&entry.path)
            {
                self.search_archive(entry, &query, cap, &mut result);
            }
            if result.truncated {
                break;
            }
        }

        ctx.report(100, "search complete");
        tracing::info!(
            hits = result.hits.len(),
            files = result.stats.files_scanned,
            truncated = result.truncated,
            "search finished"
        );
        Ok(result)
    }

    /// Raw scan of one file; false when the file could not be read
    fn search_file(
        &self,
        entry: &FileEntry,
        query: &SearchQuery,
        scanner: &ChunkedScanner,
        cap: usize,
        ctx: &RunContext,
        result: &mut SearchResult,
    ) -> bool {
        let source = match FileSource::open(&entry.path) {
            Ok(source) => source,
            Err(e) => {
                tracing::debug!(path = %entry.relative_path, error = %e, "skipping unreadable file");
                return false;
            }
        };

        let budget = cap.saturating_sub(result.hits.len());
        let found = match scan_source(query, scanner, &source, budget, ctx.cancel_token()) {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!(path = %entry.relative_path, error = %e, "read failed; file skipped");
                return false;
            }
        };
        result.stats.record_file(found.outcome.bytes_scanned);
        result.cancelled |= found.outcome.cancelled;
        result.truncated |= found.overflowed;

        for offset in found.offsets {
            let context = match query.context_at(&source, offset) {
                Ok(context) => context,
                Err(e) => {
                    tracing::debug!(path = %entry.relative_path, offset, error = %e, "context unreadable");
                    String::new()
                }
            };
            result.hits.push(SearchHit {
                source: entry.relative_path.clone(),
                offset,
                context,
                kind: query.kind(),
                query: query.raw().to_string(),
            });
        }
        true
    }

    fn search_archive(
        &self,
        entry: &FileEntry,
        query: &SearchQuery,
        cap: usize,
        result: &mut SearchResult,
    ) {
        let outcome = self.archives.for_each_member(&entry.path, &mut |member, data| {
            for start in query.find_all(data) {
                if result.hits.len() >= cap {
                    result.truncated = true;
                    return false;
                }
                result.hits.push(SearchHit {
                    source: format!("{}!{}", entry.relative_path, member),
                    offset: start as u64,
                    context: query.context_in(data, start),
                    kind: query.kind(),
                    query: query.raw().to_string(),
                });
            }
            true
        });
        if let Err(e) = outcome {
            tracing::debug!(path = %entry.relative_path, error = %e, "archive not searchable");
        }
    }
}
