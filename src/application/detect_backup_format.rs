//! Detect backup format use case

use crate::application::dto::{AnalysisConfig, RunContext};
use crate::core::{AnalysisError, AnalysisResult};
use crate::domain::entities::{BackupFormatResult, FileEntry};
use crate::domain::repositories::{ArchiveReader, ByteSource, DirectoryWalker};
use crate::domain::services::format_classifier::{MAGIC_LEN, MAX_ARCHIVE_MEMBERS};
use crate::domain::services::{TreeEvidence, classify};
use crate::infrastructure::source::FileSource;
use std::path::Path;

/// Leading bytes of a file, or `None` if it cannot be read
pub fn read_magic(entry: &FileEntry) -> Option<Vec<u8>> {
    let source = FileSource::open(&entry.path)
        .map_err(|e| tracing::debug!(path = %entry.relative_path, error = %e, "magic unreadable"))
        .ok()?;
    source.read_at(0, MAGIC_LEN).ok()
}

/// Leading bytes of each entry, stopping early on cancellation
///
/// The result may be shorter than `entries` when the run was cancelled.
pub fn read_magics(entries: &[FileEntry], ctx: &RunContext) -> Vec<Option<Vec<u8>>> {
    let total = entries.len();
    let mut magics = Vec::with_capacity(total);
    for (index, entry) in entries.iter().enumerate() {
        if ctx.is_cancelled() {
            break;
        }
        ctx.report_file(index, total, &entry.relative_path);
        magics.push(read_magic(entry));
    }
    magics
}

/// Detect backup format use case
pub struct DetectBackupFormatUseCase<D: DirectoryWalker, A: ArchiveReader> {
    walker: D,
    archives: A,
    config: AnalysisConfig,
}

impl<D: DirectoryWalker, A: ArchiveReader> DetectBackupFormatUseCase<D, A> {
    pub fn new(walker: D, archives: A, config: AnalysisConfig) -> Self {
        Self {
            walker,
            archives,
            config,
        }
    }

    pub fn execute(&self, root: &Path, ctx: &RunContext) -> AnalysisResult<BackupFormatResult> {
        if !root.exists() {
            return Err(AnalysisError::RootNotFound(root.to_path_buf()));
        }
        let entries = self.walker.walk(root, self.config.max_walk_depth)?;
        let magics = read_magics(&entries, &ctx.phase(0, 50));
        let result = classify_tree(&self.archives, &entries, &magics, &ctx.phase(50, 100));
        tracing::info!(
            format = %result.format,
            confidence = result.confidence,
            "backup format detected"
        );
        Ok(result)
    }
}

/// Classifies an already walked tree
///
/// `magics[i]` holds the leading bytes of `entries[i]`. Members of `.bbb`
/// files are listed through `archives`.
pub fn classify_tree<A: ArchiveReader + ?Sized>(
    archives: &A,
    entries: &[FileEntry],
    magics: &[Option<Vec<u8>>],
    ctx: &RunContext,
) -> BackupFormatResult {
    let mut evidence = TreeEvidence::new();
    let total = entries.len();

    for (index, entry) in entries.iter().enumerate() {
        if ctx.is_cancelled() {
            break;
        }
        ctx.report_file(index, total, &entry.relative_path);

        let magic = magics.get(index).and_then(|m| m.as_deref());
        evidence.observe(entry, magic);

        if entry.has_extension("bbb") {
            let room = MAX_ARCHIVE_MEMBERS.saturating_sub(evidence.archive_members.len());
            match archives.member_names(&entry.path, room) {
                Ok(names) => evidence.add_archive_members(&entry.relative_path, names),
                Err(e) => {
                    tracing::debug!(path = %entry.relative_path, error = %e, "bbb not readable as zip")
                }
            }
        }
    }

    classify(&evidence)
}
