//! Carve files use case
//!
//! Walks a tree and carves embedded files out of every file in it. Small
//! inputs are memory-mapped and matched in one pass; large ones stream
//! through the chunked scanner.

use crate::application::dto::{AnalysisConfig, RunContext};
use crate::core::{AnalysisError, AnalysisResult};
use crate::domain::entities::{CarveMatch, CarveResult, CarvedArtifact, FileEntry, RunStats};
use crate::domain::repositories::{ArtifactWriter, ArtifactWriterError, ByteSource, DirectoryWalker};
use crate::domain::services::{ChunkedScanner, FileCarver, SharedSignatureRegistry};
use crate::infrastructure::source::open_source;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Carve files use case
pub struct CarveFilesUseCase<D: DirectoryWalker> {
    walker: D,
    registry: SharedSignatureRegistry,
    config: AnalysisConfig,
}

impl<D: DirectoryWalker> CarveFilesUseCase<D> {
    pub fn new(walker: D, registry: SharedSignatureRegistry, config: AnalysisConfig) -> Self {
        Self {
            walker,
            registry,
            config,
        }
    }

    /// Carves every file below `root` into `writer`
    pub fn execute<W: ArtifactWriter>(
        &self,
        root: &Path,
        writer: &W,
        ctx: &RunContext,
    ) -> AnalysisResult<CarveResult> {
        let start_time = Instant::now();
        if !root.exists() {
            return Err(AnalysisError::RootNotFound(root.to_path_buf()));
        }

        // Toggles made after this point only affect later runs
        let set = self.registry.read().snapshot();
        let carver = FileCarver::new(set, ChunkedScanner::new(self.config.chunk_size))
            .with_sync_threshold(self.config.sync_threshold);

        let entries = self.walker.walk(root, self.config.max_walk_depth)?;
        tracing::info!(
            root = %root.display(),
            files = entries.len(),
            signatures = carver.signatures().signatures().len(),
            "starting carve"
        );

        let mut result = CarveResult::default();
        let total = entries.len();

        for (index, entry) in entries.iter().enumerate() {
            if ctx.is_cancelled() {
                result.cancelled = true;
                break;
            }
            ctx.report_file(index, total, &entry.relative_path);

            let cap = if carver.is_streaming(entry.size) {
                self.config.max_artifacts_streaming
            } else {
                self.config.max_artifacts_whole_file
            };
            let budget = cap.saturating_sub(result.artifacts.len());
            if budget == 0 {
                result.truncated = true;
                continue;
            }

            let source = match open_source(&entry.path, entry.size, self.config.sync_threshold) {
                Ok(source) => source,
                Err(e) => {
                    tracing::debug!(path = %entry.relative_path, error = %e, "skipping unreadable file");
                    result.stats.record_skip();
                    continue;
                }
            };

            let outcome = match carver.find_matches(source.as_ref(), budget, ctx.cancel_token()) {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::debug!(path = %entry.relative_path, error = %e, "read failed; file skipped");
                    result.stats.record_skip();
                    continue;
                }
            };
            result.stats.record_file(outcome.bytes_scanned);
            result.truncated |= outcome.truncated;
            if outcome.abandoned > 0 {
                tracing::debug!(
                    path = %entry.relative_path,
                    abandoned = outcome.abandoned,
                    "headers without a footer in range"
                );
            }

            let tag = source_tag(&entry.relative_path);
            for m in &outcome.matches {
                if let Some(artifact) =
                    Self::persist(&carver, entry, &tag, source.as_ref(), m, writer, &mut result.stats)
                {
                    result.add_artifact(artifact);
                }
            }

            if outcome.cancelled {
                result.cancelled = true;
                break;
            }
        }

        result.duration = start_time.elapsed();
        ctx.report(100, "carve complete");
        tracing::info!(
            artifacts = result.artifacts.len(),
            files = result.stats.files_scanned,
            skipped = result.stats.files_skipped,
            truncated = result.truncated,
            cancelled = result.cancelled,
            "carve finished"
        );
        Ok(result)
    }

    /// Reads and writes one match; `None` when the match is skipped
    ///
    /// Write failures are logged and counted; they never end the run.
    fn persist<W: ArtifactWriter>(
        carver: &FileCarver,
        entry: &FileEntry,
        tag: &str,
        source: &dyn ByteSource,
        m: &CarveMatch,
        writer: &W,
        stats: &mut RunStats,
    ) -> Option<CarvedArtifact> {
        let sig = carver.signatures().get(m.signature)?;

        let owned;
        let bytes: &[u8] = match source.as_slice() {
            Some(all) => {
                let start = m.offset as usize;
                let end = (m.end() as usize).min(all.len());
                &all[start.min(end)..end]
            }
            None => match source.read_at(m.offset, m.length as usize) {
                Ok(data) => {
                    owned = data;
                    &owned
                }
                Err(e) => {
                    tracing::debug!(path = %entry.relative_path, offset = m.offset, error = %e, "match unreadable");
                    return None;
                }
            },
        };

        let name = CarvedArtifact::file_name(&entry.relative_path, tag, m.offset, sig.extension());
        let output_path = match write_unique(writer, &name, bytes) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(path = %entry.relative_path, offset = m.offset, error = %e, "artifact not written");
                stats.record_write_failure();
                return None;
            }
        };

        Some(CarvedArtifact {
            signature: sig.name().to_string(),
            source: entry.relative_path.clone(),
            offset: m.offset,
            length: bytes.len() as u64,
            output_path,
            sha256: hex::encode(Sha256::digest(bytes)),
        })
    }
}

/// Attempts before an occupied name is given up on
const MAX_NAME_ATTEMPTS: usize = 64;

/// Writes under `name`, numbering the name while it is taken
fn write_unique<W: ArtifactWriter>(
    writer: &W,
    name: &str,
    bytes: &[u8],
) -> Result<PathBuf, ArtifactWriterError> {
    let mut candidate = name.to_string();
    let mut attempt = 0usize;
    loop {
        match writer.write(&candidate, bytes) {
            Err(ArtifactWriterError::FileExists(path)) if attempt < MAX_NAME_ATTEMPTS => {
                attempt += 1;
                tracing::debug!(%path, attempt, "output name taken");
                candidate = CarvedArtifact::numbered(name, attempt);
            }
            other => return other,
        }
    }
}

/// Short digest of a source path, distinct for distinct paths in practice
fn source_tag(relative_path: &str) -> String {
    hex::encode(&Sha256::digest(relative_path.as_bytes())[..4])
}
