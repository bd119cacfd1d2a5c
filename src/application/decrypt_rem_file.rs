//! Decrypt REM file use case
//!
//! Tries every candidate key against one `.rem` record. The record does
//! not have to be flagged as encrypted first.

use crate::application::dto::{AnalysisConfig, RunContext};
use crate::core::{AnalysisError, AnalysisResult};
use crate::domain::entities::{DecryptionAttempt, FileEntry, KeyMaterial};
use crate::domain::repositories::ByteSource;
use crate::domain::services::DecryptionEngine;
use crate::domain::services::bb_artifacts::REMF_MAGIC;
use crate::infrastructure::source::FileSource;
use std::path::{Path, PathBuf};

/// Largest key file read as key material
pub const MAX_KEY_BYTES: usize = 64 * 1024;

/// Reads key material from files; unreadable or empty files are skipped
pub fn load_keys<'a, I>(paths: I) -> Vec<KeyMaterial>
where
    I: IntoIterator<Item = &'a Path>,
{
    paths
        .into_iter()
        .filter_map(|path| {
            let bytes = FileSource::open(path)
                .and_then(|s| s.read_at(0, MAX_KEY_BYTES))
                .map_err(|e| tracing::debug!(path = %path.display(), error = %e, "key unreadable"))
                .ok()?;
            if bytes.is_empty() {
                return None;
            }
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Some(KeyMaterial { name, bytes })
        })
        .collect()
}

/// Key material from walked key file entries
pub fn load_key_entries(entries: &[&FileEntry]) -> Vec<KeyMaterial> {
    load_keys(entries.iter().map(|e| e.path.as_path()))
}

/// Decrypt REM file use case
pub struct DecryptRemFileUseCase {
    engine: DecryptionEngine,
}

impl DecryptRemFileUseCase {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            engine: DecryptionEngine::new(config.decryption_window),
        }
    }

    pub fn engine(&self) -> &DecryptionEngine {
        &self.engine
    }

    /// Decrypts the file at `rem_path` with keys read from `key_paths`
    pub fn execute(
        &self,
        rem_path: &Path,
        key_paths: &[PathBuf],
        ctx: &RunContext,
    ) -> AnalysisResult<DecryptionAttempt> {
        if !rem_path.exists() {
            return Err(AnalysisError::RootNotFound(rem_path.to_path_buf()));
        }
        let keys = load_keys(key_paths.iter().map(PathBuf::as_path));
        let source = FileSource::open(rem_path)?;
        let label = rem_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| rem_path.display().to_string());

        tracing::info!(file = %label, keys = keys.len(), "decrypting record");
        let attempt = self.execute_source(&label, &source, &keys, ctx)?;
        tracing::info!(
            file = %label,
            method = %attempt.method,
            strings = attempt.extracted_strings,
            "decryption finished"
        );
        Ok(attempt)
    }

    /// Decrypts an already opened record with loaded keys
    pub fn execute_source<S>(
        &self,
        label: &str,
        source: &S,
        keys: &[KeyMaterial],
        ctx: &RunContext,
    ) -> AnalysisResult<DecryptionAttempt>
    where
        S: ByteSource + ?Sized,
    {
        if ctx.is_cancelled() {
            return Ok(DecryptionAttempt::failed(label));
        }
        ctx.report(0, label);
        // Room for the header that may be stripped
        let data = source.read_at(0, self.engine.window() + REMF_MAGIC.len())?;
        let attempt = self.engine.decrypt(label, &data, keys);
        ctx.report(100, label);
        Ok(attempt)
    }
}
