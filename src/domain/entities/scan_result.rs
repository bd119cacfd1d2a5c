//! Per-run result records
//!
//! Each analysis entry point returns one of these. They are built up by a
//! single run and never shared between runs.

use super::backup_format::BackupFormatResult;
use super::carved_artifact::CarvedArtifact;
use super::date_artifact::DateArtifact;
use super::device_records::{DecryptionAttempt, KeyFileRecord, RemFileRecord};
use super::extracted_string::ExtractedString;
use super::search_hit::SearchHit;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Running counters for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub bytes_scanned: u64,
    /// Outputs that could not be written
    pub write_failures: usize,
}

impl RunStats {
    pub fn record_file(&mut self, bytes: u64) {
        self.files_scanned += 1;
        self.bytes_scanned += bytes;
    }

    pub fn record_skip(&mut self) {
        self.files_skipped += 1;
    }

    pub fn record_write_failure(&mut self) {
        self.write_failures += 1;
    }
}

/// Result of a carve run
#[derive(Debug, Clone, Default, Serialize)]
pub struct CarveResult {
    pub artifacts: Vec<CarvedArtifact>,
    /// Artifacts per signature name
    pub by_signature: BTreeMap<String, usize>,
    pub stats: RunStats,
    /// Stopped at the artifact cap
    pub truncated: bool,
    pub cancelled: bool,
    #[serde(skip)]
    pub duration: Duration,
}

impl CarveResult {
    pub fn add_artifact(&mut self, artifact: CarvedArtifact) {
        *self
            .by_signature
            .entry(artifact.signature.clone())
            .or_insert(0) += 1;
        self.artifacts.push(artifact);
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Carved {} artifacts from {} files ({} bytes) in {:.2}s\n",
            self.artifacts.len(),
            self.stats.files_scanned,
            self.stats.bytes_scanned,
            self.duration.as_secs_f64()
        );
        for (name, count) in &self.by_signature {
            summary.push_str(&format!("  - {}: {}\n", name, count));
        }
        if self.stats.write_failures > 0 {
            summary.push_str(&format!(
                "{} artifacts could not be written\n",
                self.stats.write_failures
            ));
        }
        if self.truncated {
            summary.push_str("Artifact cap reached; remaining matches were not carved\n");
        }
        if self.cancelled {
            summary.push_str("Run cancelled; results are partial\n");
        }
        summary
    }
}

/// Result of a search run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResult {
    pub hits: Vec<SearchHit>,
    pub stats: RunStats,
    pub truncated: bool,
    pub cancelled: bool,
}

/// Result of a string extraction run
#[derive(Debug, Clone, Default, Serialize)]
pub struct StringsResult {
    pub strings: Vec<ExtractedString>,
    /// Entropy of the leading sample
    pub entropy: f64,
    pub likely_encrypted: bool,
    pub stats: RunStats,
    pub truncated: bool,
    pub cancelled: bool,
}

/// One row of the BB10 artifact table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BbArtifactHit {
    pub category: &'static str,
    pub description: &'static str,
    pub found: bool,
    /// Matching relative paths (bounded)
    pub paths: Vec<String>,
}

/// Rough number of entries across event log files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventLogEstimate {
    pub files: usize,
    pub newline_count: usize,
    pub marker_count: usize,
    /// The larger of the two counts
    pub estimated_entries: usize,
}

/// A BBThumbs container and how many thumbnails it holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThumbsContainer {
    pub relative_path: String,
    pub thumbnail_count: usize,
}

/// Aggregate of a full backup analysis
#[derive(Debug, Clone, Serialize)]
pub struct BbAnalysisResult {
    pub session_id: String,
    pub format: BackupFormatResult,
    pub artifacts: Vec<BbArtifactHit>,
    pub key_files: Vec<KeyFileRecord>,
    pub rem_files: Vec<RemFileRecord>,
    pub dates: Vec<DateArtifact>,
    pub event_log: EventLogEstimate,
    pub thumbs: Vec<ThumbsContainer>,
    pub decryption: Vec<DecryptionAttempt>,
    pub stats: RunStats,
    pub cancelled: bool,
}

impl BbAnalysisResult {
    pub fn new(session_id: impl Into<String>, format: BackupFormatResult) -> Self {
        Self {
            session_id: session_id.into(),
            format,
            artifacts: Vec::new(),
            key_files: Vec::new(),
            rem_files: Vec::new(),
            dates: Vec::new(),
            event_log: EventLogEstimate::default(),
            thumbs: Vec::new(),
            decryption: Vec::new(),
            stats: RunStats::default(),
            cancelled: false,
        }
    }

    pub fn found_categories(&self) -> impl Iterator<Item = &BbArtifactHit> {
        self.artifacts.iter().filter(|a| a.found)
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Backup format: {} ({}% confidence)\n{}\n",
            self.format.format, self.format.confidence, self.format.rationale
        );
        summary.push_str(&format!(
            "Artifact categories found: {}/{}\n",
            self.found_categories().count(),
            self.artifacts.len()
        ));
        summary.push_str(&format!(
            "Key files: {}, REM files: {} ({} decryptable)\n",
            self.key_files.len(),
            self.rem_files.len(),
            self.rem_files.iter().filter(|r| r.decryptable).count()
        ));
        summary.push_str(&format!(
            "Timestamps: {}, event log entries (est.): {}, thumbnail containers: {}\n",
            self.dates.len(),
            self.event_log.estimated_entries,
            self.thumbs.len()
        ));
        for attempt in &self.decryption {
            summary.push_str(&format!(
                "  - {}: {} ({} strings)\n",
                attempt.source, attempt.method, attempt.extracted_strings
            ));
        }
        if self.cancelled {
            summary.push_str("Run cancelled; results are partial\n");
        }
        summary
    }
}
