//! Analysis configuration DTO

use crate::core::{AnalysisError, AnalysisResult};
use crate::domain::repositories::DEFAULT_MAX_DEPTH;
use crate::domain::services::bb_artifacts::REM_SAMPLE;
use crate::domain::services::carver::{
    DEFAULT_SYNC_THRESHOLD, MAX_ARTIFACTS_STREAMING, MAX_ARTIFACTS_WHOLE_FILE,
};
use crate::domain::services::date_scanner::DEFAULT_DATE_SCAN_LIMIT;
use crate::domain::services::decryption::DEFAULT_DECRYPTION_WINDOW;
use crate::domain::services::search::MAX_SEARCH_HITS;
use crate::domain::services::strings::{DEFAULT_MIN_LENGTH, MAX_STRINGS};
use crate::domain::services::{DEFAULT_CHUNK_SIZE, SignatureRegistry};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Tunables shared by every entry point
///
/// Every field has a default, so a JSON file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory under which each session gets its own output folder
    pub output_root: PathBuf,
    pub max_walk_depth: usize,
    /// Read size for streaming scans
    pub chunk_size: usize,
    /// Files at or above this size are carved by streaming
    pub sync_threshold: u64,
    pub max_artifacts_whole_file: usize,
    pub max_artifacts_streaming: usize,
    pub max_search_hits: usize,
    pub max_strings: usize,
    pub min_string_length: usize,
    /// Leading bytes of each file examined for dates
    pub date_scan_limit: usize,
    /// Leading bytes of each `.rem` file examined during triage
    pub rem_sample: usize,
    /// Ciphertext bytes tried per transform
    pub decryption_window: usize,
    /// Signature names switched off for every run
    pub disabled_signatures: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("remnant-output"),
            max_walk_depth: DEFAULT_MAX_DEPTH,
            chunk_size: DEFAULT_CHUNK_SIZE,
            sync_threshold: DEFAULT_SYNC_THRESHOLD,
            max_artifacts_whole_file: MAX_ARTIFACTS_WHOLE_FILE,
            max_artifacts_streaming: MAX_ARTIFACTS_STREAMING,
            max_search_hits: MAX_SEARCH_HITS,
            max_strings: MAX_STRINGS,
            min_string_length: DEFAULT_MIN_LENGTH,
            date_scan_limit: DEFAULT_DATE_SCAN_LIMIT,
            rem_sample: REM_SAMPLE,
            decryption_window: DEFAULT_DECRYPTION_WINDOW,
            disabled_signatures: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    /// Loads and validates a JSON configuration file
    pub fn from_file(path: &Path) -> AnalysisResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            AnalysisError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> AnalysisResult<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| AnalysisError::Config(format!("cannot parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        if self.chunk_size == 0 {
            return Err(AnalysisError::Config("chunk_size must be positive".into()));
        }
        if self.min_string_length == 0 {
            return Err(AnalysisError::Config(
                "min_string_length must be positive".into(),
            ));
        }
        if self.decryption_window == 0 {
            return Err(AnalysisError::Config(
                "decryption_window must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Sets the output root
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    /// Sets the chunk size
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    pub fn with_sync_threshold(mut self, threshold: u64) -> Self {
        self.sync_threshold = threshold;
        self
    }

    pub fn with_max_walk_depth(mut self, depth: usize) -> Self {
        self.max_walk_depth = depth;
        self
    }

    pub fn with_min_string_length(mut self, length: usize) -> Self {
        self.min_string_length = length;
        self
    }

    /// Disables a signature by name for runs using this configuration
    pub fn without_signature(mut self, name: impl Into<String>) -> Self {
        self.disabled_signatures.push(name.into());
        self
    }

    /// Applies `disabled_signatures`; returns names the registry lacks
    pub fn apply_to_registry(&self, registry: &mut SignatureRegistry) -> Vec<String> {
        self.disabled_signatures
            .iter()
            .filter(|name| !registry.set_enabled(name, false))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            AnalysisConfig::from_json(r#"{"chunk_size": 1024, "disabled_signatures": ["pdf"]}"#)
                .unwrap();
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.max_walk_depth, 10);
        assert_eq!(config.max_search_hits, 500);
        assert_eq!(config.disabled_signatures, vec!["pdf".to_string()]);
    }

    #[test]
    fn rejects_zero_chunk_size() {
        assert!(matches!(
            AnalysisConfig::from_json(r#"{"chunk_size": 0}"#),
            Err(AnalysisError::Config(_))
        ));
        assert!(AnalysisConfig::from_json("not json").is_err());
    }

    #[test]
    fn disables_named_signatures() {
        let mut registry = SignatureRegistry::default_signatures();
        let unknown = AnalysisConfig::default()
            .without_signature("PDF")
            .without_signature("tiff")
            .apply_to_registry(&mut registry);
        assert_eq!(unknown, vec!["tiff".to_string()]);
        assert!(!registry.get("pdf").unwrap().is_enabled());
    }
}
