use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::repositories::{
    ArchiveError, ArtifactWriterError, ByteSourceError, WalkError,
};

/// Errors that abort an analysis entry point.
///
/// Per-file and per-match problems never surface here; they are logged and
/// skipped inside the run.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Root path does not exist: {0}")]
    RootNotFound(PathBuf),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Source error: {0}")]
    Source(#[from] ByteSourceError),

    #[error("Walk error: {0}")]
    Walk(#[from] WalkError),

    #[error("Writer error: {0}")]
    Writer(#[from] ArtifactWriterError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
