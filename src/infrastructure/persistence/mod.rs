//! Artifact persistence

mod local_artifact_writer;

pub use local_artifact_writer::LocalArtifactWriter;
