//! Repository traits (interfaces)
//!
//! These traits define the contracts for external dependencies: reading
//! bytes, walking directories, opening archives and persisting artifacts.

mod archive_reader;
mod artifact_writer;
mod byte_source;
mod directory_walker;

pub use archive_reader::{ArchiveError, ArchiveReader};
pub use artifact_writer::{ArtifactWriter, ArtifactWriterError};
pub use byte_source::{ByteSource, ByteSourceError};
pub use directory_walker::{DEFAULT_MAX_DEPTH, DirectoryWalker, WalkError};
