//! Infrastructure layer
//!
//! Concrete implementations of the domain repositories: byte sources,
//! the directory walker, archive access and artifact persistence.

pub mod archive;
pub mod persistence;
pub mod source;
pub mod walk;
