//! remnant - forensic triage of recovered device backups
//!
//! Carves embedded media out of arbitrary files, searches raw bytes for
//! text or hex, extracts printable strings, fingerprints BlackBerry backup
//! containers and tries candidate keys against encrypted `.rem` records.
//!
//! The crate follows a layered layout: `domain` holds the pure analysis
//! logic and the repository traits it needs, `infrastructure` implements
//! those traits over the local filesystem, `application` wires them into one
//! use case per entry point and `presentation` is the command line.

pub mod application;
pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::dto::{AnalysisConfig, AnalysisSession, RunContext};
pub use core::{AnalysisError, AnalysisResult};
pub use domain::services::{CancellationToken, SignatureRegistry};
