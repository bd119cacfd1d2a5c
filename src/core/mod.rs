//! Crate-wide primitives shared by every layer.

pub mod error;

pub use error::{AnalysisError, AnalysisResult};
