//! Data Transfer Objects

mod analysis_config;
mod run_context;
mod session;

pub use analysis_config::AnalysisConfig;
pub use run_context::{ProgressCallback, RunContext};
pub use session::AnalysisSession;
