//! Analysis session
//!
//! Replaces any process-wide result store: whoever starts a run owns the
//! session, and the session owns the run's output namespace.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

static SESSION_COUNTER: AtomicU32 = AtomicU32::new(0);

/// One run's identity and output namespace `<output_root>/<id>/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSession {
    id: String,
    output_root: PathBuf,
}

impl AnalysisSession {
    /// New session with a fresh, process-unique id
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        let seq = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
        let id = format!(
            "{}-{}-{:04}",
            Utc::now().format("%Y%m%dT%H%M%S%3f"),
            std::process::id(),
            seq
        );
        Self {
            id,
            output_root: output_root.into(),
        }
    }

    /// Session with a caller-chosen id (path separators are replaced)
    pub fn with_id(id: &str, output_root: impl Into<PathBuf>) -> Self {
        let id: String = id
            .chars()
            .map(|c| if c == '/' || c == '\\' || c == '.' { '_' } else { c })
            .collect();
        Self {
            id,
            output_root: output_root.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Directory this session writes into
    pub fn output_dir(&self) -> PathBuf {
        self.output_root.join(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_scoped() {
        let a = AnalysisSession::new("/out");
        let b = AnalysisSession::new("/out");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.output_dir(), Path::new("/out").join(a.id()));
    }

    #[test]
    fn custom_ids_cannot_escape() {
        let s = AnalysisSession::with_id("../x", "/out");
        assert_eq!(s.id(), "___x");
    }
}
