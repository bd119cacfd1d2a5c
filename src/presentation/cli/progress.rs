//! Progress reporting for CLI

use crate::application::dto::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

/// Progress reporter using indicatif
pub struct ProgressReporter {
    bar: Arc<ProgressBar>,
}

impl ProgressReporter {
    /// Creates a percentage bar
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        bar.set_message(message.to_string());

        Self { bar: Arc::new(bar) }
    }

    /// A reporter that draws nothing (JSON output, tests)
    pub fn hidden() -> Self {
        Self {
            bar: Arc::new(ProgressBar::hidden()),
        }
    }

    /// Finishes with a message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }

    /// Gets a callback for use case progress
    pub fn callback(&self) -> ProgressCallback {
        let bar = Arc::clone(&self.bar);
        Box::new(move |percent: u8, message: &str| {
            bar.set_position(u64::from(percent));
            bar.set_message(message.to_string());
        })
    }
}
