//! Per-run context: cancellation and progress reporting

use crate::domain::services::CancellationToken;
use std::fmt;
use std::sync::Arc;

/// Progress callback `(percent, message)`; called with no fixed cadence
pub type ProgressCallback = Box<dyn Fn(u8, &str) + Send + Sync>;

type SharedProgress = Arc<dyn Fn(u8, &str) + Send + Sync>;

/// What a caller hands to a use case besides its inputs
#[derive(Default)]
pub struct RunContext {
    cancel: CancellationToken,
    progress: Option<SharedProgress>,
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("cancelled", &self.cancel.is_cancelled())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a token the caller can cancel from elsewhere
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(Arc::from(callback));
        self
    }

    /// Context for one phase of a larger run
    ///
    /// Shares the cancellation token; the phase's 0..=100 is reported as
    /// `from..=to` of this context.
    pub fn phase(&self, from: u8, to: u8) -> RunContext {
        let progress = self.progress.clone().map(|parent| {
            let from = from.min(100);
            let span = to.min(100).saturating_sub(from) as u16;
            Arc::new(move |percent: u8, message: &str| {
                let scaled = from as u16 + percent.min(100) as u16 * span / 100;
                parent(scaled as u8, message)
            }) as SharedProgress
        });
        RunContext {
            cancel: self.cancel.clone(),
            progress,
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn report(&self, percent: u8, message: &str) {
        if let Some(ref callback) = self.progress {
            callback(percent.min(100), message);
        }
    }

    /// Reports progress through a file list
    pub fn report_file(&self, index: usize, total: usize, message: &str) {
        let percent = if total == 0 {
            100
        } else {
            (index * 100 / total).min(100) as u8
        };
        self.report(percent, message);
    }
}
