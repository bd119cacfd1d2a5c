//! CLI module

mod commands;
mod progress;

pub use commands::{Cli, Commands, SignatureFilter};
pub use progress::ProgressReporter;

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise `--debug` selects debug, `--verbose`
/// info and the default is warnings only. Logs go to stderr so `--json`
/// output stays clean.
pub fn init_logging(verbose: bool, debug: bool) {
    let default_level = if debug {
        "remnant=debug"
    } else if verbose {
        "remnant=info"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .try_init();
}
