//! CLI commands using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// remnant - forensic triage of recovered device backups
///
/// Carves embedded media, searches raw bytes, fingerprints BlackBerry
/// backup containers and tries candidate keys against encrypted records.
#[derive(Parser)]
#[command(name = "remnant")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Forensic triage of recovered device backups", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Carve embedded files out of every file below a path
    Carve {
        /// File or directory to carve
        path: PathBuf,

        /// Output root; each run writes into its own session folder
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Signatures to switch off for this run (e.g. pdf,zip)
        #[arg(long, value_delimiter = ',')]
        disable: Vec<String>,
    },

    /// Search raw bytes for text or hex
    Search {
        /// File or directory to search
        path: PathBuf,

        /// Text, or hex digits with --hex (e.g. "0xFF 0xD8")
        query: String,

        /// Interpret the query as hex bytes
        #[arg(long)]
        hex: bool,

        /// Match text case-sensitively
        #[arg(short = 's', long)]
        case_sensitive: bool,

        /// Also search inside zip-like archives
        #[arg(short = 'a', long)]
        archives: bool,
    },

    /// Extract printable strings and measure entropy of one file
    Strings {
        file: PathBuf,

        /// Minimum run length
        #[arg(short = 'n', long)]
        min_length: Option<usize>,

        /// Number of strings to print
        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Fingerprint a backup tree
    Detect { path: PathBuf },

    /// Full BlackBerry backup analysis
    Analyze {
        path: PathBuf,

        /// Output root for the session
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Try candidate keys against one .rem record
    Decrypt {
        /// The record file
        file: PathBuf,

        /// Key files to try
        #[arg(short, long, required = true, num_args = 1..)]
        keys: Vec<PathBuf>,
    },

    /// List carving signatures
    Signatures {
        /// Show only enabled signatures
        #[arg(long, value_enum, default_value_t = SignatureFilter::All)]
        show: SignatureFilter,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SignatureFilter {
    All,
    Enabled,
}
