//! Domain services
//!
//! Pure analysis logic over byte sources and walked file lists.

pub mod bb_artifacts;
mod cancellation;
pub mod carver;
mod chunked_scanner;
pub mod date_scanner;
pub mod decryption;
pub mod entropy;
pub mod format_classifier;
pub mod search;
mod signature_registry;
pub mod strings;

pub use cancellation::CancellationToken;
pub use carver::{CarveOutcome, CarveStateMachine, FileCarver};
pub use chunked_scanner::{ChunkedScanner, DEFAULT_CHUNK_SIZE, ScanControl, ScanOutcome, Window};
pub use decryption::{CipherMethod, DecryptionEngine};
pub use format_classifier::{TreeEvidence, classify};
pub use search::SearchQuery;
pub use signature_registry::{
    PatternEvent, PatternRole, SharedSignatureRegistry, SignatureRegistry, SignatureSet,
};
pub use strings::StringExtractor;
