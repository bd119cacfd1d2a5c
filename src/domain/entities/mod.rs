//! Domain entities
//!
//! Core records produced by an analysis run.

mod backup_format;
mod carved_artifact;
mod date_artifact;
mod device_records;
mod extracted_string;
mod file_entry;
mod file_signature;
mod scan_result;
mod search_hit;

pub use backup_format::{BackupFormat, BackupFormatResult};
pub use carved_artifact::{CarveMatch, CarvedArtifact};
pub use date_artifact::{
    DateArtifact, DateFormat, JAVA_EPOCH_MAX, JAVA_EPOCH_MIN, UNIX_EPOCH_MAX, UNIX_EPOCH_MIN,
    decode_calendar_minutes, to_iso8601,
};
pub use device_records::{
    DEVICE_KEY_MAX_SIZE, DecryptionAttempt, KeyFileRecord, KeyMaterial, KeyType, NO_METHOD,
    RemFileRecord,
};
pub use extracted_string::{ExtractedString, MAX_STRING_CHARS};
pub use file_entry::FileEntry;
pub use file_signature::{HexBytes, Signature};
pub use scan_result::{
    BbAnalysisResult, BbArtifactHit, CarveResult, EventLogEstimate, RunStats, SearchResult,
    StringsResult, ThumbsContainer,
};
pub use search_hit::{MatchKind, SearchHit};
