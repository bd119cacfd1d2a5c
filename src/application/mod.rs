//! Application layer
//!
//! One use case per analysis entry point. Each use case owns its inputs for
//! the duration of a run and shares nothing mutable with other runs.

pub mod dto;
mod analyze_bb_backup;
mod carve_files;
mod decrypt_rem_file;
mod detect_backup_format;
mod extract_strings;
mod search_files;

pub use analyze_bb_backup::AnalyzeBbBackupUseCase;
pub use carve_files::CarveFilesUseCase;
pub use decrypt_rem_file::{DecryptRemFileUseCase, MAX_KEY_BYTES, load_keys};
pub use detect_backup_format::{DetectBackupFormatUseCase, classify_tree, read_magic, read_magics};
pub use extract_strings::ExtractStringsUseCase;
pub use search_files::{SearchFilesUseCase, SearchRequest};
