//! Archive reader implementations

mod zip_archive_reader;

pub use zip_archive_reader::{MAX_ARCHIVE_ENTRIES, MAX_MEMBER_SIZE, ZipArchiveReader, list_members};
