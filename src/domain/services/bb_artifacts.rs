//! BB10 artifact detection
//!
//! Known-path lookups over the walked tree, plus the small per-file checks
//! the backup analysis needs: event log sizing, BBThumbs containers, key
//! files and `.rem` record triage.

use super::cancellation::CancellationToken;
use super::chunked_scanner::{ChunkedScanner, ScanControl};
use super::entropy::{is_likely_encrypted, sample_entropy};
use super::strings::{DEFAULT_MIN_LENGTH, count_strings};
use crate::domain::entities::{
    BbArtifactHit, FileEntry, KeyFileRecord, KeyType, RemFileRecord,
};
use crate::domain::repositories::{ByteSource, ByteSourceError};
use aho_corasick::AhoCorasick;
use memchr::memmem;
use regex::bytes::Regex;
use std::sync::LazyLock;

/// Paths kept per artifact category
pub const MAX_PATHS_PER_CATEGORY: usize = 20;

/// (category, lower-case path substring, description)
pub const BB10_ARTIFACTS: &[(&str, &str, &str)] = &[
    ("contacts", "contacts.db", "PIM contacts database"),
    ("sms_mms", "text_messaging/messages.db", "SMS and MMS messages"),
    ("bbm", "bbmcore/master.db", "BBM conversations"),
    ("hub", "unified.db", "BlackBerry Hub unified inbox"),
    ("browser_history", "browser/history", "Browser history"),
    ("camera_settings", "camera/settings", "Camera settings"),
    ("device_identity", "deviceid", "Device identity (PIN, serial)"),
    ("timezone", "timezone", "Configured timezone"),
    ("network_operator", "network/operator", "Network operator"),
    ("phone_number", "phonenumber", "Device phone number"),
    ("imsi", "imsi", "SIM subscriber identity"),
    ("bbm_profile", "bbm/profile", "BBM profile"),
    ("paired_devices", "paired", "Paired Bluetooth devices"),
    ("event_logs", "eventlog", "System event logs"),
    ("photos", "shared/photos", "Photos"),
    ("sdcard_media", "removable/sdcard", "SD card media"),
    ("transferred_images", "transfer", "Transferred images"),
];

/// BBThumbs container magic
pub const BBTHUMBS_MAGIC: [u8; 4] = [0x24, 0x05, 0x20, 0x03];
const JPEG_SOI: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// `.rem` header magic
pub const REMF_MAGIC: [u8; 4] = *b"REMF";
/// Bytes of a `.rem` file examined during triage
pub const REM_SAMPLE: usize = 1024 * 1024;
const SQLITE_MAGIC: &[u8] = b"SQLite format 3\0";

/// Extensions that mark a file as key material
pub const KEY_EXTENSIONS: &[&str] = &["key", "pem", "der", "cer", "crt", "p12", "pfx"];
/// Bytes shown in a key file's hex dump
pub const KEY_DUMP_BYTES: usize = 256;

static EVENT_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)GUID|SEVR|TITL|EVNT|APNM|BATT|CALL|SYNC|BT|WiFi")
        .expect("event marker pattern is valid")
});

static MEDIA_HEADERS: LazyLock<Option<AhoCorasick>> = LazyLock::new(|| {
    let patterns: [&[u8]; 6] = [
        &JPEG_SOI,
        &[0x89, 0x50, 0x4E, 0x47],
        b"GIF8",
        b"#!AMR",
        b"ftyp",
        b"RIFF",
    ];
    AhoCorasick::new(patterns).ok()
});

/// Marks every table row found in `entries`
pub fn detect_artifacts(entries: &[FileEntry]) -> Vec<BbArtifactHit> {
    let normalized: Vec<String> = entries.iter().map(FileEntry::normalized_path).collect();

    BB10_ARTIFACTS
        .iter()
        .map(|&(category, needle, description)| {
            let paths: Vec<String> = entries
                .iter()
                .zip(&normalized)
                .filter(|(_, n)| n.contains(needle))
                .map(|(e, _)| e.relative_path.clone())
                .take(MAX_PATHS_PER_CATEGORY)
                .collect();
            BbArtifactHit {
                category,
                description,
                found: !paths.is_empty(),
                paths,
            }
        })
        .collect()
}

pub fn is_event_log(entry: &FileEntry) -> bool {
    let path = entry.normalized_path();
    path.contains("eventlog") || path.contains("event_log")
}

/// (newline count, marker count) for one event log
pub fn count_event_entries(data: &[u8]) -> (usize, usize) {
    let newlines = memchr::memchr_iter(b'\n', data).count();
    let markers = EVENT_MARKERS.find_iter(data).count();
    (newlines, markers)
}

/// Thumbnails in a BBThumbs container of any size, read window by window
///
/// `None` when the source does not start with the container magic. The
/// count covers the bytes scanned before a cancellation.
pub fn scan_thumbnails<S>(
    source: &S,
    scanner: &ChunkedScanner,
    cancel: &CancellationToken,
) -> Result<Option<usize>, ByteSourceError>
where
    S: ByteSource + ?Sized,
{
    if !source.read_at(0, BBTHUMBS_MAGIC.len())?.starts_with(&BBTHUMBS_MAGIC) {
        return Ok(None);
    }
    let body_start = BBTHUMBS_MAGIC.len() as u64;
    let mut count = 0usize;
    let overlap = ChunkedScanner::overlap_for(JPEG_SOI.len());
    scanner.scan(source, overlap, cancel, |window| {
        count += memmem::find_iter(window.data, &JPEG_SOI)
            .filter(|&start| {
                window.is_new_match(start, JPEG_SOI.len()) && window.global(start) >= body_start
            })
            .count();
        ScanControl::Continue
    })?;
    Ok(Some(count))
}

pub fn is_key_file(entry: &FileEntry) -> bool {
    KEY_EXTENSIONS.contains(&entry.extension.as_str())
        || entry.file_name().to_lowercase().contains("key")
}

/// Offset-prefixed hex dump, 16 bytes per row
pub fn hex_dump(data: &[u8]) -> String {
    data.chunks(16)
        .enumerate()
        .map(|(row, bytes)| {
            let cells: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();
            format!("{:08x}  {}", row * 16, cells.join(" "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds a key record from the file entry and its leading bytes
pub fn key_record(entry: &FileEntry, head: &[u8]) -> KeyFileRecord {
    KeyFileRecord {
        filename: entry.file_name(),
        relative_path: entry.relative_path.clone(),
        size: entry.size,
        hex_dump: hex_dump(&head[..head.len().min(KEY_DUMP_BYTES)]),
        key_type: KeyType::from_size(entry.size),
    }
}

/// Embedded media headers (JPEG, PNG, GIF, AMR, MP4/3GP, RIFF)
pub fn count_media_signatures(data: &[u8]) -> usize {
    MEDIA_HEADERS
        .as_ref()
        .map(|ac| ac.find_iter(data).count())
        .unwrap_or(0)
}

/// Triage of one `.rem` file from its leading [`REM_SAMPLE`] bytes
pub fn rem_record(entry: &FileEntry, sample: &[u8], keys_available: bool) -> RemFileRecord {
    let sample = &sample[..sample.len().min(REM_SAMPLE)];
    let entropy = sample_entropy(sample);
    let encrypted = is_likely_encrypted(entropy);

    RemFileRecord {
        filename: entry.file_name(),
        relative_path: entry.relative_path.clone(),
        size: entry.size,
        entropy,
        encrypted,
        has_header_magic: sample.starts_with(&REMF_MAGIC),
        decryptable: encrypted && keys_available,
        printable_strings: count_strings(sample, DEFAULT_MIN_LENGTH),
        media_signatures: count_media_signatures(sample),
        has_sqlite_signature: memmem::find(sample, SQLITE_MAGIC).is_some(),
    }
}
