//! Timestamp recovery from raw record files
//!
//! Three detectors run over each file: big-endian 64-bit millisecond values,
//! 10-digit decimal runs read as Unix seconds and 13-digit decimal runs read
//! as Java milliseconds. Everything is range-checked against 2000..2050 so
//! random data rarely produces a date.

use crate::domain::entities::{
    DateArtifact, DateFormat, FileEntry, JAVA_EPOCH_MAX, JAVA_EPOCH_MIN, UNIX_EPOCH_MAX,
    UNIX_EPOCH_MIN, to_iso8601,
};

pub const MAX_BINARY_DATES: usize = 10;
pub const MAX_UNIX_DIGIT_DATES: usize = 5;
pub const MAX_JAVA_DIGIT_DATES: usize = 5;
/// Dates kept across a whole run
pub const MAX_DATES: usize = 50;
/// `.rem`/`.dat` files scanned per run
pub const MAX_RECORD_FILES: usize = 20;
/// Leading bytes of each file examined
pub const DEFAULT_DATE_SCAN_LIMIT: usize = 16 * 1024 * 1024;

/// Files the date scanner looks at, in walk order
///
/// Every `.db` and `.ipd` file, plus the first [`MAX_RECORD_FILES`] `.rem`
/// or `.dat` files.
pub fn select_date_files(entries: &[FileEntry]) -> Vec<&FileEntry> {
    let mut records = 0usize;
    entries
        .iter()
        .filter(|e| match e.extension.as_str() {
            "db" | "ipd" => true,
            "rem" | "dat" if records < MAX_RECORD_FILES => {
                records += 1;
                true
            }
            _ => false,
        })
        .collect()
}

/// Runs all three detectors over `data`
pub fn scan_dates(source: &str, data: &[u8]) -> Vec<DateArtifact> {
    let mut found = binary_java_epochs(source, data, MAX_BINARY_DATES);
    found.extend(decimal_dates(
        source,
        data,
        10,
        DateFormat::UnixEpoch,
        MAX_UNIX_DIGIT_DATES,
    ));
    found.extend(decimal_dates(
        source,
        data,
        13,
        DateFormat::JavaEpoch,
        MAX_JAVA_DIGIT_DATES,
    ));
    found
}

fn in_range(format: DateFormat, value: i64) -> bool {
    match format {
        DateFormat::JavaEpoch => (JAVA_EPOCH_MIN..=JAVA_EPOCH_MAX).contains(&value),
        DateFormat::UnixEpoch => (UNIX_EPOCH_MIN..=UNIX_EPOCH_MAX).contains(&value),
        _ => false,
    }
}

fn artifact(source: &str, raw_value: String, value: i64, format: DateFormat) -> Option<DateArtifact> {
    let decoded = format.decode(value)?;
    Some(DateArtifact {
        source: source.to_string(),
        raw_value,
        decoded: to_iso8601(&decoded),
        format,
    })
}

/// Big-endian i64 millisecond values at every offset
///
/// Steps 8 bytes past a hit, one byte otherwise.
pub fn binary_java_epochs(source: &str, data: &[u8], cap: usize) -> Vec<DateArtifact> {
    let mut found = Vec::new();
    let mut i = 0usize;
    while i + 8 <= data.len() && found.len() < cap {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&data[i..i + 8]);
        let value = i64::from_be_bytes(raw);
        if in_range(DateFormat::JavaEpoch, value) {
            if let Some(a) = artifact(source, hex::encode(raw), value, DateFormat::JavaEpoch) {
                found.push(a);
            }
            i += 8;
        } else {
            i += 1;
        }
    }
    found
}

/// Maximal ASCII digit runs of exactly `digits` characters
pub fn decimal_dates(
    source: &str,
    data: &[u8],
    digits: usize,
    format: DateFormat,
    cap: usize,
) -> Vec<DateArtifact> {
    let mut found = Vec::new();
    let mut i = 0usize;
    while i < data.len() && found.len() < cap {
        if !data[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < data.len() && data[i].is_ascii_digit() {
            i += 1;
        }
        if i - start != digits {
            continue;
        }
        let text = String::from_utf8_lossy(&data[start..i]);
        let Ok(value) = text.parse::<i64>() else {
            continue;
        };
        if in_range(format, value) {
            if let Some(a) = artifact(source, text.into_owned(), value, format) {
                found.push(a);
            }
        }
    }
    found
}
