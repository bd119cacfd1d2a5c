//! Domain layer unit tests
//!
//! Tests for entities and domain services that need no filesystem.

use remnant::domain::entities::{BackupFormat, DateFormat, FileEntry, KeyMaterial, KeyType};
use remnant::domain::services::date_scanner::scan_dates;
use remnant::domain::services::decryption::xor_stream;
use remnant::domain::services::entropy::{is_likely_encrypted, shannon_entropy};
use remnant::domain::services::strings::extract_strings;
use remnant::domain::services::{
    CipherMethod, DecryptionEngine, SearchQuery, SignatureRegistry, TreeEvidence, classify,
};
use rstest::*;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Deterministic pseudo-random bytes (SHA-256 in counter mode)
fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(len + 32);
    let mut counter = 0u64;
    while out.len() < len {
        let mut hasher = Sha256::new();
        hasher.update(seed.to_le_bytes());
        hasher.update(counter.to_le_bytes());
        out.extend_from_slice(&hasher.finalize());
        counter += 1;
    }
    out.truncate(len);
    out
}

fn entry(rel: &str) -> FileEntry {
    FileEntry::new(Path::new("/backup"), PathBuf::from("/backup").join(rel), 64)
}

// ============================================================================
// Signature registry
// ============================================================================

#[fixture]
fn registry() -> SignatureRegistry {
    SignatureRegistry::default_signatures()
}

#[rstest]
#[case("jpeg", "jpg", true)]
#[case("png", "png", true)]
#[case("gif89a", "gif", true)]
#[case("pdf", "pdf", true)]
#[case("zip", "zip", true)]
#[case("sqlite", "sqlite", true)]
#[case("amr", "amr", true)]
#[case("bmp", "bmp", false)]
fn test_default_signature_table(
    registry: SignatureRegistry,
    #[case] name: &str,
    #[case] extension: &str,
    #[case] enabled: bool,
) {
    let sig = registry.get(name).unwrap();
    assert_eq!(sig.extension(), extension);
    assert_eq!(sig.is_enabled(), enabled);
}

#[rstest]
fn test_disabling_changes_later_snapshots_only(mut registry: SignatureRegistry) {
    let before = registry.snapshot();
    assert!(registry.set_enabled("jpeg", false));
    let after = registry.snapshot();

    let jpeg = [0xFF, 0xD8, 0xFF, 0xE0];
    assert_eq!(before.header_hits(&jpeg).len(), 1);
    assert!(after.header_hits(&jpeg).is_empty());
    assert!(!registry.set_enabled("no-such-format", false));
}

// ============================================================================
// Entropy
// ============================================================================

#[rstest]
fn test_entropy_of_constant_data_is_zero() {
    assert_eq!(shannon_entropy(&[0u8; 4096]), 0.0);
    assert!(!is_likely_encrypted(shannon_entropy(&[0u8; 4096])));
}

#[rstest]
fn test_entropy_of_noise_is_high() {
    let entropy = shannon_entropy(&noise(4096, 7));
    assert!(entropy > 7.0, "entropy {} too low", entropy);
    assert!(entropy <= 8.0);
    assert!(is_likely_encrypted(entropy));
}

#[rstest]
fn test_entropy_of_empty_input() {
    assert_eq!(shannon_entropy(&[]), 0.0);
}

// ============================================================================
// Strings
// ============================================================================

#[rstest]
fn test_string_extraction_is_idempotent() {
    let mut data = noise(512, 3);
    data.extend_from_slice(b"\0subject: meeting at noon\0\x01ab\x02longer run here\n");
    let first = extract_strings(&data, 4);
    let second = extract_strings(&data, 4);
    assert_eq!(first, second);
    assert!(first.iter().any(|s| s.value == "subject: meeting at noon"));
    assert!(first.iter().all(|s| s.value.len() >= 4));
}

// ============================================================================
// Search queries
// ============================================================================

#[rstest]
#[case("FF D8 FF", vec![0xFF, 0xD8, 0xFF])]
#[case("0xffd8ff", vec![0xFF, 0xD8, 0xFF])]
#[case("0xFF,0xD8,0xFF", vec![0xFF, 0xD8, 0xFF])]
fn test_hex_query_forms(#[case] query: &str, #[case] needle: Vec<u8>) {
    assert_eq!(SearchQuery::hex(query).unwrap().needle(), needle.as_slice());
}

#[rstest]
fn test_search_finds_overlapping_occurrences() {
    let query = SearchQuery::text("aa", true).unwrap();
    assert_eq!(query.find_all(b"aaaa"), vec![0, 1, 2]);
}

// ============================================================================
// Format classifier
// ============================================================================

#[rstest]
fn test_qnx_magic_beats_bbb_layout() {
    let mut evidence = TreeEvidence::new();
    for name in ["PkgInfo", "Manifest.xml", "Archive/appdata.tar"] {
        evidence.observe(&entry(name), None);
    }
    evidence.observe(&entry("device.tar"), Some(&[0x51, 0x4E, 0x58, 0x00]));

    let result = classify(&evidence);
    assert_eq!(result.format, BackupFormat::Bb10TarQnx);
    assert_eq!(result.confidence, 95);
    assert!(result.rationale.contains("device.tar"));
}

#[rstest]
#[case(&["a.ipd"], BackupFormat::Ipd, 90)]
#[case(&["a.rem", "b.dat"], BackupFormat::BbbV1Mac, 70)]
#[case(&["Manifest.xml", "1.dat", "2.dat", "3.dat", "4.dat"], BackupFormat::BbbV2Windows, 85)]
#[case(&["readme.txt"], BackupFormat::Unknown, 30)]
fn test_layout_rules(
    #[case] files: &[&str],
    #[case] expected: BackupFormat,
    #[case] confidence: u8,
) {
    let mut evidence = TreeEvidence::new();
    for f in files {
        evidence.observe(&entry(f), None);
    }
    let result = classify(&evidence);
    assert_eq!(result.format, expected);
    assert_eq!(result.confidence, confidence);
}

// ============================================================================
// Dates
// ============================================================================

/// Noise with zero bytes and ASCII digits replaced, so it holds no
/// in-range big-endian value and cannot extend a digit run
fn date_free_noise(len: usize, seed: u64) -> Vec<u8> {
    noise(len, seed)
        .into_iter()
        .map(|b| if b == 0 || b.is_ascii_digit() { 0xA5 } else { b })
        .collect()
}

#[rstest]
#[case(1, 0)]
#[case(2, 17)]
#[case(3, 4000)]
fn test_java_epoch_digits_in_random_bytes(#[case] seed: u64, #[case] at: usize) {
    let mut data = date_free_noise(at, seed);
    data.extend_from_slice(b"1700000000000");
    data.extend(date_free_noise(4096, seed + 100));

    let dates = scan_dates("records.dat", &data);
    assert_eq!(dates.len(), 1);
    assert_eq!(dates[0].format, DateFormat::JavaEpoch);
    assert_eq!(dates[0].raw_value, "1700000000000");
    assert_eq!(dates[0].decoded, "2023-11-14T22:13:20.000Z");
    assert_eq!(dates[0].source, "records.dat");
}

#[rstest]
#[case(b"999999999".as_slice())]
#[case(b"0000000001".as_slice())]
#[case(b"9999999999999".as_slice())]
fn test_out_of_range_digits_are_ignored(#[case] data: &[u8]) {
    assert!(scan_dates("f", data).is_empty());
}

// ============================================================================
// Decryption
// ============================================================================

#[rstest]
#[case(100, KeyType::DeviceKey)]
#[case(4096, KeyType::CertificateOrRsaKey)]
fn test_key_type_guess(#[case] size: u64, #[case] expected: KeyType) {
    assert_eq!(KeyType::from_size(size), expected);
}

#[rstest]
fn test_xor_key_is_recovered_among_decoys() {
    let mut plain = Vec::new();
    for i in 0..64 {
        plain.extend_from_slice(format!("BBM chat {} to: +1 555 010 {:04}\n", i, i).as_bytes());
    }
    let key: Vec<u8> = noise(16, 11).iter().map(|b| b | 0x80).collect();
    let cipher = xor_stream(&key, &plain).unwrap();
    // Same key with the high bit flipped: its XOR output is never printable
    let decoy: Vec<u8> = key.iter().map(|b| b ^ 0x80).collect();

    let keys = vec![
        KeyMaterial {
            name: "decoy.key".to_string(),
            bytes: decoy,
        },
        KeyMaterial {
            name: "device.key".to_string(),
            bytes: key,
        },
    ];
    let attempt = DecryptionEngine::default().decrypt("Data/1.rem", &cipher, &keys);
    assert!(attempt.success);
    assert!(attempt.method.contains("XOR"));
    assert!(attempt.method.contains("device.key"));
    assert!(attempt.message_keywords > 0);
    assert!(attempt.contacts > 0);
}

#[rstest]
fn test_cipher_labels() {
    let labels: Vec<&str> = CipherMethod::ALL.iter().map(|m| m.label()).collect();
    assert_eq!(labels, vec!["XOR", "AES-128-CBC", "3DES-CBC"]);
}
