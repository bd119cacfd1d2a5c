//! Multi-key, multi-cipher plaintext recovery for `.rem` records
//!
//! Every (key, cipher) pair is tried over the leading window of the
//! ciphertext and scored by how many printable strings the output holds.
//! Scoring runs on the rayon pool; the winner is picked by score, then by
//! candidate order, so the result does not depend on thread timing. The
//! score only ranks candidates. A winning transform is not proof of a
//! correct key.

use super::bb_artifacts::{REMF_MAGIC, count_media_signatures};
use super::strings::{DEFAULT_MIN_LENGTH, PrintableRuns, count_strings};
use crate::domain::entities::{DecryptionAttempt, KeyMaterial};
use aho_corasick::AhoCorasick;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};
use rayon::prelude::*;
use regex::bytes::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

/// Ciphertext bytes fed to each transform
pub const DEFAULT_DECRYPTION_WINDOW: usize = 1024 * 1024;
/// Strings shown in an attempt's preview
pub const PREVIEW_STRINGS: usize = 5;
const PREVIEW_CHARS: usize = 80;

pub const MESSAGE_KEYWORDS: &[&str] = &[
    "BBM",
    "message",
    "chat",
    "sms",
    "email",
    "inbox",
    "outbox",
    "sent",
    "from:",
    "to:",
    "subject:",
    "date:",
    "delivered",
];

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type TdesCbcDec = cbc::Decryptor<des::TdesEde3>;

static KEYWORD_MATCHER: LazyLock<Option<AhoCorasick>> = LazyLock::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(MESSAGE_KEYWORDS)
        .ok()
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email pattern is valid")
});

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+?[0-9][0-9 ()-]{6,}[0-9]").expect("phone pattern is valid")
});

/// Transforms tried for every key, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherMethod {
    /// Repeating-key XOR
    Xor,
    /// AES-128-CBC, zero IV, no padding
    Aes128Cbc,
    /// 3DES-EDE3-CBC, zero IV, no padding
    TripleDesCbc,
}

impl CipherMethod {
    pub const ALL: [CipherMethod; 3] = [
        CipherMethod::Xor,
        CipherMethod::Aes128Cbc,
        CipherMethod::TripleDesCbc,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CipherMethod::Xor => "XOR",
            CipherMethod::Aes128Cbc => "AES-128-CBC",
            CipherMethod::TripleDesCbc => "3DES-CBC",
        }
    }

    /// Runs the transform; `None` when the key does not fit the cipher
    pub fn apply(&self, key: &[u8], data: &[u8]) -> Option<Vec<u8>> {
        match self {
            CipherMethod::Xor => xor_stream(key, data),
            CipherMethod::Aes128Cbc => aes128_cbc_decrypt(key, data),
            CipherMethod::TripleDesCbc => tdes_cbc_decrypt(key, data),
        }
    }
}

impl fmt::Display for CipherMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn xor_stream(key: &[u8], data: &[u8]) -> Option<Vec<u8>> {
    if key.is_empty() {
        return None;
    }
    Some(
        data.iter()
            .zip(key.iter().cycle())
            .map(|(d, k)| d ^ k)
            .collect(),
    )
}

/// AES-128-CBC over the largest multiple of 16 bytes, first 16 key bytes
pub fn aes128_cbc_decrypt(key: &[u8], data: &[u8]) -> Option<Vec<u8>> {
    if key.len() < 16 {
        return None;
    }
    let len = data.len() / 16 * 16;
    if len == 0 {
        return None;
    }
    let mut buf = data[..len].to_vec();
    Aes128CbcDec::new_from_slices(&key[..16], &[0u8; 16])
        .ok()?
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .ok()?;
    Some(buf)
}

/// 3DES-EDE3-CBC over the largest multiple of 8 bytes, first 24 key bytes
pub fn tdes_cbc_decrypt(key: &[u8], data: &[u8]) -> Option<Vec<u8>> {
    if key.len() < 24 {
        return None;
    }
    let len = data.len() / 8 * 8;
    if len == 0 {
        return None;
    }
    let mut buf = data[..len].to_vec();
    TdesCbcDec::new_from_slices(&key[..24], &[0u8; 8])
        .ok()?
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .ok()?;
    Some(buf)
}

/// Keyword occurrences, ASCII case-insensitive
pub fn count_message_keywords(data: &[u8]) -> usize {
    KEYWORD_MATCHER
        .as_ref()
        .map(|ac| ac.find_iter(data).count())
        .unwrap_or(0)
}

/// Distinct e-mail addresses and phone numbers
pub fn count_contacts(data: &[u8]) -> usize {
    let mut seen: HashSet<&[u8]> = HashSet::new();
    for m in EMAIL.find_iter(data).chain(PHONE.find_iter(data)) {
        seen.insert(m.as_bytes());
    }
    seen.len()
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    key: usize,
    method: CipherMethod,
}

/// Tries every key against a record and keeps the best transform
#[derive(Debug, Clone, Copy)]
pub struct DecryptionEngine {
    window: usize,
    min_string_length: usize,
}

impl Default for DecryptionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_DECRYPTION_WINDOW)
    }
}

impl DecryptionEngine {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            min_string_length: DEFAULT_MIN_LENGTH,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Finds the best-scoring transform for `ciphertext`
    ///
    /// A leading `REMF` header is stripped before decryption. With no key,
    /// or when nothing yields a printable string, the attempt reports method
    /// `none` and `success = false`.
    pub fn decrypt(&self, source: &str, ciphertext: &[u8], keys: &[KeyMaterial]) -> DecryptionAttempt {
        let stripped = ciphertext.starts_with(&REMF_MAGIC);
        let body = if stripped {
            &ciphertext[REMF_MAGIC.len()..]
        } else {
            ciphertext
        };
        let body = &body[..body.len().min(self.window)];

        let candidates: Vec<Candidate> = keys
            .iter()
            .enumerate()
            .flat_map(|(key, _)| {
                CipherMethod::ALL
                    .iter()
                    .map(move |&method| Candidate { key, method })
            })
            .collect();

        let scores: Vec<usize> = candidates
            .par_iter()
            .map(|c| {
                c.method
                    .apply(&keys[c.key].bytes, body)
                    .map(|plain| count_strings(&plain, self.min_string_length))
                    .unwrap_or(0)
            })
            .collect();

        let mut best: Option<(usize, usize)> = None;
        for (idx, &score) in scores.iter().enumerate() {
            if score > best.map(|(_, s)| s).unwrap_or(0) {
                best = Some((idx, score));
            }
        }

        let Some((idx, score)) = best else {
            tracing::debug!(source, keys = keys.len(), "no transform produced printable output");
            return DecryptionAttempt::failed(source);
        };
        let winner = candidates[idx];
        let key = &keys[winner.key];
        let Some(plain) = winner.method.apply(&key.bytes, body) else {
            return DecryptionAttempt::failed(source);
        };

        let method = if stripped {
            format!("{} ({}, REMF stripped)", winner.method, key.name)
        } else {
            format!("{} ({})", winner.method, key.name)
        };
        tracing::debug!(source, %method, score, "best decryption candidate");

        DecryptionAttempt {
            source: source.to_string(),
            method,
            success: true,
            extracted_strings: score,
            message_keywords: count_message_keywords(&plain),
            contacts: count_contacts(&plain),
            media_signatures: count_media_signatures(&plain),
            preview: PrintableRuns::new(&plain, self.min_string_length)
                .take(PREVIEW_STRINGS)
                .map(|(_, run)| String::from_utf8_lossy(&run[..run.len().min(PREVIEW_CHARS)]).into_owned())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plaintext() -> Vec<u8> {
        let mut data = Vec::new();
        for i in 0..40 {
            data.extend_from_slice(format!("message {} from alice@example.com", i).as_bytes());
            data.push(0);
        }
        data
    }

    fn key(name: &str, bytes: &[u8]) -> KeyMaterial {
        KeyMaterial {
            name: name.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn xor_round_trip_wins() {
        let k: Vec<u8> = (0..16u8).map(|i| 0x80 | i.wrapping_mul(37)).collect();
        let cipher = xor_stream(&k, &plaintext()).unwrap();
        let attempt = DecryptionEngine::default().decrypt("a.rem", &cipher, &[key("device.key", &k)]);
        assert!(attempt.success);
        assert_eq!(attempt.method, "XOR (device.key)");
        assert_eq!(attempt.extracted_strings, 40);
        assert_eq!(attempt.contacts, 1);
        assert!(attempt.message_keywords >= 40);
        assert_eq!(attempt.preview.len(), PREVIEW_STRINGS);
    }

    #[test]
    fn aes_round_trip_with_remf_header() {
        use cbc::cipher::BlockEncryptMut;
        type Enc = cbc::Encryptor<aes::Aes128>;

        let k = [0x42u8; 16];
        let mut plain = plaintext();
        plain.resize(plain.len().div_ceil(16) * 16, 0);
        let len = plain.len();
        Enc::new_from_slices(&k, &[0u8; 16])
            .unwrap()
            .encrypt_padded_mut::<NoPadding>(&mut plain, len)
            .unwrap();
        let mut cipher = REMF_MAGIC.to_vec();
        cipher.extend_from_slice(&plain);

        let attempt = DecryptionEngine::default().decrypt("b.rem", &cipher, &[key("k", &k)]);
        assert!(attempt.success);
        assert_eq!(attempt.method, "AES-128-CBC (k, REMF stripped)");
    }

    #[test]
    fn short_keys_skip_block_ciphers() {
        assert!(aes128_cbc_decrypt(&[1; 15], &[0; 32]).is_none());
        assert!(tdes_cbc_decrypt(&[1; 23], &[0; 32]).is_none());
        assert!(xor_stream(&[], &[0; 32]).is_none());
    }

    #[test]
    fn nothing_printable_is_failure() {
        let attempt = DecryptionEngine::default().decrypt("c.rem", &[0u8; 64], &[key("z", &[0u8; 4])]);
        assert!(!attempt.success);
        assert_eq!(attempt.method, "none");
        let no_keys = DecryptionEngine::default().decrypt("c.rem", b"hello world", &[]);
        assert!(!no_keys.success);
    }

    #[test]
    fn contacts_are_deduplicated() {
        let data = b"bob@example.org, bob@example.org, +1 555 0100 99";
        assert_eq!(count_contacts(data), 2);
    }
}
