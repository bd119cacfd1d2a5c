//! Records describing key material and encrypted device record files

use serde::Serialize;
use std::fmt;

/// Key files smaller than this are treated as device keys
pub const DEVICE_KEY_MAX_SIZE: u64 = 512;

/// Size-based guess at what a key file holds. Not a parsed certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyType {
    #[serde(rename = "Device Key")]
    DeviceKey,
    #[serde(rename = "Certificate/RSA Key")]
    CertificateOrRsaKey,
}

impl KeyType {
    pub fn from_size(size: u64) -> Self {
        if size < DEVICE_KEY_MAX_SIZE {
            KeyType::DeviceKey
        } else {
            KeyType::CertificateOrRsaKey
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::DeviceKey => f.write_str("Device Key"),
            KeyType::CertificateOrRsaKey => f.write_str("Certificate/RSA Key"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyFileRecord {
    pub filename: String,
    pub relative_path: String,
    pub size: u64,
    /// Offset-prefixed hex dump of the leading bytes
    pub hex_dump: String,
    pub key_type: KeyType,
}

/// Candidate key bytes handed to the decryption engine
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    /// File name, used in method labels
    pub name: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Triage summary of one `.rem` record file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemFileRecord {
    pub filename: String,
    pub relative_path: String,
    pub size: u64,
    /// Shannon entropy of the leading sample, bits per byte
    pub entropy: f64,
    /// Entropy above the encryption threshold
    pub encrypted: bool,
    /// Starts with the `REMF` magic
    pub has_header_magic: bool,
    /// Encrypted and at least one key file is available
    pub decryptable: bool,
    pub printable_strings: usize,
    pub media_signatures: usize,
    pub has_sqlite_signature: bool,
}

/// Label used when no transform produced any printable strings
pub const NO_METHOD: &str = "none";

/// The best-scoring decryption transform for one REM file.
///
/// `success` only means some transform produced printable strings; it is a
/// ranking, not proof that the plaintext is correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecryptionAttempt {
    /// Relative path of the REM file
    pub source: String,
    /// Cipher, key file name and whether the REMF header was stripped
    pub method: String,
    pub success: bool,
    pub extracted_strings: usize,
    pub message_keywords: usize,
    pub contacts: usize,
    pub media_signatures: usize,
    /// First few strings of the winning plaintext
    pub preview: Vec<String>,
}

impl DecryptionAttempt {
    /// The result reported when nothing scored
    pub fn failed(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            method: NO_METHOD.to_string(),
            success: false,
            extracted_strings: 0,
            message_keywords: 0,
            contacts: 0,
            media_signatures: 0,
            preview: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_type_boundary() {
        assert_eq!(KeyType::from_size(511), KeyType::DeviceKey);
        assert_eq!(KeyType::from_size(512), KeyType::CertificateOrRsaKey);
    }

    #[test]
    fn key_material_debug_hides_bytes() {
        let key = KeyMaterial {
            name: "device.key".into(),
            bytes: vec![0xAA; 16],
        };
        let rendered = format!("{:?}", key);
        assert!(!rendered.contains("170"));
        assert!(rendered.contains("len: 16"));
    }
}
