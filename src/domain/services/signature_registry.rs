//! Signature registry service
//!
//! Manages the ordered table of carving signatures and builds immutable
//! matchers from it. Uses Aho-Corasick for O(n+m+z) multi-pattern matching.

use crate::domain::entities::Signature;
use aho_corasick::AhoCorasick;
use parking_lot::RwLock;
use std::sync::Arc;

const MB: u64 = 1024 * 1024;

/// Registry shared between configuration and runs
pub type SharedSignatureRegistry = Arc<RwLock<SignatureRegistry>>;

/// Ordered table of file signatures
///
/// The only mutation after construction is enabling or disabling a
/// signature by name. Runs never scan against the registry directly; they
/// take a [`SignatureSet`] snapshot when they start, so toggles made while
/// a run is in flight affect only later runs.
///
/// # Example
///
/// ```
/// use remnant::domain::services::SignatureRegistry;
///
/// let mut registry = SignatureRegistry::default_signatures();
/// assert!(registry.set_enabled("pdf", false));
/// let set = registry.snapshot();
/// let hits = set.header_hits(&[0xFF, 0xD8, 0xFF, 0xE0]);
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].1.name(), "jpeg");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SignatureRegistry {
    signatures: Vec<Signature>,
}

impl SignatureRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the default media and container signatures
    pub fn default_signatures() -> Self {
        let mut registry = Self::new();

        // JPEG: FF D8 FF .. FF D9
        registry.register(Signature::new(
            "jpeg",
            vec![0xFF, 0xD8, 0xFF],
            Some(vec![0xFF, 0xD9]),
            20 * MB,
            "jpg",
        ));

        // PNG: signature .. IEND chunk type + CRC
        registry.register(Signature::new(
            "png",
            vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
            Some(vec![0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82]),
            20 * MB,
            "png",
        ));

        // GIF89a / GIF87a .. trailer 00 3B
        registry.register(Signature::new(
            "gif89a",
            b"GIF89a".to_vec(),
            Some(vec![0x00, 0x3B]),
            10 * MB,
            "gif",
        ));
        registry.register(Signature::new(
            "gif87a",
            b"GIF87a".to_vec(),
            Some(vec![0x00, 0x3B]),
            10 * MB,
            "gif",
        ));

        registry.register(Signature::new(
            "pdf",
            b"%PDF-".to_vec(),
            Some(b"%%EOF".to_vec()),
            50 * MB,
            "pdf",
        ));

        // ZIP: local file header .. end of central directory (22 bytes
        // without comment, 4 of which are the magic)
        registry.register(
            Signature::new(
                "zip",
                vec![0x50, 0x4B, 0x03, 0x04],
                Some(vec![0x50, 0x4B, 0x05, 0x06]),
                50 * MB,
                "zip",
            )
            .with_trailer(18),
        );

        // No footer: carve a fixed window
        registry.register(Signature::new(
            "sqlite",
            b"SQLite format 3\0".to_vec(),
            None,
            5 * MB,
            "sqlite",
        ));
        registry.register(Signature::new("amr", b"#!AMR\n".to_vec(), None, MB, "amr"));

        // Two-byte header matches almost everywhere in binary data
        registry.register(
            Signature::new("bmp", vec![0x42, 0x4D], None, 10 * MB, "bmp").disabled(),
        );

        registry
    }

    /// Wraps the registry for sharing with configuration code
    pub fn shared(self) -> SharedSignatureRegistry {
        Arc::new(RwLock::new(self))
    }

    /// Registers a new signature, replacing one with the same name
    pub fn register(&mut self, signature: Signature) {
        match self
            .signatures
            .iter_mut()
            .find(|s| s.name() == signature.name())
        {
            Some(existing) => *existing = signature,
            None => self.signatures.push(signature),
        }
    }

    /// Enables or disables a signature by name; false if no such signature
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self
            .signatures
            .iter_mut()
            .find(|s| s.name().eq_ignore_ascii_case(name))
        {
            Some(sig) => {
                sig.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Signature> {
        self.signatures
            .iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }

    /// All signatures in registration order
    pub fn all_signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn enabled_signatures(&self) -> impl Iterator<Item = &Signature> {
        self.signatures.iter().filter(|s| s.is_enabled())
    }

    /// Returns the number of registered signatures
    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    /// Builds an immutable matcher over the currently enabled signatures
    pub fn snapshot(&self) -> SignatureSet {
        SignatureSet::new(self.enabled_signatures().cloned().collect())
    }
}

/// Which part of a signature a pattern belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternRole {
    Header,
    Footer,
}

/// One pattern occurrence inside a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternEvent {
    /// Start index within the buffer
    pub start: usize,
    pub len: usize,
    /// Index into [`SignatureSet::signatures`]
    pub signature: usize,
    pub role: PatternRole,
}

/// Immutable, run-owned view of the enabled signatures
#[derive(Debug, Clone)]
pub struct SignatureSet {
    signatures: Vec<Signature>,
    /// Aho-Corasick automaton over every header and footer
    pattern_matcher: Option<AhoCorasick>,
    /// Maps pattern index to (signature index, role)
    pattern_map: Vec<(usize, PatternRole)>,
    header_matcher: Option<AhoCorasick>,
}

impl SignatureSet {
    pub fn new(signatures: Vec<Signature>) -> Self {
        let mut patterns: Vec<&[u8]> = Vec::new();
        let mut pattern_map = Vec::new();

        for (idx, sig) in signatures.iter().enumerate() {
            patterns.push(sig.header());
            pattern_map.push((idx, PatternRole::Header));
            if let Some(footer) = sig.footer() {
                patterns.push(footer);
                pattern_map.push((idx, PatternRole::Footer));
            }
        }

        let pattern_matcher = if patterns.is_empty() {
            None
        } else {
            AhoCorasick::new(&patterns).ok()
        };
        let header_matcher = if signatures.is_empty() {
            None
        } else {
            AhoCorasick::new(signatures.iter().map(Signature::header)).ok()
        };

        Self {
            signatures,
            pattern_matcher,
            pattern_map,
            header_matcher,
        }
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn get(&self, index: usize) -> Option<&Signature> {
        self.signatures.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Longest header or footer, which sets the scan overlap
    pub fn max_pattern_len(&self) -> usize {
        self.signatures
            .iter()
            .map(Signature::longest_pattern)
            .max()
            .unwrap_or(0)
    }

    /// Header and footer occurrences in `data`, yielded lazily in order of
    /// their end index
    ///
    /// A header can only pair with a footer that starts after the header
    /// ends, so such a header is always yielded before its footer.
    pub fn events<'d>(&'d self, data: &'d [u8]) -> impl Iterator<Item = PatternEvent> + 'd {
        self.pattern_matcher
            .iter()
            .flat_map(move |matcher| matcher.find_overlapping_iter(data))
            .map(move |mat| {
                let (signature, role) = self.pattern_map[mat.pattern().as_usize()];
                PatternEvent {
                    start: mat.start(),
                    len: mat.len(),
                    signature,
                    role,
                }
            })
    }

    /// Finds every header occurrence and returns (offset, signature) pairs
    pub fn header_hits(&self, data: &[u8]) -> Vec<(usize, &Signature)> {
        let Some(matcher) = &self.header_matcher else {
            return Vec::new();
        };
        matcher
            .find_overlapping_iter(data)
            .map(|mat| (mat.start(), &self.signatures[mat.pattern().as_usize()]))
            .collect()
    }

    /// Signatures whose header sits at the very start of `data`
    pub fn find_matches(&self, data: &[u8]) -> Vec<&Signature> {
        self.signatures
            .iter()
            .filter(|sig| sig.matches_header(data))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_by_name_changes_snapshot() {
        let mut registry = SignatureRegistry::default_signatures();
        let before = registry.snapshot().signatures().len();
        assert!(registry.set_enabled("JPEG", false));
        assert_eq!(registry.snapshot().signatures().len(), before - 1);
        assert!(!registry.set_enabled("no-such-format", true));
    }

    #[test]
    fn bmp_is_disabled_by_default() {
        let registry = SignatureRegistry::default_signatures();
        assert!(!registry.get("bmp").unwrap().is_enabled());
        assert!(registry.snapshot().signatures().iter().all(|s| s.name() != "bmp"));
    }

    #[test]
    fn register_replaces_same_name() {
        let mut registry = SignatureRegistry::new();
        registry.register(Signature::new("x", vec![1], None, 10, "bin"));
        registry.register(Signature::new("x", vec![2], None, 10, "bin"));
        assert_eq!(registry.signature_count(), 1);
        assert_eq!(registry.get("x").unwrap().header(), &[2]);
    }

    #[test]
    fn events_are_ordered_and_tagged() {
        let set = SignatureRegistry::default_signatures().snapshot();
        let mut data = vec![0u8; 32];
        data[4..7].copy_from_slice(&[0xFF, 0xD8, 0xFF]);
        data[20..22].copy_from_slice(&[0xFF, 0xD9]);
        let events: Vec<PatternEvent> = set.events(&data).collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].role, PatternRole::Header);
        assert_eq!(events[0].start, 4);
        assert_eq!(events[1].role, PatternRole::Footer);
        assert_eq!(events[1].start, 20);
    }

    #[test]
    fn max_pattern_len_covers_sqlite_header() {
        let set = SignatureRegistry::default_signatures().snapshot();
        assert_eq!(set.max_pattern_len(), 16);
    }
}
