//! Shannon entropy
//!
//! Used to flag likely-encrypted record files. Compressed data also scores
//! high, so the flag is a hint, not a verdict.

/// Bytes sampled from the start of a file
pub const ENTROPY_SAMPLE: usize = 4096;
/// Entropy (bits per byte) above which data is treated as encrypted
pub const ENCRYPTION_THRESHOLD: f64 = 7.0;

/// Shannon entropy of `data` in bits per byte, in [0.0, 8.0]
///
/// Computed from a 256-bin histogram: `H = -sum(p_i * log2(p_i))`.
pub fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut histogram = [0u64; 256];
    for &byte in data {
        histogram[byte as usize] += 1;
    }

    let total = data.len() as f64;
    histogram
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Entropy of the leading [`ENTROPY_SAMPLE`] bytes
pub fn sample_entropy(data: &[u8]) -> f64 {
    shannon_entropy(&data[..data.len().min(ENTROPY_SAMPLE)])
}

#[inline]
pub fn is_likely_encrypted(entropy: f64) -> bool {
    entropy > ENCRYPTION_THRESHOLD
}
