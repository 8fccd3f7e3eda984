//! # Hashing Utilities
//!
//! Keccak-256, the hash EVM tooling agrees on. Note this is the original
//! Keccak submission, not the padded NIST SHA3-256; the two disagree on every
//! input, and verifiers written against `ethers`/`go-ethereum` expect Keccak.

use sha3::{Digest as _, Keccak256};

/// Keccak-256 over `data`.
///
/// # Example
///
/// ```
/// use ynx_preconfirm::crypto::keccak256;
///
/// let hash = keccak256(b"");
/// assert_eq!(
///     hex::encode(hash),
///     "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
/// );
/// ```
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Keccak-256 over a sequence of byte slices, without concatenating them first.
pub fn keccak256_parts<'a, I>(parts: I) -> [u8; 32]
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_known_vector() {
        // keccak256("abc"), the classic Ethereum test vector.
        assert_eq!(
            hex::encode(keccak256(b"abc")),
            "4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
        );
    }

    #[test]
    fn parts_match_concatenation() {
        let whole = keccak256(b"preconfirm-receipt");
        let split = keccak256_parts([&b"preconfirm"[..], &b"-"[..], &b"receipt"[..]]);
        assert_eq!(whole, split);
    }
}
