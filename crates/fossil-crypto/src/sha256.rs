//! # SHA-256 Node Hashing
//!
//! Interior Merkle nodes are `SHA-256(left || right)` over the 32-byte raw
//! digests. Leaf digests themselves come from `fossil_core::sha256_digest`,
//! which only accepts `CanonicalBytes`.

use fossil_core::{ContentDigest, DigestAlgorithm};
use sha2::{Digest, Sha256};

/// Hash the concatenation of two raw digests.
pub fn hash_pair(left: &ContentDigest, right: &ContentDigest) -> ContentDigest {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    ContentDigest::new(DigestAlgorithm::Sha256, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_pair_is_order_sensitive() {
        let a = ContentDigest::new(DigestAlgorithm::Sha256, [1u8; 32]);
        let b = ContentDigest::new(DigestAlgorithm::Sha256, [2u8; 32]);
        assert_ne!(hash_pair(&a, &b), hash_pair(&b, &a));
    }

    #[test]
    fn hash_pair_hashes_raw_bytes() {
        let a = ContentDigest::new(DigestAlgorithm::Sha256, [0xab; 32]);
        let mut raw = Vec::with_capacity(64);
        raw.extend_from_slice(&[0xab; 32]);
        raw.extend_from_slice(&[0xab; 32]);
        let expected = Sha256::digest(&raw);
        assert_eq!(hash_pair(&a, &a).as_bytes().as_slice(), expected.as_slice());
    }
}
