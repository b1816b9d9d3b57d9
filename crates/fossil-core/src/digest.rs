//! # Content Digest — Algorithm-Tagged SHA-256 Identifiers
//!
//! Defines `ContentDigest` and `DigestAlgorithm`. A digest is always derived
//! from exactly one canonical byte sequence and is immutable once computed.
//!
//! ## Text Format
//!
//! `sha256:` followed by exactly 64 lowercase hexadecimal characters. This
//! is both the `Display` form and the serde representation. Parsing any
//! other text fails with [`FossilError::MalformedDigest`].
//!
//! ## Security Invariant
//!
//! `sha256_digest()` accepts only `&CanonicalBytes`, so every digest in the
//! system is computed over canonicalized input.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::FossilError;

/// The hash algorithm used to produce a content digest.
///
/// Only SHA-256 exists today. The tag travels with every digest so a second
/// algorithm can be introduced without ambiguity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DigestAlgorithm {
    /// SHA-256.
    Sha256,
}

impl DigestAlgorithm {
    /// Returns the algorithm identifier used as the text prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }

    /// Length of the raw digest in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Sha256 => 32,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content-addressed digest with its algorithm tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentDigest {
    algorithm: DigestAlgorithm,
    bytes: [u8; 32],
}

impl ContentDigest {
    /// Create a digest from raw bytes and algorithm.
    ///
    /// Prefer [`sha256_digest()`] when hashing canonical bytes.
    pub fn new(algorithm: DigestAlgorithm, bytes: [u8; 32]) -> Self {
        Self { algorithm, bytes }
    }

    /// The algorithm that produced this digest.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Render the digest bytes as lowercase hex, without the prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse `sha256:<64 lowercase hex>`.
    pub fn parse(text: &str) -> Result<Self, FossilError> {
        let malformed = |reason| FossilError::MalformedDigest {
            value: text.to_string(),
            reason,
        };
        let (prefix, hex_part) = text
            .split_once(':')
            .ok_or_else(|| malformed("missing `<algorithm>:` prefix"))?;
        let algorithm = match prefix {
            "sha256" => DigestAlgorithm::Sha256,
            _ => return Err(malformed("unsupported algorithm prefix")),
        };
        if hex_part.len() != algorithm.output_len() * 2 {
            return Err(malformed("expected exactly 64 hex characters"));
        }
        if !hex_part
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(malformed("digest hex must be lowercase [0-9a-f]"));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex_part, &mut bytes).map_err(|_| malformed("invalid hex"))?;
        Ok(Self::new(algorithm, bytes))
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

impl FromStr for ContentDigest {
    type Err = FossilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Compute a SHA-256 content digest from canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let hash = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest::new(DigestAlgorithm::Sha256, bytes)
}

/// Compute a SHA-256 hex string (no prefix) from canonical bytes.
pub fn sha256_hex(data: &CanonicalBytes) -> String {
    sha256_digest(data).to_hex()
}
