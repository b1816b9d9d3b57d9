//! # fossil-core — Canonical Values and Content Digests
//!
//! This crate is the leaf of the Fossil workspace. It turns structured
//! artifacts into canonical bytes and canonical bytes into content digests.
//! Every other crate depends on `fossil-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One closed value type.** [`CanonicalValue`] is a tagged union over
//!    null, bool, number, string, sequence and mapping. Loosely typed input
//!    (JSON text, YAML, any `Serialize` type) is converted into it once, at
//!    the boundary.
//!
//! 2. **`CanonicalBytes` newtype.** All digest computation flows through
//!    [`CanonicalBytes`]. Its inner buffer is private, so the only way to
//!    obtain one is through the canonicalizer.
//!
//! 3. **`sha256_digest()` accepts only `&CanonicalBytes`.** Raw byte slices
//!    cannot be digested by accident.
//!
//! 4. **Exclusions are part of the scope kind.** A [`Scope`] of kind
//!    `Transcript` always excludes `transcript_digest` and
//!    `attestation.signature`; callers cannot forget them.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `fossil-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - No logging: every function here is pure.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod scope;
mod ser;

// Re-export primary types for ergonomic imports.
pub use canonical::{
    canonicalize, check_integer_literals, CanonicalBytes, CanonicalValue, Number, CANONICALIZER_ID,
};
pub use digest::{sha256_digest, sha256_hex, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, FossilError};
pub use scope::{
    digest, digest_unsealed, verify_embedded_digest, EmbeddedDigestCheck, FieldPath, Scope,
    ScopeKind,
};
