//! # fossil-crypto — Merkle Roots over Ordered Digests
//!
//! Provides the hashing building blocks above `fossil-core`:
//!
//! - **Node hashing** (`sha256`): SHA-256 over the concatenated *raw* bytes of
//!   two digests. Hex text is never hashed.
//! - **Merkle tree** (`merkle`): ordered binary tree over leaf digests. Odd
//!   levels duplicate their last node before pairing. A single leaf is its
//!   own root. Inclusion proofs carry the sibling path with sides. A
//!   `MerkleAccumulator` keeps the running root of an append-only sequence.
//!
//! ## Crate Policy
//!
//! - Depends only on `fossil-core` internally.
//! - No mocking of hashing in tests; every test uses real SHA-256.
//! - Leaf order is significant and is never normalized.

pub mod merkle;
pub mod sha256;

pub use merkle::{
    merkle_root, verify_inclusion, InclusionProof, MerkleAccumulator, MerkleTree, PathStep, Side,
};
pub use sha256::hash_pair;
