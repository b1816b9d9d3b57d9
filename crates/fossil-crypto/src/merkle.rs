//! # Ordered Binary Merkle Tree
//!
//! Commits to an ordered sequence of leaf digests (one per snapshot, or one
//! per ledger line) with a single root digest.
//!
//! ## Algorithm
//!
//! - Leaves are used as given. They are already SHA-256 digests of
//!   canonical bytes, so no extra leaf hashing or prefixing is applied.
//! - Node: `SHA256(left || right)` over the raw 32-byte digests.
//! - A level with an odd number of nodes duplicates its last node before
//!   pairing, so `[a, b, c]` hashes exactly like `[a, b, c, c]`.
//! - A single leaf is its own root. Zero leaves is an error.
//!
//! Leaf order is significant: swapping two distinct leaves changes the root.

use fossil_core::{ContentDigest, FossilError};
use serde::{Deserialize, Serialize};

use crate::sha256::hash_pair;

// ---------------------------------------------------------------------------
// Root computation
// ---------------------------------------------------------------------------

/// Compute the Merkle root over an ordered list of leaf digests.
///
/// # Errors
///
/// Returns [`FossilError::EmptyLeafSet`] when `leaves` is empty.
pub fn merkle_root(leaves: &[ContentDigest]) -> Result<ContentDigest, FossilError> {
    let first = leaves.first().ok_or(FossilError::EmptyLeafSet)?;
    if leaves.len() == 1 {
        return Ok(*first);
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = next_level(&level);
    }
    Ok(level[0])
}

/// Hash one level into its parent level, duplicating the last node when odd.
fn next_level(level: &[ContentDigest]) -> Vec<ContentDigest> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            hash_pair(left, pair.get(1).unwrap_or(left))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tree with retained levels
// ---------------------------------------------------------------------------

/// A fully materialized Merkle tree. Keeps every level so inclusion proofs
/// can be produced without rehashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    /// `levels[0]` holds the leaves, the last level holds the root alone.
    levels: Vec<Vec<ContentDigest>>,
}

impl MerkleTree {
    /// Build a tree over the given leaves.
    pub fn build(leaves: &[ContentDigest]) -> Result<Self, FossilError> {
        if leaves.is_empty() {
            return Err(FossilError::EmptyLeafSet);
        }
        let mut levels = vec![leaves.to_vec()];
        while let Some(top) = levels.last().filter(|l| l.len() > 1) {
            let parent = next_level(top);
            levels.push(parent);
        }
        Ok(Self { levels })
    }

    /// The root digest.
    pub fn root(&self) -> ContentDigest {
        // `build` guarantees at least one level with exactly one node on top.
        self.levels[self.levels.len() - 1][0]
    }

    /// Number of leaves the tree was built from.
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// The leaves in their original order.
    pub fn leaves(&self) -> &[ContentDigest] {
        &self.levels[0]
    }

    /// Produce the inclusion proof for the leaf at `index`.
    pub fn proof(&self, index: usize) -> Result<InclusionProof, FossilError> {
        let size = self.leaf_count();
        if index >= size {
            return Err(FossilError::LeafIndexOutOfRange { index, size });
        }
        let mut path = Vec::with_capacity(self.levels.len().saturating_sub(1));
        let mut pos = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let step = if pos % 2 == 0 {
                // Right sibling, or the node itself when it is the odd one out.
                let sibling = level.get(pos + 1).unwrap_or(&level[pos]);
                PathStep {
                    side: Side::Right,
                    hash: *sibling,
                }
            } else {
                PathStep {
                    side: Side::Left,
                    hash: level[pos - 1],
                }
            };
            path.push(step);
            pos /= 2;
        }
        Ok(InclusionProof {
            leaf_index: index,
            leaf_count: size,
            leaf: self.levels[0][index],
            path,
        })
    }
}

// ---------------------------------------------------------------------------
// Running root
// ---------------------------------------------------------------------------

/// Append-only Merkle accumulator.
///
/// After every [`push`](Self::push) the root equals [`merkle_root`] over all
/// leaves pushed so far. Each push rehashes only the rightmost node of every
/// level, so a run of `n` pushes costs `O(n log n)` hashes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MerkleAccumulator {
    levels: Vec<Vec<ContentDigest>>,
}

impl MerkleAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a leaf and return the new root.
    pub fn push(&mut self, leaf: ContentDigest) -> ContentDigest {
        if self.levels.is_empty() {
            self.levels.push(Vec::new());
        }
        self.levels[0].push(leaf);
        let mut h = 0;
        while self.levels[h].len() > 1 {
            let level = &self.levels[h];
            let parent_index = (level.len() - 1) / 2;
            let left = &level[2 * parent_index];
            let parent = hash_pair(left, level.get(2 * parent_index + 1).unwrap_or(left));
            if self.levels.len() == h + 1 {
                self.levels.push(Vec::new());
            }
            let up = &mut self.levels[h + 1];
            if parent_index < up.len() {
                up[parent_index] = parent;
            } else {
                up.push(parent);
            }
            h += 1;
        }
        self.levels[h][0]
    }

    /// The current root, or `None` before the first push.
    pub fn root(&self) -> Option<ContentDigest> {
        self.levels.last().and_then(|top| top.first()).copied()
    }

    /// Number of leaves pushed.
    pub fn len(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Inclusion proofs
// ---------------------------------------------------------------------------

/// Which side of the running hash a sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Sibling is hashed first: `H(sibling || acc)`.
    Left,
    /// Sibling is hashed second: `H(acc || sibling)`.
    Right,
}

/// One step of an inclusion path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub side: Side,
    pub hash: ContentDigest,
}

/// Proof that `leaf` sits at `leaf_index` in a tree of `leaf_count` leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    pub leaf_index: usize,
    pub leaf_count: usize,
    pub leaf: ContentDigest,
    pub path: Vec<PathStep>,
}

impl InclusionProof {
    /// Fold the path over the leaf and return the implied root.
    pub fn implied_root(&self) -> ContentDigest {
        self.path.iter().fold(self.leaf, |acc, step| match step.side {
            Side::Left => hash_pair(&step.hash, &acc),
            Side::Right => hash_pair(&acc, &step.hash),
        })
    }
}

/// Verify an inclusion proof against an expected root.
///
/// Besides the hash chain, the path length and the side of every step must
/// agree with `leaf_index` and `leaf_count`, so a proof cannot be replayed
/// for a different position.
pub fn verify_inclusion(proof: &InclusionProof, root: &ContentDigest) -> bool {
    if proof.leaf_count == 0 || proof.leaf_index >= proof.leaf_count {
        return false;
    }
    let mut pos = proof.leaf_index;
    let mut width = proof.leaf_count;
    let mut expected_steps = 0usize;
    for step in &proof.path {
        if width <= 1 {
            return false;
        }
        let expected_side = if pos % 2 == 0 { Side::Right } else { Side::Left };
        if step.side != expected_side {
            return false;
        }
        pos /= 2;
        width = width.div_ceil(2);
        expected_steps += 1;
    }
    if width != 1 || expected_steps != proof.path.len() {
        return false;
    }
    proof.implied_root() == *root
}
