//! # Transcript Ledger
//!
//! An append-only log of snapshot digests. Every appended line records the
//! leaf digest and the Merkle root over all leaves so far, so any prefix of
//! the ledger can be checked on its own.
//!
//! Snapshots appended here are digested as `Snapshot` scopes, so the final
//! ledger root over a run equals that run's transcript `merkle_root`.

use fossil_core::{digest, CanonicalValue, ContentDigest, FossilError, Scope};
use fossil_crypto::MerkleAccumulator;
use serde::{Deserialize, Serialize};

use crate::error::TranscriptError;
use crate::validator::Mismatch;

/// Schema tag carried by every ledger line.
pub const LEDGER_LINE_SCHEMA_VERSION: &str = "fossil.ledger-line.v1";

/// One appended leaf and the running root after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub schema_version: String,
    /// 1-based position in the ledger.
    pub seq: u64,
    pub leaf_digest: ContentDigest,
    pub merkle_root: ContentDigest,
}

/// In-memory append-only ledger.
#[derive(Debug, Clone, Default)]
pub struct TranscriptLedger {
    leaves: Vec<ContentDigest>,
    lines: Vec<LedgerLine>,
    tree: MerkleAccumulator,
}

impl TranscriptLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Digest `snapshot` as the next snapshot scope and append it.
    pub fn append(&mut self, snapshot: &CanonicalValue) -> Result<LedgerLine, TranscriptError> {
        let leaf = digest(&Scope::snapshot(self.leaves.len(), snapshot.clone()))?;
        self.append_digest(leaf)
    }

    /// Append an already computed leaf digest.
    pub fn append_digest(&mut self, leaf: ContentDigest) -> Result<LedgerLine, TranscriptError> {
        self.leaves.push(leaf);
        let root = self.tree.push(leaf);
        let line = LedgerLine {
            schema_version: LEDGER_LINE_SCHEMA_VERSION.to_string(),
            seq: self.leaves.len() as u64,
            leaf_digest: leaf,
            merkle_root: root,
        };
        tracing::debug!(seq = line.seq, leaf = %leaf, root = %root, "appended ledger line");
        self.lines.push(line.clone());
        Ok(line)
    }

    /// The current root, or `None` for an empty ledger.
    pub fn root(&self) -> Option<ContentDigest> {
        self.lines.last().map(|line| line.merkle_root)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[LedgerLine] {
        &self.lines
    }

    pub fn leaves(&self) -> &[ContentDigest] {
        &self.leaves
    }
}

/// Result of [`verify_ledger`] and [`verify_ledger_against`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerVerification {
    /// Number of lines read.
    pub count: usize,
    /// Root recomputed over every leaf, `None` for an empty ledger.
    pub merkle_root: Option<ContentDigest>,
    /// Lines whose recorded root disagrees with the recomputed one, plus a
    /// `ledger.anchor` entry when the final root misses the anchor.
    pub mismatches: Vec<Mismatch>,
    /// Line count the ledger was anchored to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_count: Option<usize>,
}

impl LedgerVerification {
    pub fn is_valid(&self) -> bool {
        self.mismatches.is_empty() && self.count_matches()
    }

    /// False when an anchored line count disagrees with the lines read.
    pub fn count_matches(&self) -> bool {
        self.expected_count.map_or(true, |n| n == self.count)
    }
}

/// Where a complete ledger must end: the root over all of its leaves and,
/// optionally, how many lines it has. A transcript's `merkle_root` and
/// `tick_count` are a natural anchor for the ledger of the same run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerAnchor {
    pub merkle_root: ContentDigest,
    pub count: Option<usize>,
}

/// Recompute the running root of every line.
///
/// # Errors
///
/// `SequenceGap` when `seq` is not `1, 2, 3, ...`.
pub fn verify_ledger(lines: &[LedgerLine]) -> Result<LedgerVerification, TranscriptError> {
    let mut tree = MerkleAccumulator::new();
    let mut mismatches = Vec::new();
    for (expected, line) in (1u64..).zip(lines) {
        if line.seq != expected {
            return Err(TranscriptError::SequenceGap {
                expected,
                found: line.seq,
            });
        }
        if line.schema_version != LEDGER_LINE_SCHEMA_VERSION {
            tracing::warn!(
                seq = line.seq,
                recorded = %line.schema_version,
                "unexpected ledger line schema"
            );
        }
        let actual = tree.push(line.leaf_digest);
        if actual != line.merkle_root {
            tracing::warn!(
                seq = line.seq,
                stored = %line.merkle_root,
                recomputed = %actual,
                "ledger root mismatch"
            );
            mismatches.push(Mismatch {
                scope: format!("ledger[{}]", line.seq),
                expected: line.merkle_root,
                actual,
            });
        }
    }
    tracing::info!(count = lines.len(), mismatches = mismatches.len(), "ledger verified");
    Ok(LedgerVerification {
        count: lines.len(),
        merkle_root: tree.root(),
        mismatches,
        expected_count: None,
    })
}

/// Verify the running roots, then require the ledger to end at `anchor`.
///
/// A ledger with lines cut off the end is internally consistent, so only an
/// anchor taken from elsewhere can reveal the truncation.
///
/// # Errors
///
/// `SequenceGap` as for [`verify_ledger`], and `EmptyLeafSet` when the
/// ledger has no lines to reach the anchored root.
pub fn verify_ledger_against(
    lines: &[LedgerLine],
    anchor: &LedgerAnchor,
) -> Result<LedgerVerification, TranscriptError> {
    let mut check = verify_ledger(lines)?;
    let actual = check.merkle_root.ok_or(FossilError::EmptyLeafSet)?;
    if actual != anchor.merkle_root {
        tracing::warn!(
            anchor = %anchor.merkle_root,
            recomputed = %actual,
            "ledger misses its anchor"
        );
        check.mismatches.push(Mismatch {
            scope: "ledger.anchor".to_string(),
            expected: anchor.merkle_root,
            actual,
        });
    }
    check.expected_count = anchor.count;
    if !check.count_matches() {
        tracing::warn!(
            expected = ?anchor.count,
            found = check.count,
            "ledger line count differs from anchor"
        );
    }
    Ok(check)
}
