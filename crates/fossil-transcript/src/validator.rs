//! # Envelope Validator
//!
//! Recomputes every digest a [`SealedArtifact`] stores and reports each
//! disagreement. Stored digests are never used as inputs to their own
//! check: each one is compared against a value recomputed from the body it
//! covers.
//!
//! Higher-level digests are recomputed from the *stored* lower-level
//! digests, not from freshly recomputed ones. A corrupted snapshot body
//! therefore shows up once, as `snapshot[i]`, instead of cascading into the
//! Merkle root, transcript and envelope.
//!
//! Mismatches are data. Only structural problems are errors: a stored
//! digest whose body is gone, a Merkle root over no leaves, or a body that
//! cannot be canonicalized.

use std::collections::BTreeSet;
use std::fmt;

use fossil_core::{digest, ContentDigest, FossilError, Scope, CANONICALIZER_ID};
use fossil_crypto::merkle_root;
use serde::{Deserialize, Serialize};

use crate::envelope::{IndexKey, SealedArtifact, TRANSCRIPT_SCHEMA_VERSION};
use crate::error::TranscriptError;

/// A stored digest that disagrees with its recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    /// Scope name, e.g. `component:plant` or `snapshot[3]`.
    pub scope: String,
    /// The digest stored in the artifact.
    pub expected: ContentDigest,
    /// The digest recomputed from the body.
    pub actual: ContentDigest,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: stored {} but recomputed {}",
            self.scope, self.expected, self.actual
        )
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Scopes whose stored digest was recomputed, in check order.
    pub checked: Vec<String>,
    /// Every disagreement found.
    pub mismatches: Vec<Mismatch>,
    /// Scopes left unverified: placeholder digests, or bodies with no digest.
    pub unchecked: Vec<String>,
    /// Index-key fields that are empty or unset.
    pub missing_index_fields: Vec<String>,
    /// Stored fields that contradict each other, e.g. a `tick_count` that
    /// differs from the number of snapshot digests.
    #[serde(default)]
    pub inconsistencies: Vec<String>,
    /// The index key, when every field is present.
    pub index_key: Option<IndexKey>,
}

impl ValidationReport {
    /// True only with no mismatches, nothing unchecked, no inconsistencies
    /// and a complete key.
    pub fn is_sealed(&self) -> bool {
        self.mismatches.is_empty()
            && self.unchecked.is_empty()
            && self.inconsistencies.is_empty()
            && self.missing_index_fields.is_empty()
            && self.index_key.is_some()
    }

    /// The index key of a sealed artifact, or the mismatches.
    ///
    /// The error list is empty when the artifact failed only because a
    /// scope was unchecked, a field was inconsistent or the index key is
    /// incomplete.
    pub fn into_result(self) -> Result<IndexKey, Vec<Mismatch>> {
        if !self.is_sealed() {
            return Err(self.mismatches);
        }
        self.index_key.ok_or(self.mismatches)
    }

    fn check(&mut self, scope: &str, stored: Option<&ContentDigest>, actual: ContentDigest) {
        let Some(expected) = stored else {
            tracing::debug!(scope, "digest is a placeholder, not checked");
            self.unchecked.push(scope.to_string());
            return;
        };
        self.checked.push(scope.to_string());
        if *expected == actual {
            tracing::debug!(scope, digest = %actual, "digest verified");
        } else {
            tracing::warn!(scope, stored = %expected, recomputed = %actual, "digest mismatch");
            self.mismatches.push(Mismatch {
                scope: scope.to_string(),
                expected: *expected,
                actual,
            });
        }
    }
}

/// Validate every stored digest of a sealed artifact.
///
/// # Errors
///
/// - `MissingScope` when a digest is stored but its body is absent.
/// - `EmptyLeafSet` when a Merkle root is stored over zero snapshot digests.
/// - `UnsupportedValue` when a body cannot be canonicalized.
pub fn validate(artifact: &SealedArtifact) -> Result<ValidationReport, TranscriptError> {
    let envelope = &artifact.envelope;
    let transcript = &envelope.transcript;
    let scopes = &artifact.scopes;
    let span = tracing::info_span!(
        "validate",
        kernel = %envelope.kernel,
        domain = %envelope.domain
    );
    let _guard = span.enter();

    if transcript.canonicalizer != CANONICALIZER_ID {
        tracing::warn!(
            recorded = %transcript.canonicalizer,
            supported = CANONICALIZER_ID,
            "transcript was produced by a different canonicalizer"
        );
    }
    if transcript.schema_version != TRANSCRIPT_SCHEMA_VERSION {
        tracing::warn!(
            recorded = %transcript.schema_version,
            "unexpected transcript schema version"
        );
    }

    let mut report = ValidationReport::default();

    // Components: union of stored digests and supplied bodies.
    let names: BTreeSet<&String> = transcript
        .component_digests
        .keys()
        .chain(scopes.components.keys())
        .collect();
    for name in names {
        let stored = transcript.component_digests.get(name);
        let scope_name = format!("component:{name}");
        match scopes.components.get(name) {
            Some(body) => {
                let actual = digest(&Scope::component(name, body.clone()))?;
                report.check(&scope_name, stored, actual);
            }
            None => return Err(FossilError::MissingScope(scope_name).into()),
        }
    }

    match (&scopes.initial_state, &transcript.initial_state_digest) {
        (Some(body), stored) => {
            let actual = digest(&Scope::initial_state(body.clone()))?;
            report.check("initial_state", stored.as_ref(), actual);
        }
        (None, Some(_)) => return Err(FossilError::MissingScope("initial_state".into()).into()),
        (None, None) => report.unchecked.push("initial_state".into()),
    }

    match (&scopes.controls, &transcript.controls_digest) {
        (Some(body), stored) => {
            let actual = digest(&Scope::controls(body.clone()))?;
            report.check("controls", stored.as_ref(), actual);
        }
        (None, Some(_)) => return Err(FossilError::MissingScope("controls".into()).into()),
        (None, None) => report.unchecked.push("controls".into()),
    }

    report.check("inputs", envelope.input_ref.as_ref(), transcript.input_ref()?);

    let snapshot_count = scopes.snapshots.len().max(transcript.snapshot_digests.len());
    for i in 0..snapshot_count {
        let scope_name = format!("snapshot[{i}]");
        let stored = transcript.snapshot_digests.get(i);
        match scopes.snapshots.get(i) {
            Some(body) => {
                let actual = digest(&Scope::snapshot(i, body.clone()))?;
                report.check(&scope_name, stored, actual);
            }
            None => return Err(FossilError::MissingScope(scope_name).into()),
        }
    }

    let leaves = transcript.snapshot_digests.len();
    if usize::try_from(transcript.tick_count).ok() != Some(leaves) {
        tracing::warn!(
            tick_count = transcript.tick_count,
            snapshot_digests = leaves,
            "tick count disagrees with snapshot digests"
        );
        report.inconsistencies.push(format!(
            "tick_count: stored {} but transcript holds {leaves} snapshot digests",
            transcript.tick_count
        ));
    }

    match &transcript.merkle_root {
        Some(stored) => {
            let actual = merkle_root(&transcript.snapshot_digests)?;
            report.check("merkle_root", Some(stored), actual);
        }
        None => report.unchecked.push("merkle_root".into()),
    }

    report.check(
        "transcript",
        transcript.transcript_digest.as_ref(),
        transcript.compute_digest()?,
    );
    report.check(
        "envelope",
        envelope.artifact_digest.as_ref(),
        envelope.compute_digest()?,
    );

    report.missing_index_fields = envelope.missing_index_fields();
    report.index_key = envelope.index_key().ok();

    tracing::info!(
        checked = report.checked.len(),
        mismatches = report.mismatches.len(),
        unchecked = report.unchecked.len(),
        inconsistencies = report.inconsistencies.len(),
        stage = %envelope.stage(),
        sealed = report.is_sealed(),
        "validation finished"
    );
    Ok(report)
}
