//! # Transcript and Envelope Documents
//!
//! The two sealed document types and the artifact bundle that carries them.
//!
//! ```text
//! SealedArtifact
//! ├── envelope: Envelope
//! │   ├── kernel, domain, input_ref
//! │   ├── transcript: Transcript
//! │   │   ├── component_digests, initial_state_digest, controls_digest
//! │   │   ├── snapshot_digests, merkle_root, tick_count
//! │   │   ├── attestation { signer, signature }
//! │   │   └── transcript_digest      (excluded from its own digest)
//! │   └── artifact_digest            (excluded from its own digest)
//! └── scopes: ScopeSet               (raw bodies behind every digest)
//! ```
//!
//! Digest fields not yet computed hold `null`. The envelope stage is derived
//! from which of the two self-referential digests are present.

use std::collections::BTreeMap;
use std::fmt;

use fossil_core::{
    check_integer_literals, digest, digest_unsealed, CanonicalValue, ContentDigest, FossilError,
    Scope, CANONICALIZER_ID,
};
use serde::{Deserialize, Serialize};

use crate::error::TranscriptError;

/// Schema tag carried by every transcript.
pub const TRANSCRIPT_SCHEMA_VERSION: &str = "fossil.transcript.v1";
/// Schema tag carried by every envelope.
pub const ENVELOPE_SCHEMA_VERSION: &str = "fossil.envelope.v1";

// ─── Transcript ──────────────────────────────────────────────────────

/// Identity of whoever attests the transcript, plus their signature.
///
/// `signature` is excluded from the transcript digest, since it is
/// produced over that digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub signer: String,
    #[serde(default)]
    pub signature: Option<String>,
}

/// The record of one run: every input digest, every snapshot digest in
/// temporal order, and the Merkle root over the snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub schema_version: String,
    pub canonicalizer: String,
    pub component_digests: BTreeMap<String, ContentDigest>,
    pub initial_state_digest: Option<ContentDigest>,
    pub controls_digest: Option<ContentDigest>,
    pub snapshot_digests: Vec<ContentDigest>,
    pub merkle_root: Option<ContentDigest>,
    pub tick_count: u64,
    #[serde(default)]
    pub metadata: BTreeMap<String, CanonicalValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attestation: Option<Attestation>,
    pub transcript_digest: Option<ContentDigest>,
}

/// Shape of the `Inputs` scope whose digest becomes `input_ref`.
#[derive(Serialize)]
struct InputsRef<'a> {
    component_digests: &'a BTreeMap<String, ContentDigest>,
    controls_digest: &'a Option<ContentDigest>,
    initial_state_digest: &'a Option<ContentDigest>,
}

impl Transcript {
    /// An empty transcript with current schema and canonicalizer tags.
    pub fn new() -> Self {
        Self {
            schema_version: TRANSCRIPT_SCHEMA_VERSION.to_string(),
            canonicalizer: CANONICALIZER_ID.to_string(),
            component_digests: BTreeMap::new(),
            initial_state_digest: None,
            controls_digest: None,
            snapshot_digests: Vec::new(),
            merkle_root: None,
            tick_count: 0,
            metadata: BTreeMap::new(),
            attestation: None,
            transcript_digest: None,
        }
    }

    /// The transcript as a `Transcript` scope.
    pub fn scope(&self) -> Result<Scope, FossilError> {
        Ok(Scope::transcript(CanonicalValue::from_serialize(self)?))
    }

    /// Recompute the transcript digest. Never trusts `transcript_digest`.
    pub fn compute_digest(&self) -> Result<ContentDigest, FossilError> {
        digest(&self.scope()?)
    }

    /// Digest the transcript and store the result in `transcript_digest`.
    ///
    /// Fails with `CircularDigestDependency` if the field is already set.
    pub fn seal(&mut self) -> Result<ContentDigest, FossilError> {
        let sealed = digest_unsealed(&self.scope()?)?;
        self.transcript_digest = Some(sealed);
        Ok(sealed)
    }

    /// The `Inputs` scope built from this transcript's stored input digests.
    pub fn inputs_scope(&self) -> Result<Scope, FossilError> {
        let value = CanonicalValue::from_serialize(&InputsRef {
            component_digests: &self.component_digests,
            controls_digest: &self.controls_digest,
            initial_state_digest: &self.initial_state_digest,
        })?;
        Ok(Scope::inputs(value))
    }

    /// Digest of the `Inputs` scope, the value recorded as `input_ref`.
    pub fn input_ref(&self) -> Result<ContentDigest, FossilError> {
        digest(&self.inputs_scope()?)
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Envelope ────────────────────────────────────────────────────────

/// Lifecycle position of an envelope, derived from its digest fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeStage {
    /// Neither digest has been computed.
    Open,
    /// The transcript is sealed; the envelope digest is still a placeholder.
    TranscriptSealed,
    /// Both digests are present.
    Sealed,
}

impl EnvelopeStage {
    /// Stage name used in logs and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::TranscriptSealed => "transcript_sealed",
            Self::Sealed => "sealed",
        }
    }
}

impl fmt::Display for EnvelopeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level wrapper binding a transcript to its kernel, domain and inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub schema_version: String,
    pub kernel: String,
    pub domain: String,
    pub input_ref: Option<ContentDigest>,
    pub transcript: Transcript,
    pub artifact_digest: Option<ContentDigest>,
}

impl Envelope {
    /// An open envelope around `transcript`.
    pub fn new(
        kernel: impl Into<String>,
        domain: impl Into<String>,
        transcript: Transcript,
    ) -> Self {
        Self {
            schema_version: ENVELOPE_SCHEMA_VERSION.to_string(),
            kernel: kernel.into(),
            domain: domain.into(),
            input_ref: None,
            transcript,
            artifact_digest: None,
        }
    }

    /// The envelope as an `Envelope` scope.
    pub fn scope(&self) -> Result<Scope, FossilError> {
        Ok(Scope::envelope(CanonicalValue::from_serialize(self)?))
    }

    /// Recompute the envelope digest. Never trusts `artifact_digest`.
    pub fn compute_digest(&self) -> Result<ContentDigest, FossilError> {
        digest(&self.scope()?)
    }

    /// Digest the envelope and store the result in `artifact_digest`.
    pub fn seal(&mut self) -> Result<ContentDigest, FossilError> {
        let sealed = digest_unsealed(&self.scope()?)?;
        self.artifact_digest = Some(sealed);
        Ok(sealed)
    }

    /// Current lifecycle stage.
    pub fn stage(&self) -> EnvelopeStage {
        match (&self.transcript.transcript_digest, &self.artifact_digest) {
            (Some(_), Some(_)) => EnvelopeStage::Sealed,
            (Some(_), None) => EnvelopeStage::TranscriptSealed,
            _ => EnvelopeStage::Open,
        }
    }

    /// Names of index-key fields that are empty or unset.
    pub fn missing_index_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.kernel.trim().is_empty() {
            missing.push("kernel".to_string());
        }
        if self.domain.trim().is_empty() {
            missing.push("domain".to_string());
        }
        if self.input_ref.is_none() {
            missing.push("input_ref".to_string());
        }
        if self.transcript.transcript_digest.is_none() {
            missing.push("transcript_digest".to_string());
        }
        missing
    }

    /// The storage index key for this envelope.
    pub fn index_key(&self) -> Result<IndexKey, TranscriptError> {
        match (&self.input_ref, &self.transcript.transcript_digest) {
            (Some(input_ref), Some(transcript_digest))
                if self.missing_index_fields().is_empty() =>
            {
                Ok(IndexKey {
                    kernel: self.kernel.clone(),
                    domain: self.domain.clone(),
                    input_ref: *input_ref,
                    transcript_digest: *transcript_digest,
                })
            }
            _ => Err(TranscriptError::IncompleteIndexKey {
                missing: self.missing_index_fields(),
            }),
        }
    }
}

// ─── Index key ───────────────────────────────────────────────────────

/// Storage index for a sealed artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexKey {
    pub kernel: String,
    pub domain: String,
    pub input_ref: ContentDigest,
    pub transcript_digest: ContentDigest,
}

impl IndexKey {
    /// Path-like storage address: `kernel/domain/<input hex>/<transcript hex>`.
    pub fn address(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.kernel,
            self.domain,
            self.input_ref.to_hex(),
            self.transcript_digest.to_hex()
        )
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address())
    }
}

// ─── Scope set and sealed artifact ───────────────────────────────────

/// The raw bodies behind every digest in a transcript.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScopeSet {
    #[serde(default)]
    pub components: BTreeMap<String, CanonicalValue>,
    #[serde(default)]
    pub initial_state: Option<CanonicalValue>,
    #[serde(default)]
    pub controls: Option<CanonicalValue>,
    #[serde(default)]
    pub snapshots: Vec<CanonicalValue>,
}

/// An envelope together with the scope bodies it commits to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealedArtifact {
    pub envelope: Envelope,
    pub scopes: ScopeSet,
}

impl SealedArtifact {
    /// Parse a sealed artifact from JSON text.
    ///
    /// Malformed digest strings anywhere in the envelope are rejected here,
    /// as are integer literals too large to keep exactly.
    pub fn from_json(text: &str) -> Result<Self, TranscriptError> {
        check_integer_literals(text)?;
        Ok(serde_json::from_str(text)?)
    }

    /// Render as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, TranscriptError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Shortcut for `self.envelope.index_key()`.
    pub fn index_key(&self) -> Result<IndexKey, TranscriptError> {
        self.envelope.index_key()
    }
}
