//! # Transcript Assembler
//!
//! Turns a [`ScopeSet`] into a [`SealedArtifact`] in six ordered steps:
//!
//! 1. Digest each component (`component:<name>`).
//! 2. Digest the initial state and the controls.
//! 3. Digest each snapshot (`snapshot[i]`) in temporal order.
//! 4. Merkle root over the snapshot digests, and the `input_ref` digest
//!    over the recorded input digests.
//! 5. Build and seal the transcript, then attach an external signature if
//!    a [`TranscriptSigner`] is present.
//! 6. Build and seal the envelope.
//!
//! Steps 1 and 3 run on the rayon pool when `parallel` is set. Collection
//! preserves key order and index order, so the output is byte-identical
//! to a sequential run.

use std::collections::BTreeMap;

use fossil_core::{digest, CanonicalValue, ContentDigest, FossilError, Scope};
use fossil_crypto::merkle_root;
use rayon::prelude::*;

use crate::config::AssemblerConfig;
use crate::envelope::{Attestation, Envelope, ScopeSet, SealedArtifact, Transcript};
use crate::error::TranscriptError;

/// Produces a signature over a sealed transcript digest.
///
/// Fossil never signs by itself; key handling belongs to the caller.
pub trait TranscriptSigner: Send + Sync {
    fn sign(&self, transcript_digest: &ContentDigest) -> Result<String, TranscriptError>;
}

/// Assembles and seals transcripts for one kernel and domain.
pub struct TranscriptAssembler {
    config: AssemblerConfig,
    signer: Option<Box<dyn TranscriptSigner>>,
}

impl std::fmt::Debug for TranscriptAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptAssembler")
            .field("config", &self.config)
            .field("signer", &self.signer.is_some())
            .finish()
    }
}

impl TranscriptAssembler {
    /// Create an assembler after validating the configuration.
    pub fn new(config: AssemblerConfig) -> Result<Self, TranscriptError> {
        config.validate()?;
        Ok(Self {
            config,
            signer: None,
        })
    }

    /// Attach a signer. Requires `signer` to be set in the configuration,
    /// since the signer identity is part of the transcript digest.
    pub fn with_signer(mut self, signer: Box<dyn TranscriptSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Assemble and seal.
    ///
    /// # Errors
    ///
    /// - `MissingScope` when the initial state or controls are absent.
    /// - `EmptyLeafSet` when there are no snapshots.
    /// - `UnsupportedValue` when any body cannot be canonicalized.
    /// - `Signing` / `Config` from the signer hook.
    pub fn assemble(&self, scopes: ScopeSet) -> Result<SealedArtifact, TranscriptError> {
        let span = tracing::info_span!(
            "assemble",
            kernel = %self.config.kernel,
            domain = %self.config.domain,
            components = scopes.components.len(),
            snapshots = scopes.snapshots.len(),
            parallel = self.config.parallel,
        );
        let _guard = span.enter();

        if self.signer.is_some() && self.config.signer.is_none() {
            return Err(TranscriptError::Config(
                "a transcript signer is attached but `signer` is not configured".into(),
            ));
        }

        // Step 1.
        let component_digests = self.digest_components(&scopes.components)?;

        // Step 2.
        let initial_state = scopes
            .initial_state
            .as_ref()
            .ok_or_else(|| FossilError::MissingScope("initial_state".into()))?;
        let initial_state_digest = digest(&Scope::initial_state(initial_state.clone()))?;
        let controls = scopes
            .controls
            .as_ref()
            .ok_or_else(|| FossilError::MissingScope("controls".into()))?;
        let controls_digest = digest(&Scope::controls(controls.clone()))?;
        tracing::debug!(
            initial_state = %initial_state_digest,
            controls = %controls_digest,
            "digested inputs"
        );

        // Step 3.
        let snapshot_digests = self.digest_snapshots(&scopes.snapshots)?;

        // Step 4.
        let root = merkle_root(&snapshot_digests)?;
        tracing::debug!(
            merkle_root = %root,
            leaves = snapshot_digests.len(),
            "computed merkle root"
        );

        // Step 5.
        let mut transcript = Transcript::new();
        transcript.component_digests = component_digests;
        transcript.initial_state_digest = Some(initial_state_digest);
        transcript.controls_digest = Some(controls_digest);
        transcript.tick_count = snapshot_digests.len() as u64;
        transcript.snapshot_digests = snapshot_digests;
        transcript.merkle_root = Some(root);
        transcript.metadata = self.config.metadata.clone();
        transcript.attestation = self.config.signer.as_ref().map(|signer| Attestation {
            signer: signer.clone(),
            signature: None,
        });
        let input_ref = transcript.input_ref()?;
        let transcript_digest = transcript.seal()?;
        tracing::debug!(transcript_digest = %transcript_digest, "sealed transcript");

        if let (Some(signer), Some(attestation)) = (&self.signer, transcript.attestation.as_mut()) {
            attestation.signature = Some(signer.sign(&transcript_digest)?);
            tracing::debug!(signer = %attestation.signer, "attached transcript signature");
        }

        // Step 6.
        let mut envelope = Envelope::new(&self.config.kernel, &self.config.domain, transcript);
        envelope.input_ref = Some(input_ref);
        let artifact_digest = envelope.seal()?;

        tracing::info!(
            artifact_digest = %artifact_digest,
            transcript_digest = %transcript_digest,
            ticks = envelope.transcript.tick_count,
            "sealed envelope"
        );
        Ok(SealedArtifact { envelope, scopes })
    }

    fn digest_components(
        &self,
        components: &BTreeMap<String, CanonicalValue>,
    ) -> Result<BTreeMap<String, ContentDigest>, FossilError> {
        if self.config.parallel {
            components.par_iter().map(digest_component).collect()
        } else {
            components.iter().map(digest_component).collect()
        }
    }

    fn digest_snapshots(
        &self,
        snapshots: &[CanonicalValue],
    ) -> Result<Vec<ContentDigest>, FossilError> {
        if self.config.parallel {
            snapshots
                .par_iter()
                .enumerate()
                .map(|(i, body)| digest(&Scope::snapshot(i, body.clone())))
                .collect()
        } else {
            snapshots
                .iter()
                .enumerate()
                .map(|(i, body)| digest(&Scope::snapshot(i, body.clone())))
                .collect()
        }
    }
}

fn digest_component(
    (name, body): (&String, &CanonicalValue),
) -> Result<(String, ContentDigest), FossilError> {
    let scope = Scope::component(name, body.clone());
    let component_digest = digest(&scope)?;
    tracing::debug!(scope = scope.name(), digest = %component_digest, "digested component");
    Ok((name.clone(), component_digest))
}
