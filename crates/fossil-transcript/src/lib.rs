//! # fossil-transcript — Transcripts, Envelopes and Validation
//!
//! Builds on `fossil-core` digests and `fossil-crypto` Merkle roots to
//! produce sealed, self-describing artifacts and to check them later.
//!
//! ## Pipeline
//!
//! ```text
//! ScopeSet ──► TranscriptAssembler ──► SealedArtifact ──► validate() ──► ValidationReport
//!                                            │
//!                                            └──► IndexKey (kernel/domain/input/transcript)
//! ```
//!
//! - [`assembler`]: digests every scope, computes the snapshot Merkle root,
//!   seals the transcript and then the envelope.
//! - [`validator`]: recomputes every stored digest and reports mismatches
//!   as data.
//! - [`ledger`]: append-only snapshot log with a running Merkle root,
//!   verifiable on its own or against an anchored root.
//!
//! ## Logging
//!
//! Assembly, validation and ledger verification emit `tracing` spans and
//! events. Nothing is logged below this crate.

pub mod assembler;
pub mod config;
pub mod envelope;
pub mod error;
pub mod ledger;
pub mod validator;

pub use assembler::{TranscriptAssembler, TranscriptSigner};
pub use config::AssemblerConfig;
pub use envelope::{
    Attestation, Envelope, EnvelopeStage, IndexKey, ScopeSet, SealedArtifact, Transcript,
    ENVELOPE_SCHEMA_VERSION, TRANSCRIPT_SCHEMA_VERSION,
};
pub use error::TranscriptError;
pub use ledger::{
    verify_ledger, verify_ledger_against, LedgerAnchor, LedgerLine, LedgerVerification,
    TranscriptLedger, LEDGER_LINE_SCHEMA_VERSION,
};
pub use validator::{validate, Mismatch, ValidationReport};
