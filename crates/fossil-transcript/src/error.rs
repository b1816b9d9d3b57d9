//! # Transcript Errors
//!
//! Errors raised while assembling, sealing or validating transcripts.
//! Lower-layer failures arrive through [`TranscriptError::Core`].

use fossil_core::{CanonicalizationError, FossilError};
use thiserror::Error;

/// Error type for the transcript layer.
#[derive(Error, Debug)]
pub enum TranscriptError {
    /// Canonicalization, digesting or Merkle failure.
    #[error(transparent)]
    Core(#[from] FossilError),

    /// An index key was requested from an envelope with unset fields.
    #[error("index key incomplete, missing: {}", missing.join(", "))]
    IncompleteIndexKey {
        /// Names of the empty or unset fields.
        missing: Vec<String>,
    },

    /// Ledger lines are not numbered contiguously from 1.
    #[error("ledger sequence gap: expected seq {expected}, found {found}")]
    SequenceGap {
        /// The sequence number that should have appeared.
        expected: u64,
        /// The sequence number that did appear.
        found: u64,
    },

    /// Invalid assembler configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The attached signer refused or failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML decoding failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<CanonicalizationError> for TranscriptError {
    fn from(err: CanonicalizationError) -> Self {
        Self::Core(FossilError::UnsupportedValue(err))
    }
}
