//! # Error Types
//!
//! The error taxonomy shared by every Fossil crate. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! Canonicalization and digesting fail fast and never produce partial
//! output. Digest mismatches found during validation are *not* errors;
//! the validator reports them as data.

use thiserror::Error;

/// Top-level error type for canonicalization, digesting and Merkle work.
#[derive(Error, Debug)]
pub enum FossilError {
    /// The value cannot be represented canonically (e.g. NaN).
    #[error("unsupported value: {0}")]
    UnsupportedValue(#[from] CanonicalizationError),

    /// A referenced scope has no value to digest.
    #[error("missing scope: {0}")]
    MissingScope(String),

    /// A Merkle root was requested over zero leaves.
    #[error("empty leaf set: a Merkle root needs at least one leaf")]
    EmptyLeafSet,

    /// A self-referential field was populated before its own digest step.
    #[error("circular digest dependency: scope `{scope}` already holds a value in `{field}`")]
    CircularDigestDependency {
        /// Name of the scope being digested.
        scope: String,
        /// The self-referential field that was found populated.
        field: String,
    },

    /// A stored digest string is not `sha256:` followed by 64 lowercase hex chars.
    #[error("malformed digest `{value}`: {reason}")]
    MalformedDigest {
        /// The offending text.
        value: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// An inclusion proof was requested for a leaf that does not exist.
    #[error("leaf index {index} out of range for {size} leaves")]
    LeafIndexOutOfRange {
        /// Requested leaf index.
        index: usize,
        /// Number of leaves in the tree.
        size: usize,
    },
}

/// Error during conversion to, or serialization of, a canonical value.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// NaN and the infinities have no JSON representation.
    #[error("non-finite number {0} has no canonical representation")]
    NonFiniteNumber(f64),

    /// An integer literal outside `i64`/`u64` that a float cannot hold exactly.
    #[error("integer literal {0} cannot be represented exactly")]
    IntegerOutOfRange(String),

    /// Mapping keys must be strings.
    #[error("mapping keys must be strings, got {0}")]
    NonStringKey(&'static str),

    /// Number rendering failed.
    #[error("number rendering failed: {0}")]
    NumberRendering(#[from] serde_json::Error),

    /// A `Serialize` implementation reported its own error.
    #[error("{0}")]
    Custom(String),
}

impl serde::ser::Error for CanonicalizationError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}
