//! # Assembler Configuration
//!
//! Loaded from YAML or JSON. Unknown keys are rejected so a typo cannot
//! silently drop a setting.
//!
//! ```yaml
//! kernel: thermal-controller
//! domain: hvac
//! parallel: true
//! signer: ops@example
//! metadata:
//!   run: nightly
//! ```

use std::collections::BTreeMap;

use fossil_core::{check_integer_literals, CanonicalValue};
use serde::{Deserialize, Serialize};

use crate::error::TranscriptError;

/// Settings for one [`TranscriptAssembler`](crate::TranscriptAssembler).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssemblerConfig {
    /// Kernel identifier recorded in the envelope and index key.
    #[serde(default)]
    pub kernel: String,
    /// Domain identifier recorded in the envelope and index key.
    #[serde(default)]
    pub domain: String,
    /// Digest components and snapshots on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
    /// Signer identity written to `attestation.signer`.
    #[serde(default)]
    pub signer: Option<String>,
    /// Free-form metadata copied into the transcript.
    #[serde(default)]
    pub metadata: BTreeMap<String, CanonicalValue>,
}

impl AssemblerConfig {
    pub fn new(kernel: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            kernel: kernel.into(),
            domain: domain.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, TranscriptError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, TranscriptError> {
        check_integer_literals(text)?;
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject empty identifiers and an empty signer name.
    pub fn validate(&self) -> Result<(), TranscriptError> {
        if self.kernel.trim().is_empty() {
            return Err(TranscriptError::Config("kernel must not be empty".into()));
        }
        if self.domain.trim().is_empty() {
            return Err(TranscriptError::Config("domain must not be empty".into()));
        }
        if self.kernel.contains('/') || self.domain.contains('/') {
            return Err(TranscriptError::Config(
                "kernel and domain must not contain `/`".into(),
            ));
        }
        if self.signer.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(TranscriptError::Config("signer must not be empty".into()));
        }
        Ok(())
    }
}
