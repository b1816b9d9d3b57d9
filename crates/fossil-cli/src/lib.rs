//! # fossil-cli — The `fossil` Command
//!
//! Thin process edge over the Fossil library crates. Every subcommand is a
//! `run_*` function returning the process exit code, with the actual work in
//! small helpers that tests call directly.
//!
//! ## Subcommands
//!
//! ```bash
//! fossil canon plant.json
//! fossil digest transcript.json --exclude transcript_digest
//! fossil verify-embedded artifact.json --field digest
//! fossil merkle sha256:aa.. sha256:bb.. --proof 1
//! fossil --config assembler.yaml seal run.yaml --out sealed.json
//! fossil validate sealed.json
//! fossil index-key sealed.json
//! fossil ledger snapshots.json
//! ```
//!
//! Input documents are JSON unless the file extension is `.yaml` or `.yml`.

pub mod canon;
pub mod ledger;
pub mod merkle;
pub mod seal;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use fossil_core::{check_integer_literals, CanonicalValue};
use serde::de::DeserializeOwned;

/// True when `path` names a YAML file.
pub fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

/// Read and parse a JSON or YAML document into `T`.
pub fn load_typed<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if is_yaml(path) {
        serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse YAML {}", path.display()))
    } else {
        check_integer_literals(&text)
            .with_context(|| format!("failed to parse JSON {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse JSON {}", path.display()))
    }
}

/// Read a JSON or YAML document as a canonical value.
pub fn load_document(path: &Path) -> Result<CanonicalValue> {
    load_typed(path)
}

/// Write `text` to `out`, or to stdout when `out` is `None`.
pub fn emit(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(path) => {
            let mut body = text.to_string();
            if !body.ends_with('\n') {
                body.push('\n');
            }
            std::fs::write(path, body)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => println!("{text}"),
    }
    Ok(())
}
