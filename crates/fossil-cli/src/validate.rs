//! # Validate and Index-Key CLI
//!
//! ```bash
//! fossil validate sealed.json          # exit 0 when sealed, 1 otherwise
//! fossil validate sealed.json --json   # machine-readable report
//! fossil index-key sealed.json         # kernel/domain/<input hex>/<transcript hex>
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use fossil_transcript::{validate, SealedArtifact, ValidationReport};

/// Recompute every digest of a sealed artifact.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Sealed artifact JSON.
    pub file: PathBuf,

    /// Print the full report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Print the storage address of a sealed artifact.
#[derive(Args, Debug)]
pub struct IndexKeyArgs {
    /// Sealed artifact JSON.
    pub file: PathBuf,
}

pub fn load_artifact(path: &Path) -> Result<SealedArtifact> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    SealedArtifact::from_json(&text)
        .with_context(|| format!("failed to parse sealed artifact {}", path.display()))
}

pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let artifact = load_artifact(&args.file)?;
    let report = validate(&artifact)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }
    Ok(if report.is_sealed() { 0 } else { 1 })
}

pub fn run_index_key(args: &IndexKeyArgs) -> Result<u8> {
    let artifact = load_artifact(&args.file)?;
    println!("{}", artifact.index_key()?.address());
    Ok(0)
}

/// Human-readable report, one line per finding.
pub fn render_report(report: &ValidationReport) -> String {
    let mut out = String::new();
    if report.is_sealed() {
        out.push_str(&format!("SEALED: {} digests verified\n", report.checked.len()));
        if let Some(key) = &report.index_key {
            out.push_str(&format!("  index: {key}\n"));
        }
        return out;
    }
    out.push_str("NOT SEALED\n");
    for mismatch in &report.mismatches {
        out.push_str(&format!("  mismatch  {mismatch}\n"));
    }
    for scope in &report.unchecked {
        out.push_str(&format!("  unchecked {scope}\n"));
    }
    for problem in &report.inconsistencies {
        out.push_str(&format!("  inconsistent {problem}\n"));
    }
    if !report.missing_index_fields.is_empty() {
        out.push_str(&format!(
            "  index key missing: {}\n",
            report.missing_index_fields.join(", ")
        ));
    }
    out
}
