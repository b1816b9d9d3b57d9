//! # Seal CLI
//!
//! Assembles a scope set into a sealed artifact.
//!
//! ```bash
//! fossil seal run.yaml --kernel thermal-controller --domain hvac --out sealed.json
//! fossil --config assembler.yaml seal run.json --parallel
//! ```
//!
//! Flags override values from `--config`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use fossil_transcript::{AssemblerConfig, ScopeSet, SealedArtifact, TranscriptAssembler};

use crate::{emit, load_typed};

/// Assemble and seal a scope set.
#[derive(Args, Debug)]
pub struct SealArgs {
    /// Scope set document: components, initial_state, controls, snapshots.
    pub file: PathBuf,

    /// Kernel identifier.
    #[arg(long)]
    pub kernel: Option<String>,

    /// Domain identifier.
    #[arg(long)]
    pub domain: Option<String>,

    /// Digest components and snapshots in parallel.
    #[arg(long)]
    pub parallel: bool,

    /// Signer identity recorded in the transcript attestation.
    #[arg(long)]
    pub signer: Option<String>,

    /// Write the sealed artifact here instead of stdout.
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

pub fn run_seal(args: &SealArgs, config_path: Option<&Path>) -> Result<u8> {
    let config = resolve_config(args, config_path)?;
    let scopes: ScopeSet = load_typed(&args.file)?;
    let artifact = seal_scopes(config, scopes)?;
    emit(args.out.as_deref(), &artifact.to_json_pretty()?)?;
    if args.out.is_some() {
        if let Some(digest) = &artifact.envelope.artifact_digest {
            println!("sealed: {digest}");
        }
    }
    Ok(0)
}

/// Load `--config` if given, then apply flag overrides.
pub fn resolve_config(args: &SealArgs, config_path: Option<&Path>) -> Result<AssemblerConfig> {
    let mut config = match config_path {
        Some(path) => load_typed::<AssemblerConfig>(path)
            .with_context(|| format!("invalid assembler config {}", path.display()))?,
        None => AssemblerConfig::default(),
    };
    if let Some(kernel) = &args.kernel {
        config.kernel = kernel.clone();
    }
    if let Some(domain) = &args.domain {
        config.domain = domain.clone();
    }
    if args.parallel {
        config.parallel = true;
    }
    if let Some(signer) = &args.signer {
        config.signer = Some(signer.clone());
    }
    tracing::debug!(?config, "resolved assembler config");
    Ok(config)
}

pub fn seal_scopes(config: AssemblerConfig, scopes: ScopeSet) -> Result<SealedArtifact> {
    let assembler = TranscriptAssembler::new(config)?;
    assembler.assemble(scopes).context("assembly failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(file: &Path) -> SealArgs {
        SealArgs {
            file: file.to_path_buf(),
            kernel: None,
            domain: None,
            parallel: false,
            signer: None,
            out: None,
        }
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("assembler.yaml");
        std::fs::write(&config_path, "kernel: from-file\ndomain: hvac\n").unwrap();
        let mut a = args(Path::new("unused.json"));
        a.kernel = Some("from-flag".into());
        a.parallel = true;
        let config = resolve_config(&a, Some(&config_path)).unwrap();
        assert_eq!(config.kernel, "from-flag");
        assert_eq!(config.domain, "hvac");
        assert!(config.parallel);
    }

    #[test]
    fn missing_identifiers_fail_validation() {
        let config = resolve_config(&args(Path::new("unused.json")), None).unwrap();
        let err = seal_scopes(config, ScopeSet::default()).unwrap_err();
        assert!(format!("{err:#}").contains("kernel must not be empty"));
    }

    #[test]
    fn unknown_config_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("assembler.yaml");
        std::fs::write(&config_path, "kernel: k\ndomain: d\nthreads: 4\n").unwrap();
        assert!(resolve_config(&args(Path::new("unused.json")), Some(&config_path)).is_err());
    }
}
