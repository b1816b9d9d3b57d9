//! # Canonical Bytes and Digests
//!
//! `fossil canon`, `fossil digest` and `fossil verify-embedded`.
//!
//! ```bash
//! fossil canon plant.json
//! # {"gain":0.8,"lag":2}
//!
//! fossil digest transcript.json --exclude transcript_digest --exclude attestation.signature
//! # sha256:...
//!
//! fossil verify-embedded artifact.json --field digest
//! # OK: sha256:...
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use fossil_core::{canonicalize, digest, verify_embedded_digest, CanonicalValue, Scope};

use crate::load_document;

/// Print the canonical bytes of a document.
#[derive(Args, Debug)]
pub struct CanonArgs {
    /// JSON or YAML document.
    pub file: PathBuf,
}

/// Print the digest of a document.
#[derive(Args, Debug)]
pub struct DigestArgs {
    /// JSON or YAML document.
    pub file: PathBuf,

    /// Dotted field path to drop before digesting. Repeatable. Write a
    /// literal dot in a key as `\.`.
    #[arg(long = "exclude", value_name = "PATH")]
    pub excludes: Vec<String>,
}

/// Check a document that carries its own digest.
#[derive(Args, Debug)]
pub struct VerifyEmbeddedArgs {
    /// JSON or YAML document.
    pub file: PathBuf,

    /// Dotted path of the field holding the digest.
    #[arg(long, default_value = "digest")]
    pub field: String,
}

pub fn run_canon(args: &CanonArgs) -> Result<u8> {
    let value = load_document(&args.file)?;
    println!("{}", canonicalize(&value)?);
    Ok(0)
}

pub fn run_digest(args: &DigestArgs) -> Result<u8> {
    let value = load_document(&args.file)?;
    println!("{}", digest_with_exclusions(value, &args.excludes)?);
    Ok(0)
}

pub fn run_verify_embedded(args: &VerifyEmbeddedArgs) -> Result<u8> {
    let value = load_document(&args.file)?;
    let check = verify_embedded_digest(&value, &args.field)?;
    if check.matches() {
        println!("OK: {}", check.stored);
        Ok(0)
    } else {
        println!("MISMATCH: field `{}`", args.field);
        println!("  stored:     {}", check.stored);
        println!("  recomputed: {}", check.computed);
        Ok(1)
    }
}

/// Digest `value` as a custom scope named after the document.
pub fn digest_with_exclusions(value: CanonicalValue, excludes: &[String]) -> Result<String> {
    let scope = excludes
        .iter()
        .fold(Scope::custom("document", value), |scope, path| {
            scope.with_exclusion(path.as_str())
        });
    Ok(digest(&scope)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fossil_core::FossilError;
    use serde_json::json;

    #[test]
    fn digest_without_exclusions_matches_known_vector() {
        let d = digest_with_exclusions(json!({"b": 1, "a": [2, 3]}).into(), &[]).unwrap();
        assert_eq!(
            d,
            "sha256:2aae3bfa906be39530e7d7a4aa90a7e6d4f29c33e3ac80e1c3b05598c5953c04"
        );
    }

    #[test]
    fn exclusions_are_applied() {
        let with = digest_with_exclusions(
            json!({"a": [2, 3], "b": 1, "meta": {"note": "x"}}).into(),
            &["meta".to_string()],
        )
        .unwrap();
        let without = digest_with_exclusions(json!({"a": [2, 3], "b": 1}).into(), &[]).unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn nested_exclusion() {
        let a = digest_with_exclusions(
            json!({"x": {"keep": 1, "drop": 2}}).into(),
            &["x.drop".to_string()],
        )
        .unwrap();
        let b = digest_with_exclusions(json!({"x": {"keep": 1}}).into(), &[]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn escaped_dot_excludes_top_level_key() {
        let a = digest_with_exclusions(
            json!({"a.b": 1, "a": {"b": 2}}).into(),
            &[r"a\.b".to_string()],
        )
        .unwrap();
        let b = digest_with_exclusions(json!({"a": {"b": 2}}).into(), &[]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn verify_embedded_detects_tampering() {
        let body = json!({"name": "plant", "gain": 0.8});
        let stored = digest_with_exclusions(body.clone().into(), &[]).unwrap();
        let mut doc = body;
        doc["digest"] = json!(stored);
        let value = CanonicalValue::from(doc.clone());
        assert!(verify_embedded_digest(&value, "digest").unwrap().matches());

        doc["gain"] = json!(0.9);
        let value = CanonicalValue::from(doc);
        assert!(!verify_embedded_digest(&value, "digest").unwrap().matches());
    }

    #[test]
    fn verify_embedded_requires_field() {
        let value = CanonicalValue::from(json!({"name": "plant"}));
        assert!(matches!(
            verify_embedded_digest(&value, "digest"),
            Err(FossilError::MissingScope(_))
        ));
    }
}
