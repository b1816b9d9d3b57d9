//! # Ledger CLI
//!
//! ```bash
//! # Build a ledger from a JSON/YAML array of snapshots, one JSON line per entry:
//! fossil ledger snapshots.json > run.ledger.jsonl
//!
//! # Check a ledger file (JSON lines) written earlier:
//! fossil ledger run.ledger.jsonl --verify
//!
//! # Also require it to end at a known root, e.g. a transcript's merkle_root:
//! fossil ledger run.ledger.jsonl --verify --root sha256:.. --count 240
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use fossil_core::{CanonicalValue, ContentDigest};
use fossil_transcript::{
    verify_ledger, verify_ledger_against, LedgerAnchor, LedgerLine, LedgerVerification,
    TranscriptLedger,
};

use crate::load_document;

/// Build or verify a transcript ledger.
#[derive(Args, Debug)]
pub struct LedgerArgs {
    /// Snapshot array, or with `--verify` a JSON-lines ledger.
    pub file: PathBuf,

    /// Verify an existing ledger instead of building one.
    #[arg(long)]
    pub verify: bool,

    /// Root the verified ledger must end at.
    #[arg(long, requires = "verify")]
    pub root: Option<ContentDigest>,

    /// Line count the verified ledger must have. Needs `--root`.
    #[arg(long, requires = "root")]
    pub count: Option<usize>,
}

pub fn run_ledger(args: &LedgerArgs) -> Result<u8> {
    if args.verify {
        let lines = read_ledger_lines(&args.file)?;
        let check = match args.root {
            Some(merkle_root) => verify_ledger_against(
                &lines,
                &LedgerAnchor {
                    merkle_root,
                    count: args.count,
                },
            )?,
            None => verify_ledger(&lines)?,
        };
        print!("{}", render_verification(&check));
        return Ok(if check.is_valid() { 0 } else { 1 });
    }

    let snapshots = load_document(&args.file)?;
    for line in build_ledger(&snapshots)?.lines() {
        println!("{}", serde_json::to_string(line)?);
    }
    Ok(0)
}

/// Human-readable verification result.
pub fn render_verification(check: &LedgerVerification) -> String {
    if check.is_valid() {
        let root = check
            .merkle_root
            .map(|r| r.to_string())
            .unwrap_or_else(|| "(empty)".to_string());
        return format!("OK: {} lines, root {root}\n", check.count);
    }
    let mut out = format!("INVALID: {} lines\n", check.count);
    for mismatch in &check.mismatches {
        out.push_str(&format!("  {mismatch}\n"));
    }
    if let Some(expected) = check.expected_count.filter(|_| !check.count_matches()) {
        out.push_str(&format!("  expected {expected} lines\n"));
    }
    out
}

/// Append every element of a snapshot array to a fresh ledger.
pub fn build_ledger(snapshots: &CanonicalValue) -> Result<TranscriptLedger> {
    let items = snapshots
        .as_sequence()
        .with_context(|| format!("expected an array of snapshots, got {}", snapshots.kind()))?;
    let mut ledger = TranscriptLedger::new();
    for item in items {
        ledger.append(item)?;
    }
    Ok(ledger)
}

/// Parse a JSON-lines ledger, skipping blank lines.
pub fn read_ledger_lines(path: &Path) -> Result<Vec<LedgerLine>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid ledger line", path.display(), n + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_from_array() {
        let snapshots = CanonicalValue::from(json!([{"tick": 0}, {"tick": 1}, {"tick": 2}]));
        let ledger = build_ledger(&snapshots).unwrap();
        assert_eq!(ledger.len(), 3);
        assert_eq!(
            ledger.root().unwrap().to_hex(),
            "2565995364eb09865a11adb66b31b2b00eea5b8ac74cf40b2ccb939f44d4bbca"
        );
    }

    #[test]
    fn non_array_rejected() {
        let err = build_ledger(&CanonicalValue::from(json!({"tick": 0}))).unwrap_err();
        assert!(err.to_string().contains("got mapping"));
    }

    #[test]
    fn jsonl_round_trip() {
        let snapshots = CanonicalValue::from(json!([{"tick": 0}, {"tick": 1}]));
        let ledger = build_ledger(&snapshots).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.ledger.jsonl");
        let mut text = String::new();
        for line in ledger.lines() {
            text.push_str(&serde_json::to_string(line).unwrap());
            text.push('\n');
        }
        text.push('\n');
        std::fs::write(&path, text).unwrap();
        let lines = read_ledger_lines(&path).unwrap();
        assert_eq!(lines, ledger.lines());
        assert!(verify_ledger(&lines).unwrap().is_valid());
    }

    #[test]
    fn render_truncated_ledger_against_anchor() {
        let snapshots = CanonicalValue::from(json!([{"tick": 0}, {"tick": 1}, {"tick": 2}]));
        let ledger = build_ledger(&snapshots).unwrap();
        let anchor = LedgerAnchor {
            merkle_root: ledger.root().unwrap(),
            count: Some(3),
        };
        let check = verify_ledger_against(&ledger.lines()[..2], &anchor).unwrap();
        let text = render_verification(&check);
        assert!(text.starts_with("INVALID: 2 lines\n"), "{text}");
        assert!(text.contains("ledger.anchor: stored sha256:2565995364eb"), "{text}");
        assert!(text.contains("expected 3 lines"), "{text}");
    }

    #[test]
    fn bad_line_reports_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        std::fs::write(&path, "{\"seq\": 1}\n").unwrap();
        let err = read_ledger_lines(&path).unwrap_err();
        assert!(format!("{err:#}").contains("bad.jsonl:1"));
    }
}
