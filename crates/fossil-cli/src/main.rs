//! # fossil CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber and
//! dispatches to subcommand handlers. Results go to stdout; logs go to
//! stderr so output can be piped.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fossil_cli::canon::{
    run_canon, run_digest, run_verify_embedded, CanonArgs, DigestArgs, VerifyEmbeddedArgs,
};
use fossil_cli::ledger::{run_ledger, LedgerArgs};
use fossil_cli::merkle::{run_merkle, MerkleArgs};
use fossil_cli::seal::{run_seal, SealArgs};
use fossil_cli::validate::{run_index_key, run_validate, IndexKeyArgs, ValidateArgs};

/// Deterministic canonical digests, Merkle transcripts and sealed envelopes.
#[derive(Parser, Debug)]
#[command(name = "fossil", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the assembler configuration file (YAML or JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the canonical bytes of a document.
    Canon(CanonArgs),

    /// Print the content digest of a document.
    Digest(DigestArgs),

    /// Check a document against the digest it carries.
    VerifyEmbedded(VerifyEmbeddedArgs),

    /// Compute a Merkle root or inclusion proof over leaf digests.
    Merkle(MerkleArgs),

    /// Assemble a scope set into a sealed artifact.
    Seal(SealArgs),

    /// Validate every digest of a sealed artifact.
    Validate(ValidateArgs),

    /// Print the storage address of a sealed artifact.
    IndexKey(IndexKeyArgs),

    /// Build or verify a transcript ledger.
    Ledger(LedgerArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "fossil CLI starting");

    let result = match &cli.command {
        Commands::Canon(args) => run_canon(args),
        Commands::Digest(args) => run_digest(args),
        Commands::VerifyEmbedded(args) => run_verify_embedded(args),
        Commands::Merkle(args) => run_merkle(args),
        Commands::Seal(args) => run_seal(args, cli.config.as_deref()),
        Commands::Validate(args) => run_validate(args),
        Commands::IndexKey(args) => run_index_key(args),
        Commands::Ledger(args) => run_ledger(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
