//! # Merkle CLI
//!
//! ```bash
//! fossil merkle sha256:aff6.. sha256:b66a.. sha256:79a2..
//! # sha256:2565...
//!
//! fossil merkle sha256:aff6.. sha256:b66a.. --proof 1
//! # {"leaf_index":1,"leaf_count":2,"leaf":"sha256:b66a..","path":[...]}
//! ```

use anyhow::{Context, Result};
use clap::Args;
use fossil_core::ContentDigest;
use fossil_crypto::{merkle_root, verify_inclusion, MerkleTree};

/// Compute a Merkle root over leaf digests, in the order given.
#[derive(Args, Debug)]
pub struct MerkleArgs {
    /// Leaf digests (`sha256:<hex>`), in temporal order.
    #[arg(required = true, num_args = 1..)]
    pub leaves: Vec<String>,

    /// Print the inclusion proof for the leaf at this index instead.
    #[arg(long, value_name = "INDEX")]
    pub proof: Option<usize>,
}

pub fn run_merkle(args: &MerkleArgs) -> Result<u8> {
    let leaves = parse_leaves(&args.leaves)?;
    match args.proof {
        Some(index) => println!("{}", proof_json(&leaves, index)?),
        None => println!("{}", merkle_root(&leaves)?),
    }
    Ok(0)
}

pub fn parse_leaves(leaves: &[String]) -> Result<Vec<ContentDigest>> {
    leaves
        .iter()
        .enumerate()
        .map(|(i, text)| {
            ContentDigest::parse(text).with_context(|| format!("leaf {i} is not a valid digest"))
        })
        .collect()
}

/// Build the tree and render the proof for `index` as pretty JSON.
pub fn proof_json(leaves: &[ContentDigest], index: usize) -> Result<String> {
    let tree = MerkleTree::build(leaves)?;
    let proof = tree.proof(index)?;
    // Self-check before printing.
    anyhow::ensure!(
        verify_inclusion(&proof, &tree.root()),
        "generated proof does not verify"
    );
    let mut value = serde_json::to_value(&proof)?;
    value["root"] = serde_json::Value::String(tree.root().to_string());
    Ok(serde_json::to_string_pretty(&value)?)
}
