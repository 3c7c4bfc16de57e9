//! Sign command

use std::path::Path;

use anyhow::{Context, Result};
use capfile_core::{CapFile, load_key_pair, signer};

/// Add DAP blocks for `key` to `cap` and write the result to `output`, or
/// back to `cap`.
pub fn sign(cap_path: &Path, key: &Path, output: Option<&Path>) -> Result<()> {
    let mut cap = CapFile::from_path(cap_path)
        .with_context(|| format!("Could not read CAP file {}", cap_path.display()))?;
    let keys = load_key_pair(key).with_context(|| format!("Could not load key {}", key.display()))?;

    let blocks = signer::add_signature(&mut cap, &keys.private)
        .with_context(|| format!("Could not sign with {}", keys.private.describe()))?;

    let output = output.unwrap_or(cap_path);
    cap.store_to_path(output)
        .with_context(|| format!("Could not write {}", output.display()))?;

    for block in &blocks {
        println!("Added {} ({} bytes)", block.entry_name(), block.signature.len());
    }
    println!("Wrote {}", output.display());
    Ok(())
}
