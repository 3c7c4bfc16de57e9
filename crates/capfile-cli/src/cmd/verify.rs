//! Verify command

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use capfile_core::OffCardVerifier;

/// Verify `cap` against `target`'s export files plus `exports`.
///
/// The verifier comes from `sdk`. `target` defaults to the same SDK.
pub fn verify(cap: &Path, exports: &[PathBuf], target: Option<&Path>, sdk: Option<&Path>) -> Result<()> {
    let sdk = super::require_sdk(sdk)?;
    let target = match target {
        Some(path) => super::require_sdk(Some(path))?,
        None => super::require_sdk(Some(sdk.root()))?,
    };

    let verifier = OffCardVerifier::with_sdk(&sdk).context("Failed to set up verifier")?;
    verifier
        .verify_against(cap, &target, exports)
        .with_context(|| format!("Could not verify {}", cap.display()))?;

    println!(
        "Verified {} with JavaCard {} against {}",
        cap.display(),
        verifier.release(),
        target.version()
    );
    Ok(())
}
