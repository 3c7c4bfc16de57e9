//! Subcommand implementations.

pub mod info;
pub mod sdk;
pub mod sign;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result, bail};
use capfile_core::{JavaCardSdk, PlatformRegistry};
use tracing::debug;

/// Detect the SDK at `path`, which comes from `--sdk` or `JC_HOME`.
pub fn require_sdk(path: Option<&Path>) -> Result<JavaCardSdk> {
    let Some(path) = path else {
        bail!("You need to point $JC_HOME (or --sdk) to a JavaCard SDK to verify CAP files");
    };
    let sdk = JavaCardSdk::detect(path)
        .with_context(|| format!("Failed to probe JavaCard SDK at {}", path.display()))?
        .with_context(|| format!("Could not detect a valid JavaCard SDK in {}", path.display()))?;
    debug!(root = %sdk.root().display(), version = %sdk.version(), "Using JavaCard SDK");
    Ok(sdk)
}

/// Built-in platform packages, extended from `aid_list` if given.
pub fn registry(aid_list: Option<&Path>) -> Result<PlatformRegistry> {
    let builtin = PlatformRegistry::builtin();
    match aid_list {
        Some(path) => {
            let extra = PlatformRegistry::load(path)
                .with_context(|| format!("Failed to load AID list {}", path.display()))?;
            debug!(path = %path.display(), extra = extra.len(), "Loaded AID list");
            Ok(builtin.merge(extra))
        }
        None => Ok(builtin),
    }
}
