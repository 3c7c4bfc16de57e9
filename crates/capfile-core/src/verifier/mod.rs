//! Off-card verification of CAP files.
//!
//! The verification itself is done by the SDK's own verifier. This module
//! picks the `verifyCap` overload for the SDK release, gathers export files
//! into a scoped [`Workspace`] and hands the call to a [`Launcher`].
//!
//! ```no_run
//! use capfile_core::{JavaCardSdk, OffCardVerifier, PlatformRegistry};
//!
//! let sdk = JavaCardSdk::detect("/opt/java_card_kit-3_0_5u3")?.expect("no SDK");
//! let verifier = OffCardVerifier::with_sdk(&sdk)?;
//! verifier.verify_plain("applet.cap".as_ref(), &PlatformRegistry::builtin())?;
//! # Ok::<(), capfile_core::Error>(())
//! ```

mod bootstrap;
mod exports;
mod launcher;
mod strategy;

pub use exports::{ExportFileSet, Workspace, extract_exports};
pub use launcher::{JavaLauncher, Launcher};
pub use strategy::{VerifierCall, VerifierEntry};

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::cap::CapFile;
use crate::config::VerifierConfig;
use crate::registry::PlatformRegistry;
use crate::sdk::{ArtifactKind, JavaCardSdk, Release, Update};
use crate::{Error, Result};

/// Verifies CAP files with one SDK's off-card verifier.
#[derive(Debug)]
pub struct OffCardVerifier<'a, L = JavaLauncher> {
    sdk: &'a JavaCardSdk,
    release: Release,
    entry: VerifierEntry,
    launcher: L,
    temp_root: PathBuf,
}

impl<'a> OffCardVerifier<'a, JavaLauncher> {
    /// Verifier for `sdk`, configured from the environment.
    ///
    /// Logs a warning for releases older than 3.0.5u3, whose verifiers are
    /// known to miss problems.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Toolchain`] if the SDK has no verifier (2.1.1) or its
    /// release cannot be determined.
    pub fn with_sdk(sdk: &'a JavaCardSdk) -> Result<Self> {
        let config = VerifierConfig::from_env();
        if !sdk.version().has_verifier() {
            return Err(Error::Toolchain(format!(
                "Verification is supported with JavaCard SDK 2.2.1 or later, not {}",
                sdk.version()
            )));
        }
        let release = sdk.release()?;
        let entry = VerifierEntry::for_release(release)?;
        if release < Release::v305(Update::U3) {
            warn!(%release, "Please use JavaCard SDK 3.0.5u3 or later for verifying");
        }
        debug!(%release, ?entry, "Selected verifier entry point");

        Ok(Self {
            sdk,
            release,
            entry,
            launcher: JavaLauncher::from_config(&config),
            temp_root: config.temp_root(),
        })
    }
}

impl<'a, L: Launcher> OffCardVerifier<'a, L> {
    /// Replace the launcher.
    pub fn launcher<M: Launcher>(self, launcher: M) -> OffCardVerifier<'a, M> {
        OffCardVerifier {
            sdk: self.sdk,
            release: self.release,
            entry: self.entry,
            launcher,
            temp_root: self.temp_root,
        }
    }

    /// Create workspaces under the existing directory `path` instead of the
    /// default temp root.
    #[must_use]
    pub fn temp_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_root = path.into();
        self
    }

    /// SDK release the verifier belongs to.
    pub fn release(&self) -> Release {
        self.release
    }

    /// Entry point used for this release.
    pub fn entry(&self) -> VerifierEntry {
        self.entry
    }

    /// Verify `cap` against `target`'s API plus the export files in `exports`.
    ///
    /// # Errors
    ///
    /// See [`OffCardVerifier::verify`].
    pub fn verify_against(&self, cap: &Path, target: &JavaCardSdk, exports: &[PathBuf]) -> Result<()> {
        let mut sources = exports.to_vec();
        sources.push(target.export_dir());
        self.verify(cap, &sources)
    }

    /// Verify `cap` against the export files found in `exports`.
    ///
    /// Archives among `exports` are extracted into a workspace that is
    /// removed before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VerificationFailed`] if the verifier rejects the
    /// package, [`Error::Toolchain`] if it cannot be run, [`Error::Cap`] if
    /// the package has no name, and I/O or archive errors from collecting
    /// export files.
    pub fn verify(&self, cap: &Path, exports: &[PathBuf]) -> Result<()> {
        let workspace = Workspace::create(&self.temp_root)?;
        let export_files = ExportFileSet::collect(exports, &workspace)?;

        let package = CapFile::from_path(cap)?;
        let package_name = package
            .package_name()
            .ok_or_else(|| Error::Cap(format!("{} has no package name", cap.display())))?
            .to_string();

        let call = VerifierCall {
            entry: self.entry,
            package_name,
            export_files: export_files.into_iter().collect(),
            cap: cap.to_path_buf(),
            workspace: workspace.path().to_path_buf(),
        };
        let classpath = self.sdk.artifacts(ArtifactKind::Verifier);
        self.launcher.launch(&classpath, &call)?;

        info!(
            package = %call.package_name,
            release = %self.release,
            exports = call.export_files.len(),
            "Verified"
        );
        Ok(())
    }

    /// Verify a package that only imports platform packages, against this
    /// verifier's own SDK.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedImport`] for the first import not in
    /// `registry`, before anything is extracted or launched. Otherwise see
    /// [`OffCardVerifier::verify`].
    pub fn verify_plain(&self, cap: &Path, registry: &PlatformRegistry) -> Result<()> {
        let package = CapFile::from_path(cap)?;
        if let Some(import) = package
            .imports()
            .iter()
            .find(|import| !registry.contains(&import.aid))
        {
            return Err(Error::UnsupportedImport(import.aid.clone()));
        }
        self.verify_against(cap, self.sdk, &[])
    }
}
