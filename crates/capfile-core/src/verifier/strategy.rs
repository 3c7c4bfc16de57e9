//! Verifier entry points per SDK release.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::sdk::{JavaCardVersion, Release, Update};
use crate::{Error, Result};

/// How a release's verifier takes the CAP file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifierEntry {
    /// `verifyCap(File, String, Vector)`: the CAP is passed by path.
    CapPath,
    /// `verifyCap(FileInputStream, String, Vector)`: the CAP is passed as an
    /// open stream.
    CapStream,
}

impl VerifierEntry {
    /// Entry point for `release`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Toolchain`] for releases without a verifier.
    pub fn for_release(release: Release) -> Result<Self> {
        match (release.version, release.update) {
            (JavaCardVersion::None | JavaCardVersion::V211, _) => Err(Error::Toolchain(format!(
                "JavaCard SDK {release} has no off-card verifier, use 2.2.1 or later"
            ))),
            (JavaCardVersion::V305, Some(Update::U2 | Update::U3)) => Ok(Self::CapPath),
            _ => Ok(Self::CapStream),
        }
    }

    /// JVM descriptor of the `verifyCap` overload.
    pub fn descriptor(self) -> &'static str {
        match self {
            Self::CapPath => "(Ljava/io/File;Ljava/lang/String;Ljava/util/Vector;)V",
            Self::CapStream => "(Ljava/io/FileInputStream;Ljava/lang/String;Ljava/util/Vector;)V",
        }
    }

    /// Class the CAP file is opened as before the call.
    pub(crate) fn cap_class(self) -> &'static str {
        match self {
            Self::CapPath => "java/io/File",
            Self::CapStream => "java/io/FileInputStream",
        }
    }

    /// First bootstrap argument selecting this overload.
    pub(crate) fn mode(self) -> &'static str {
        match self {
            Self::CapPath => "path",
            Self::CapStream => "stream",
        }
    }
}

/// Everything the launcher needs for one verifier run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierCall {
    /// Entry point to use.
    pub entry: VerifierEntry,
    /// Dotted name of the package being verified.
    pub package_name: String,
    /// Export files to verify against.
    pub export_files: Vec<PathBuf>,
    /// CAP file on disk.
    pub cap: PathBuf,
    /// Scratch directory owned by this call.
    pub workspace: PathBuf,
}

impl VerifierCall {
    /// Arguments for the bootstrap class: mode, package, CAP, export files.
    pub fn arguments(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            self.entry.mode().into(),
            self.package_name.clone().into(),
            self.cap.as_os_str().to_owned(),
        ];
        args.extend(self.export_files.iter().map(|p| p.as_os_str().to_owned()));
        args
    }
}
