//! Environment-driven settings for the verifier.

use std::path::PathBuf;

/// Environment variable naming the parent directory of verifier workspaces.
pub const TMPDIR_ENV: &str = "CAPFILE_TMPDIR";

/// Configuration for [`crate::OffCardVerifier`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Existing parent directory for scoped workspaces. `None` means the
    /// system temp directory.
    pub temp_root: Option<PathBuf>,
    /// Java installation to launch the verifier with. `None` means `java`
    /// from `PATH`.
    pub java_home: Option<PathBuf>,
}

impl VerifierConfig {
    /// Load configuration from `CAPFILE_TMPDIR` and `JAVA_HOME`.
    ///
    /// Unset or empty variables are left as `None`.
    pub fn from_env() -> Self {
        Self {
            temp_root: non_empty_var(TMPDIR_ENV),
            java_home: non_empty_var("JAVA_HOME"),
        }
    }

    /// Workspace parent directory, falling back to the system temp dir.
    pub fn temp_root(&self) -> PathBuf {
        self.temp_root.clone().unwrap_or_else(std::env::temp_dir)
    }
}

fn non_empty_var(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
