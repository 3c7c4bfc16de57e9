//! Running the SDK's verifier.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use tracing::debug;

use super::bootstrap::{self, BOOTSTRAP_CLASS, EXIT_LINKAGE, EXIT_REJECTED};
use super::strategy::VerifierCall;
use crate::config::VerifierConfig;
use crate::{Error, Result};

/// Runs one verifier call.
///
/// Implementations report a rejected package as
/// [`Error::VerificationFailed`] and a toolchain that could not be started or
/// linked as [`Error::Toolchain`].
pub trait Launcher {
    /// Run the verifier from `classpath` for `call`.
    ///
    /// # Errors
    ///
    /// See the trait documentation.
    fn launch(&self, classpath: &[PathBuf], call: &VerifierCall) -> Result<()>;
}

impl<L: Launcher + ?Sized> Launcher for &L {
    fn launch(&self, classpath: &[PathBuf], call: &VerifierCall) -> Result<()> {
        (**self).launch(classpath, call)
    }
}

/// Launches the verifier in a `java` subprocess.
///
/// A small bootstrap class is written into the call's workspace. It invokes
/// the `verifyCap` overload of [`VerifierCall::entry`] and tells a rejected
/// package apart from a verifier that cannot be linked.
#[derive(Debug, Clone, Default)]
pub struct JavaLauncher {
    java_home: Option<PathBuf>,
}

impl JavaLauncher {
    /// Use `java` from `java_home`, or from `PATH` if `None`.
    pub fn new(java_home: Option<PathBuf>) -> Self {
        Self { java_home }
    }

    /// Use `JAVA_HOME` when set.
    pub fn from_config(config: &VerifierConfig) -> Self {
        Self::new(config.java_home.clone())
    }

    /// Path of the `java` executable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Toolchain`] if no `java` can be found.
    pub fn java(&self) -> Result<PathBuf> {
        match &self.java_home {
            Some(home) => {
                let java = home
                    .join("bin")
                    .join(format!("java{}", std::env::consts::EXE_SUFFIX));
                if java.is_file() {
                    Ok(java)
                } else {
                    Err(Error::Toolchain(format!("No java at {}", java.display())))
                }
            }
            None => which::which("java")
                .map_err(|e| Error::Toolchain(format!("java not found in PATH: {e}"))),
        }
    }
}

impl Launcher for JavaLauncher {
    fn launch(&self, classpath: &[PathBuf], call: &VerifierCall) -> Result<()> {
        if let Some(missing) = classpath.iter().find(|jar| !jar.is_file()) {
            return Err(Error::Toolchain(format!(
                "Verifier library {} is missing",
                missing.display()
            )));
        }
        let java = self.java()?;

        fs::write(
            call.workspace.join(format!("{BOOTSTRAP_CLASS}.class")),
            bootstrap::class_bytes(),
        )?;
        let classpath = std::env::join_paths(
            std::iter::once(call.workspace.as_path()).chain(classpath.iter().map(PathBuf::as_path)),
        )
        .map_err(|e| Error::Toolchain(format!("Invalid classpath: {e}")))?;

        debug!(
            java = %java.display(),
            entry = ?call.entry,
            package = %call.package_name,
            exports = call.export_files.len(),
            "Running off-card verifier"
        );
        let output = Command::new(&java)
            .arg("-cp")
            .arg(&classpath)
            .arg(BOOTSTRAP_CLASS)
            .args(call.arguments())
            .output()
            .map_err(|e| Error::Toolchain(format!("Could not start {}: {e}", java.display())))?;

        outcome(output.status, &diagnostic(&output.stdout, &output.stderr), &java)
    }
}

/// Verifier output worth reporting: stderr, or stdout when stderr is empty.
fn diagnostic(stdout: &[u8], stderr: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    if stderr.trim().is_empty() {
        String::from_utf8_lossy(stdout).trim().to_string()
    } else {
        stderr.trim().to_string()
    }
}

/// Map the bootstrap's exit status to a result.
///
/// Only [`EXIT_REJECTED`] means the verifier ran and refused the package.
/// Any other failure, including the JVM not finding the bootstrap, is a
/// toolchain problem.
fn outcome(status: ExitStatus, message: &str, java: &Path) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    let message = if message.is_empty() {
        format!("verifier exited with {status}")
    } else {
        message.to_string()
    };
    match status.code() {
        Some(EXIT_REJECTED) => Err(Error::VerificationFailed(message)),
        Some(EXIT_LINKAGE) => Err(Error::Toolchain(format!(
            "Verifier does not match the SDK release: {message}"
        ))),
        _ => Err(Error::Toolchain(format!(
            "{} failed to run the verifier: {message}",
            java.display()
        ))),
    }
}
