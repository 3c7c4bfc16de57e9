//! JavaCard SDK detection.
//!
//! An SDK is identified from the files it ships, never from a version string:
//! the SDKs do not carry one. Detection order matters. 3.x layouts are probed
//! first because they can also contain files that match the older checks.
//!
//! | Marker (under `lib/` unless noted) | Release |
//! |---|---|
//! | `tools.jar` + `api_classic-3.1.0.jar` | 3.1.0 |
//! | `tools.jar`, `api_classic.jar` has `javacard/framework/SensitiveArrays.class` | 3.0.5 |
//! | `tools.jar`, `api_classic.jar` has `javacardx/framework/string/StringUtil.class` | 3.0.4 |
//! | `tools.jar` | 3.0.1 |
//! | `api21.jar` | 2.1.2 |
//! | `bin/api.jar` | 2.1.1 |
//! | `converter.jar`, `api.jar` has `javacardx/apdu/ExtendedLength.class` | 2.2.2 |
//! | `converter.jar` | 2.2.1 |

pub(crate) mod classfile;
mod version;

pub use version::{ArtifactKind, JavaCardVersion, Release, Update};

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::debug;
use zip::ZipArchive;

use crate::{Error, Result};

/// Class implementing the off-card verifier in every SDK.
pub const VERIFIER_CLASS: &str = "com.sun.javacard.offcardverifier.Verifier";

const VERIFIER_CLASS_ENTRY: &str = "com/sun/javacard/offcardverifier/Verifier.class";

/// A JavaCard SDK installed on disk.
///
/// Immutable once detected. The 3.0.5 update level is probed lazily and
/// cached, so a `JavaCardSdk` can be shared between threads.
#[derive(Debug)]
pub struct JavaCardSdk {
    root: PathBuf,
    version: JavaCardVersion,
    release: OnceLock<Release>,
}

impl JavaCardSdk {
    /// Probe `root` for a JavaCard SDK.
    ///
    /// Returns `Ok(None)` if `root` is empty, not a directory, or does not
    /// look like any known SDK.
    ///
    /// # Errors
    ///
    /// Returns an error if a marker archive exists but cannot be read.
    pub fn detect(root: impl AsRef<Path>) -> Result<Option<Self>> {
        let root = root.as_ref();
        if root.as_os_str().is_empty() || !root.is_dir() {
            return Ok(None);
        }

        let version = detect_version(root)?;
        debug!(root = %root.display(), %version, "Probed JavaCard SDK");
        if version == JavaCardVersion::None {
            return Ok(None);
        }

        Ok(Some(Self {
            root: root.to_path_buf(),
            version,
            release: OnceLock::new(),
        }))
    }

    /// SDK root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Release family.
    pub fn version(&self) -> JavaCardVersion {
        self.version
    }

    /// Highest Java class file level the converter accepts.
    pub fn java_version(&self) -> &'static str {
        self.version.java_version()
    }

    /// Fine-grained release.
    ///
    /// For 3.0.5 the update level is read off the verifier class in
    /// `lib/tools.jar`: 3.0.5u3 added `verifyTargetPlatform(String)`, and
    /// only 3.0.5u1 still has `verifyCap(FileInputStream, String, Vector)`.
    /// Anything else is 3.0.5u2.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Toolchain`] if the verifier class cannot be found or
    /// parsed.
    pub fn release(&self) -> Result<Release> {
        if let Some(release) = self.release.get() {
            return Ok(*release);
        }
        let release = match self.version {
            JavaCardVersion::V305 => Release::v305(self.probe_update()?),
            version => Release::plain(version),
        };
        Ok(*self.release.get_or_init(|| release))
    }

    fn probe_update(&self) -> Result<Update> {
        let tools = self.jar("tools.jar");
        let class = read_entry(&tools, VERIFIER_CLASS_ENTRY)
            .map_err(|e| Error::Toolchain(format!("Could not load {VERIFIER_CLASS}: {e}")))?
            .ok_or_else(|| {
                Error::Toolchain(format!(
                    "{VERIFIER_CLASS} not found in {}",
                    tools.display()
                ))
            })?;
        let methods = classfile::declared_methods(&class)?;

        let update = if methods
            .iter()
            .any(|m| m.matches("verifyTargetPlatform", "(Ljava/lang/String;)"))
        {
            Update::U3
        } else if methods.iter().any(|m| {
            m.matches(
                "verifyCap",
                "(Ljava/io/FileInputStream;Ljava/lang/String;Ljava/util/Vector;)",
            )
        }) {
            Update::U1
        } else {
            Update::U2
        };
        debug!(?update, "Probed 3.0.5 verifier");
        Ok(update)
    }

    /// Path of `name` in the SDK's `lib/` directory.
    pub fn jar(&self, name: &str) -> PathBuf {
        self.root.join("lib").join(name)
    }

    /// Artifact paths of `kind` for this SDK.
    pub fn artifacts(&self, kind: ArtifactKind) -> Vec<PathBuf> {
        self.version
            .artifacts(kind)
            .iter()
            .map(|rel| self.root.join(rel))
            .collect()
    }

    /// API jars to compile against.
    pub fn api_jars(&self) -> Vec<PathBuf> {
        self.artifacts(ArtifactKind::Api)
    }

    /// Converter/verifier jars.
    pub fn tool_jars(&self) -> Vec<PathBuf> {
        self.artifacts(ArtifactKind::Tools)
    }

    /// Directory holding the SDK's own export files.
    pub fn export_dir(&self) -> PathBuf {
        self.root.join(self.version.export_dir())
    }
}

impl PartialEq for JavaCardSdk {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.version == other.version
    }
}

impl Eq for JavaCardSdk {}

fn detect_version(root: &Path) -> Result<JavaCardVersion> {
    let lib = root.join("lib");

    if lib.join("tools.jar").is_file() {
        if lib.join("api_classic-3.1.0.jar").is_file() {
            return Ok(JavaCardVersion::V310);
        }
        let api = lib.join("api_classic.jar");
        return Ok(
            if has_entry(&api, "javacard/framework/SensitiveArrays.class")? {
                JavaCardVersion::V305
            } else if has_entry(&api, "javacardx/framework/string/StringUtil.class")? {
                JavaCardVersion::V304
            } else {
                JavaCardVersion::V301
            },
        );
    }

    if lib.join("api21.jar").is_file() {
        return Ok(JavaCardVersion::V212);
    }

    if root.join("bin").join("api.jar").is_file() {
        return Ok(JavaCardVersion::V211);
    }

    if lib.join("converter.jar").is_file() {
        let api = lib.join("api.jar");
        return Ok(if has_entry(&api, "javacardx/apdu/ExtendedLength.class")? {
            JavaCardVersion::V222
        } else {
            JavaCardVersion::V221
        });
    }

    Ok(JavaCardVersion::None)
}

fn open_archive(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {e}", path.display()),
        ))
    })?;
    Ok(ZipArchive::new(BufReader::new(file))?)
}

fn has_entry(archive: &Path, name: &str) -> Result<bool> {
    let zip = open_archive(archive)?;
    let found = zip.file_names().any(|n| n == name);
    Ok(found)
}

fn read_entry(archive: &Path, name: &str) -> Result<Option<Vec<u8>>> {
    let mut zip = open_archive(archive)?;
    if !zip.file_names().any(|n| n == name) {
        return Ok(None);
    }
    let mut entry = zip.by_name(name)?;
    let mut data = Vec::new();
    entry.read_to_end(&mut data)?;
    Ok(Some(data))
}
