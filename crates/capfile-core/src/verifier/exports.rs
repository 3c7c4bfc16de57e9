//! Export file collection and the scoped workspace it extracts into.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::{EXPORT_FILE_SUFFIX, Error, Result};

/// Temporary directory owned by one verification call.
///
/// Removed recursively when dropped, whichever way the call ends. A failed
/// removal is logged and otherwise ignored.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    dir: Option<TempDir>,
}

impl Workspace {
    /// Create a fresh `capfile*` directory under `parent`, which must exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if `parent` is missing or not writable.
    pub fn create(parent: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("capfile")
            .tempdir_in(parent)
            .map_err(|e| {
                Error::Io(io::Error::new(
                    e.kind(),
                    format!("Can not make temporary folder in {}: {e}", parent.display()),
                ))
            })?;
        let path = dir.path().to_path_buf();
        debug!(path = %path.display(), "Created workspace");
        Ok(Self {
            path,
            dir: Some(dir),
        })
    }

    /// Workspace root.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            match dir.close() {
                Ok(()) => debug!(path = %self.path.display(), "Removed workspace"),
                Err(e) => warn!(path = %self.path.display(), "Failed to remove workspace: {e}"),
            }
        }
    }
}

/// Export files handed to the verifier, in collection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportFileSet {
    files: Vec<PathBuf>,
}

impl ExportFileSet {
    /// Gather export files from `sources`.
    ///
    /// - a directory contributes every `*.exp` file below it
    /// - an `*.exp` file contributes itself
    /// - a `*.jar` or `*.zip` file has its `.exp` members extracted into
    ///   `workspace`, each archive into its own numbered subdirectory
    ///
    /// Missing sources and other files are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be walked, an archive cannot be
    /// read, or an extracted file cannot be written.
    pub fn collect(sources: &[PathBuf], workspace: &Workspace) -> Result<Self> {
        let mut files = Vec::new();
        let mut archives = 0usize;

        for source in sources {
            if source.is_dir() {
                let before = files.len();
                for entry in WalkDir::new(source).sort_by_file_name() {
                    let entry = entry.map_err(io::Error::from)?;
                    if entry.file_type().is_file() && is_export_file(entry.path()) {
                        files.push(entry.into_path());
                    }
                }
                debug!(source = %source.display(), found = files.len() - before, "Scanned export directory");
            } else if source.is_file() {
                if is_export_file(source) {
                    files.push(source.clone());
                } else if is_archive(source) {
                    let dest = workspace.path().join(archives.to_string());
                    archives += 1;
                    files.extend(extract_exports(source, &dest)?);
                } else {
                    warn!(source = %source.display(), "Ignoring export source that is not a directory, .exp or archive");
                }
            } else {
                warn!(source = %source.display(), "Export source does not exist, skipping");
            }
        }

        Ok(Self { files })
    }

    /// Collected paths.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Number of export files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no export file was found.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl IntoIterator for ExportFileSet {
    type Item = PathBuf;
    type IntoIter = std::vec::IntoIter<PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

fn is_export_file(path: &Path) -> bool {
    path.to_string_lossy().ends_with(EXPORT_FILE_SUFFIX)
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jar") || e.eq_ignore_ascii_case("zip"))
}

/// Extract every `.exp` member of `archive` below `dest`, keeping member
/// paths. Matching is case-insensitive.
pub fn extract_exports(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(BufReader::new(file))?;
    let mut extracted = Vec::new();

    for i in 0..zip.len() {
        let mut member = zip.by_index(i)?;
        if member.is_dir()
            || !member
                .name()
                .to_ascii_lowercase()
                .ends_with(EXPORT_FILE_SUFFIX)
        {
            continue;
        }
        let Some(relative) = member.enclosed_name() else {
            warn!(archive = %archive.display(), member = member.name(), "Skipping member outside of archive root");
            continue;
        };

        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Io(io::Error::new(
                    e.kind(),
                    format!("Failed to create folder {}: {e}", parent.display()),
                ))
            })?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut member, &mut out)?;
        extracted.push(target);
    }

    debug!(archive = %archive.display(), count = extracted.len(), "Extracted export files");
    Ok(extracted)
}
