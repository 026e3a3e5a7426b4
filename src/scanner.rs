//! Source directory traversal and grouping by extension.
//!
//! The scanner walks a source directory in sorted order and groups every
//! regular file by its normalized extension. Walking depth-first with entries
//! sorted by name yields files in lexicographic path order, which keeps the
//! sequence numbers assigned later reproducible across runs.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Errors that prevent a source directory from being scanned.
#[derive(Debug)]
pub enum ScanError {
    /// The source directory does not exist.
    NotFound { path: PathBuf },
    /// The source path exists but is not a directory.
    NotADirectory { path: PathBuf },
    /// The source directory, or a directory below it, could not be read.
    Unreadable { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { path } => {
                write!(f, "Source directory {} does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "Source path {} is not a directory", path.display())
            }
            Self::Unreadable { path, source } => {
                write!(f, "Cannot read directory {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unreadable { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A discovered file awaiting transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path of the file, rooted at the scanned source directory.
    pub path: PathBuf,
    /// Normalized extension, empty when the file has none.
    pub extension: String,
    /// Zero-based position within its extension group.
    pub position: usize,
}

/// Files grouped by normalized extension.
///
/// Groups iterate in extension order, with the empty (no extension) group
/// first. Entries within a group are in discovery order.
#[derive(Debug, Default, Clone)]
pub struct ExtensionGroups {
    groups: BTreeMap<String, Vec<FileEntry>>,
}

impl ExtensionGroups {
    fn push(&mut self, path: PathBuf) {
        let extension = normalize_extension(&path);
        let group = self.groups.entry(extension.clone()).or_default();
        group.push(FileEntry {
            path,
            extension,
            position: group.len(),
        });
    }

    pub fn get(&self, extension: &str) -> Option<&[FileEntry]> {
        self.groups.get(extension).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FileEntry])> {
        self.groups
            .iter()
            .map(|(extension, entries)| (extension.as_str(), entries.as_slice()))
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Total number of files across all groups.
    pub fn file_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Returns the lowercase extension of `path`, or an empty string.
///
/// Dotfiles such as `.bashrc` have no extension; `archive.tar.gz` has `gz`.
pub fn normalize_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Walks a source directory and groups its files by extension.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    recursive: bool,
    skip_dir: Option<PathBuf>,
}

impl Scanner {
    pub fn new(recursive: bool) -> Self {
        Self {
            recursive,
            skip_dir: None,
        }
    }

    /// Excludes a directory subtree from the scan.
    ///
    /// Used to keep the target directory out of a recursive scan when it lives
    /// inside the source. The path is compared after canonicalization.
    pub fn skip_dir(mut self, dir: &Path) -> Self {
        self.skip_dir = fs::canonicalize(dir).ok();
        self
    }

    /// Checks that `source` exists, is a directory and can be listed.
    pub fn check_source(source: &Path) -> Result<(), ScanError> {
        let metadata = fs::metadata(source).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ScanError::NotFound {
                path: source.to_path_buf(),
            },
            _ => ScanError::Unreadable {
                path: source.to_path_buf(),
                source: e,
            },
        })?;

        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory {
                path: source.to_path_buf(),
            });
        }

        fs::read_dir(source).map_err(|e| ScanError::Unreadable {
            path: source.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Scans `source` and returns its files grouped by extension.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] if `source` is missing, not a directory, or if
    /// any directory that has to be listed cannot be read. Partial results are
    /// never returned.
    pub fn scan(&self, source: &Path) -> Result<ExtensionGroups, ScanError> {
        Self::check_source(source)?;

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(source)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_skipped(entry));

        let mut groups = ExtensionGroups::default();
        for entry in walker {
            let entry = entry.map_err(|e| ScanError::Unreadable {
                path: e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| source.to_path_buf()),
                source: io::Error::from(e),
            })?;

            if is_candidate(&entry) {
                groups.push(entry.into_path());
            }
        }

        tracing::debug!(
            source = %source.display(),
            files = groups.file_count(),
            extensions = groups.groups.len(),
            "scanned source directory"
        );
        Ok(groups)
    }

    fn is_skipped(&self, entry: &DirEntry) -> bool {
        match &self.skip_dir {
            Some(skip) if entry.file_type().is_dir() => {
                fs::canonicalize(entry.path()).is_ok_and(|path| &path == skip)
            }
            _ => false,
        }
    }
}

/// Regular files, plus symlinks that resolve to regular files.
fn is_candidate(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
}
