/// Sequential renaming of files into a target directory.
///
/// This module provides the [`Organizer`], which scans a source directory,
/// names every file from its extension's pattern and sequence number, and
/// copies or moves it under the target directory. Directory-level problems
/// abort the run; problems with a single file are recorded in the returned
/// [`OrganizeReport`] and the batch carries on.
use crate::namer::{Namer, with_extension};
use crate::pattern::{NamingError, PatternRegistry};
use crate::scanner::{ScanError, Scanner};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Number of files transferred per normalized extension.
pub type ExtensionCounts = BTreeMap<String, usize>;

/// Whether files are copied or moved into the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransferMode {
    /// Leave the source file in place.
    #[default]
    Copy,
    /// Remove the source file once it is at its destination.
    Move,
}

impl TransferMode {
    /// Maps a `move` flag to a mode.
    pub fn from_move_flag(move_files: bool) -> Self {
        if move_files { Self::Move } else { Self::Copy }
    }

    /// Past-tense verb for messages.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Copy => "Copied",
            Self::Move => "Moved",
        }
    }
}

/// Options for a single organize run.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrganizeOptions {
    /// Descend into subdirectories of the source.
    pub recursive: bool,
    /// Copy or move.
    pub mode: TransferMode,
    /// Plan transfers without touching the filesystem.
    pub dry_run: bool,
}

/// Errors for a single file transfer. These never abort the batch.
#[derive(Debug)]
pub enum TransferError {
    /// Failed to create a directory implied by the destination name.
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Something already exists at the destination path.
    DestinationExists { path: PathBuf },
    /// Failed to copy the file to its destination.
    CopyFailed {
        source: PathBuf,
        destination: PathBuf,
        source_error: io::Error,
    },
    /// Failed to move the file to its destination.
    MoveFailed {
        source: PathBuf,
        destination: PathBuf,
        source_error: io::Error,
    },
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::DestinationExists { path } => {
                write!(f, "Destination {} already exists", path.display())
            }
            Self::CopyFailed {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to copy {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::MoveFailed {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
        }
    }
}

impl std::error::Error for TransferError {}

/// Errors that abort an organize run before any file is transferred.
#[derive(Debug)]
pub enum OrganizeError {
    /// The source directory could not be scanned.
    Scan(ScanError),
    /// The target directory does not exist and could not be created.
    TargetCreationFailed { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scan(e) => write!(f, "{}", e),
            Self::TargetCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create target directory {}: {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for OrganizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Scan(e) => Some(e),
            Self::TargetCreationFailed { source, .. } => Some(source),
        }
    }
}

impl From<ScanError> for OrganizeError {
    fn from(e: ScanError) -> Self {
        Self::Scan(e)
    }
}

/// Result type for organize runs.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// A file that was transferred (or, in a dry run, would be).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub extension: String,
    /// 1-based sequence number within the extension group.
    pub index: usize,
}

/// A file whose transfer failed.
#[derive(Debug)]
pub struct TransferFailure {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub extension: String,
    pub error: TransferError,
}

/// An extension group skipped because its pattern could not be compiled.
#[derive(Debug)]
pub struct GroupFailure {
    pub extension: String,
    pub pattern: String,
    /// Files of the group, none of which were transferred.
    pub files: Vec<PathBuf>,
    pub error: NamingError,
}

/// Progress notifications emitted during an organize run.
#[derive(Debug)]
pub enum OrganizeEvent<'a> {
    /// The scan finished and found this many candidate files.
    Scanned { files: usize },
    Transferred(&'a Transfer),
    Failed(&'a TransferFailure),
    GroupSkipped(&'a GroupFailure),
}

/// Outcome of one organize run.
#[derive(Debug, Default)]
pub struct OrganizeReport {
    /// Successful (or planned) transfers per extension.
    pub counts: ExtensionCounts,
    pub transfers: Vec<Transfer>,
    pub failures: Vec<TransferFailure>,
    pub skipped_groups: Vec<GroupFailure>,
    pub mode: TransferMode,
    pub dry_run: bool,
}

impl OrganizeReport {
    fn new(options: &OrganizeOptions) -> Self {
        Self {
            mode: options.mode,
            dry_run: options.dry_run,
            ..Self::default()
        }
    }

    fn record_transfer(&mut self, transfer: Transfer) -> &Transfer {
        *self.counts.entry(transfer.extension.clone()).or_insert(0) += 1;
        self.transfers.push(transfer);
        &self.transfers[self.transfers.len() - 1]
    }

    fn record_failure(&mut self, failure: TransferFailure) -> &TransferFailure {
        self.failures.push(failure);
        &self.failures[self.failures.len() - 1]
    }

    fn record_skipped_group(&mut self, failure: GroupFailure) -> &GroupFailure {
        self.skipped_groups.push(failure);
        &self.skipped_groups[self.skipped_groups.len() - 1]
    }

    /// Number of files that were attempted, including skipped groups.
    pub fn attempted(&self) -> usize {
        self.succeeded() + self.failed()
    }

    /// Number of files transferred (or planned, in a dry run).
    pub fn succeeded(&self) -> usize {
        self.transfers.len()
    }

    /// Number of files that failed or belonged to a skipped group.
    pub fn failed(&self) -> usize {
        self.failures.len()
            + self
                .skipped_groups
                .iter()
                .map(|group| group.files.len())
                .sum::<usize>()
    }

    /// Returns true if every discovered file was transferred.
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty() && self.skipped_groups.is_empty()
    }
}

/// Renames files from a source directory into a target directory.
///
/// Each file gets its extension's pattern rendered with its 1-based position
/// in the extension group, followed by `.ext` when the file has an extension.
///
/// # Examples
///
/// ```no_run
/// use smartfile::Organizer;
///
/// let mut organizer = Organizer::new("/path/to/renamed");
/// organizer.set_naming_pattern("jpg", "photo_{:02d}");
///
/// match organizer.organize_files("/path/to/source", false, false) {
///     Ok(counts) => {
///         for (extension, count) in &counts {
///             println!("{}: {} files", extension, count);
///         }
///     }
///     Err(e) => eprintln!("Organization failed: {}", e),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Organizer {
    target: PathBuf,
    patterns: PatternRegistry,
}

impl Organizer {
    /// Creates an organizer writing into `target`. The directory is created
    /// on the first run, not here.
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            patterns: PatternRegistry::new(),
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn patterns(&self) -> &PatternRegistry {
        &self.patterns
    }

    pub fn patterns_mut(&mut self) -> &mut PatternRegistry {
        &mut self.patterns
    }

    /// Sets the naming pattern for one extension (case-insensitive).
    pub fn set_naming_pattern(&mut self, extension: &str, pattern: impl Into<String>) {
        self.patterns.set_naming_pattern(extension, pattern);
    }

    /// Sets the pattern used for extensions without their own pattern.
    pub fn set_default_pattern(&mut self, pattern: impl Into<String>) {
        self.patterns.set_default_pattern(pattern);
    }

    /// Organizes `source` and returns the number of files transferred per
    /// extension.
    ///
    /// # Errors
    ///
    /// Returns an [`OrganizeError`] if the source cannot be scanned or the
    /// target cannot be created. Failures of individual files are not errors;
    /// they are simply missing from the counts. Use [`Organizer::organize`] to
    /// see them.
    pub fn organize_files(
        &self,
        source: impl AsRef<Path>,
        recursive: bool,
        move_files: bool,
    ) -> OrganizeResult<ExtensionCounts> {
        let options = OrganizeOptions {
            recursive,
            mode: TransferMode::from_move_flag(move_files),
            dry_run: false,
        };
        self.organize(source, &options).map(|report| report.counts)
    }

    /// Organizes `source` and returns the full report.
    pub fn organize(
        &self,
        source: impl AsRef<Path>,
        options: &OrganizeOptions,
    ) -> OrganizeResult<OrganizeReport> {
        self.organize_with_progress(source, options, |_| {})
    }

    /// Organizes `source`, calling `on_event` as the run progresses.
    ///
    /// Steps, in order:
    /// 1. Check the source directory
    /// 2. Create the target directory (skipped in a dry run)
    /// 3. Scan and group files by extension
    /// 4. For each group in extension order, compile its pattern once; a bad
    ///    pattern skips the whole group
    /// 5. Transfer each file, recording successes and failures
    pub fn organize_with_progress<F>(
        &self,
        source: impl AsRef<Path>,
        options: &OrganizeOptions,
        mut on_event: F,
    ) -> OrganizeResult<OrganizeReport>
    where
        F: FnMut(OrganizeEvent<'_>),
    {
        let source = source.as_ref();
        Scanner::check_source(source)?;

        if !options.dry_run {
            self.ensure_target()?;
        }

        let mut scanner = Scanner::new(options.recursive);
        if options.recursive && !same_directory(source, &self.target) {
            scanner = scanner.skip_dir(&self.target);
        }
        let groups = scanner.scan(source)?;
        on_event(OrganizeEvent::Scanned {
            files: groups.file_count(),
        });

        let mut report = OrganizeReport::new(options);
        let mut namer = Namer::new(&self.patterns);

        for (extension, entries) in groups.iter() {
            let pattern = match namer.pattern_for(extension) {
                Ok(pattern) => pattern,
                Err(error) => {
                    tracing::warn!(
                        extension,
                        files = entries.len(),
                        error = %error,
                        "skipping extension group with invalid pattern"
                    );
                    let failure = GroupFailure {
                        extension: extension.to_string(),
                        pattern: self.patterns.resolve(extension).to_string(),
                        files: entries.iter().map(|entry| entry.path.clone()).collect(),
                        error,
                    };
                    on_event(OrganizeEvent::GroupSkipped(
                        report.record_skipped_group(failure),
                    ));
                    continue;
                }
            };

            for entry in entries {
                let index = entry.position + 1;
                let destination = self
                    .target
                    .join(with_extension(pattern.render(index), extension));

                let outcome = if options.dry_run {
                    check_destination(&destination)
                } else {
                    transfer_file(&entry.path, &destination, options.mode)
                };

                match outcome {
                    Ok(()) => {
                        tracing::debug!(
                            source = %entry.path.display(),
                            destination = %destination.display(),
                            dry_run = options.dry_run,
                            "{}",
                            options.mode.verb()
                        );
                        let transfer = Transfer {
                            source: entry.path.clone(),
                            destination,
                            extension: extension.to_string(),
                            index,
                        };
                        on_event(OrganizeEvent::Transferred(
                            report.record_transfer(transfer),
                        ));
                    }
                    Err(error) => {
                        tracing::warn!(
                            source = %entry.path.display(),
                            error = %error,
                            "file transfer failed"
                        );
                        let failure = TransferFailure {
                            source: entry.path.clone(),
                            destination,
                            extension: extension.to_string(),
                            error,
                        };
                        on_event(OrganizeEvent::Failed(report.record_failure(failure)));
                    }
                }
            }
        }

        tracing::info!(
            source = %source.display(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            dry_run = options.dry_run,
            "organize run finished"
        );
        Ok(report)
    }

    /// Creates the target directory (and parents) if it is missing.
    fn ensure_target(&self) -> OrganizeResult<()> {
        if self.target.is_dir() {
            return Ok(());
        }

        if self.target.exists() {
            return Err(OrganizeError::TargetCreationFailed {
                path: self.target.clone(),
                source: io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "path exists and is not a directory",
                ),
            });
        }

        fs::create_dir_all(&self.target).map_err(|e| OrganizeError::TargetCreationFailed {
            path: self.target.clone(),
            source: e,
        })?;
        tracing::info!(path = %self.target.display(), "created target directory");
        Ok(())
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn check_destination(destination: &Path) -> Result<(), TransferError> {
    if destination.symlink_metadata().is_ok() {
        return Err(TransferError::DestinationExists {
            path: destination.to_path_buf(),
        });
    }
    Ok(())
}

/// Copies or moves one file, creating any directories the destination needs.
///
/// Existing destinations are never overwritten.
fn transfer_file(source: &Path, destination: &Path, mode: TransferMode) -> Result<(), TransferError> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| TransferError::DirectoryCreationFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    check_destination(destination)?;

    match mode {
        TransferMode::Copy => copy_file(source, destination),
        TransferMode::Move => move_file(source, destination),
    }
}

fn copy_file(source: &Path, destination: &Path) -> Result<(), TransferError> {
    fs::copy(source, destination).map_err(|e| {
        // The destination did not exist before, so anything there is partial.
        let _ = fs::remove_file(destination);
        TransferError::CopyFailed {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            source_error: e,
        }
    })?;
    Ok(())
}

/// Renames the file, falling back to copy + remove across filesystems.
fn move_file(source: &Path, destination: &Path) -> Result<(), TransferError> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!(
                source = %source.display(),
                destination = %destination.display(),
                "rename crosses devices, copying instead"
            );
            copy_file(source, destination)?;
            fs::remove_file(source).map_err(|e| {
                let _ = fs::remove_file(destination);
                TransferError::MoveFailed {
                    source: source.to_path_buf(),
                    destination: destination.to_path_buf(),
                    source_error: e,
                }
            })
        }
        Err(e) => Err(TransferError::MoveFailed {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            source_error: e,
        }),
    }
}
