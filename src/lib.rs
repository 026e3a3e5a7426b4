//! smartfile - sequential, extension-based file renaming
//!
//! This library copies or moves the files of a source directory into a target
//! directory, grouping them by extension and renaming each group with a
//! numbered pattern such as `photo_{:02d}`. Patterns are configured per
//! extension, with a default for everything else, either programmatically or
//! from a TOML file.

pub mod cli;
pub mod config;
pub mod file_organizer;
pub mod namer;
pub mod output;
pub mod pattern;
pub mod scanner;

pub use config::{ConfigError, PatternConfig};
pub use file_organizer::{
    ExtensionCounts, OrganizeError, OrganizeOptions, OrganizeReport, OrganizeResult, Organizer,
    TransferError, TransferMode,
};
pub use namer::{Namer, name_for};
pub use pattern::{DEFAULT_PATTERN, NamePattern, NamingError, PatternRegistry};
pub use scanner::{ExtensionGroups, FileEntry, ScanError, Scanner};

pub use cli::{Cli, run_cli};
