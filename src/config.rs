//! Pattern configuration files.
//!
//! Naming patterns can be supplied in a TOML file passed explicitly on the
//! command line. The file is only ever read; nothing is discovered or written
//! behind the user's back.
//!
//! # Configuration File Format
//!
//! ```toml
//! default = "file_{:03d}"
//!
//! [patterns]
//! jpg = "photos/img_{:02d}"
//! png = "photos/img_{:02d}"
//! txt = "notes_{:02d}"
//! ```
//!
//! Patterns are not validated on load. A broken pattern only affects the
//! extension group that uses it.

use crate::file_organizer::Organizer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading a pattern file.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Naming patterns loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternConfig {
    /// Replacement for the default pattern.
    #[serde(default)]
    pub default: Option<String>,

    /// Per-extension patterns, keyed by extension.
    #[serde(default)]
    pub patterns: BTreeMap<String, String>,
}

impl PatternConfig {
    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Registers these patterns on an organizer.
    pub fn apply_to(&self, organizer: &mut Organizer) {
        if let Some(default) = &self.default {
            organizer.set_default_pattern(default.clone());
        }
        for (extension, pattern) in &self.patterns {
            organizer.set_naming_pattern(extension, pattern.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let config = PatternConfig::from_toml(
            r#"
default = "item_{:03d}"

[patterns]
jpg = "photo_{:02d}"
".PNG" = "images/img_{:02d}"
"#,
        )
        .unwrap();

        assert_eq!(config.default.as_deref(), Some("item_{:03d}"));
        assert_eq!(config.patterns.len(), 2);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = PatternConfig::from_toml("").unwrap();
        assert_eq!(config, PatternConfig::default());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result = PatternConfig::from_toml("defualt = \"x_{}\"");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_apply_normalizes_extensions() {
        let config = PatternConfig::from_toml(
            r#"
default = "item_{:03d}"

[patterns]
".PNG" = "images/img_{:02d}"
"#,
        )
        .unwrap();

        let mut organizer = Organizer::new("unused");
        config.apply_to(&mut organizer);

        assert_eq!(organizer.patterns().default_pattern(), "item_{:03d}");
        assert_eq!(organizer.patterns().resolve("png"), "images/img_{:02d}");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[patterns]\ntxt = \"note_{{}}\"").unwrap();

        let config = PatternConfig::load(file.path()).unwrap();
        assert_eq!(config.patterns.get("txt").map(String::as_str), Some("note_{}"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = PatternConfig::load(Path::new("/non/existent/patterns.toml"));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }
}
