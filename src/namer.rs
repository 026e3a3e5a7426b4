//! Destination naming for sequentially numbered files.

use crate::pattern::{NamePattern, NamingError, PatternRegistry};
use std::collections::HashMap;

/// Computes destination base names from a [`PatternRegistry`].
///
/// Compiled patterns are cached per extension for the lifetime of the namer,
/// so a pattern is parsed once per organize run no matter how many files use it.
#[derive(Debug)]
pub struct Namer<'a> {
    registry: &'a PatternRegistry,
    compiled: HashMap<String, NamePattern>,
}

impl<'a> Namer<'a> {
    pub fn new(registry: &'a PatternRegistry) -> Self {
        Self {
            registry,
            compiled: HashMap::new(),
        }
    }

    /// Returns the compiled pattern for `extension`, compiling it on first use.
    pub fn pattern_for(&mut self, extension: &str) -> Result<&NamePattern, NamingError> {
        let key = PatternRegistry::normalize_key(extension);
        if !self.compiled.contains_key(&key) {
            let pattern = self.registry.compile(&key)?;
            self.compiled.insert(key.clone(), pattern);
        }
        Ok(&self.compiled[&key])
    }

    /// Produces the destination name for the `index`-th file (1-based) of an
    /// extension group, including the `.ext` suffix when there is one.
    pub fn name_for(&mut self, extension: &str, index: usize) -> Result<String, NamingError> {
        let base = self.pattern_for(extension)?.render(index);
        Ok(with_extension(base, extension))
    }
}

/// One-shot form of [`Namer::name_for`].
pub fn name_for(
    extension: &str,
    index: usize,
    registry: &PatternRegistry,
) -> Result<String, NamingError> {
    Namer::new(registry).name_for(extension, index)
}

/// Appends `.extension` unless the extension is empty.
pub(crate) fn with_extension(mut base: String, extension: &str) -> String {
    if !extension.is_empty() {
        base.push('.');
        base.push_str(extension);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pattern_with_extension() {
        let registry = PatternRegistry::new();
        assert_eq!(name_for("txt", 1, &registry).unwrap(), "file_01.txt");
        assert_eq!(name_for("txt", 12, &registry).unwrap(), "file_12.txt");
    }

    #[test]
    fn test_no_extension_gets_no_suffix() {
        let registry = PatternRegistry::new();
        assert_eq!(name_for("", 1, &registry).unwrap(), "file_01");
    }

    #[test]
    fn test_empty_key_override() {
        let mut registry = PatternRegistry::new();
        registry.set_naming_pattern("", "plain_{}");
        assert_eq!(name_for("", 3, &registry).unwrap(), "plain_3");
    }

    #[test]
    fn test_extension_override_is_case_insensitive() {
        let mut registry = PatternRegistry::new();
        registry.set_naming_pattern("JPG", "photo_{:02d}");

        let mut namer = Namer::new(&registry);
        assert_eq!(namer.name_for("jpg", 2).unwrap(), "photo_02.jpg");
        assert_eq!(namer.name_for("png", 2).unwrap(), "file_02.png");
    }

    #[test]
    fn test_subdirectory_routing() {
        let mut registry = PatternRegistry::new();
        registry.set_naming_pattern("png", "images/img_{:02d}");
        assert_eq!(
            name_for("png", 1, &registry).unwrap(),
            "images/img_01.png"
        );
    }

    #[test]
    fn test_bad_pattern_fails_at_naming_time() {
        let mut registry = PatternRegistry::new();
        registry.set_naming_pattern("txt", "notes");

        let mut namer = Namer::new(&registry);
        assert!(matches!(
            namer.name_for("txt", 1),
            Err(NamingError::MissingPlaceholder { .. })
        ));
        assert!(namer.name_for("md", 1).is_ok());
    }

    #[test]
    fn test_pattern_is_cached() {
        let mut registry = PatternRegistry::new();
        registry.set_naming_pattern("log", "run_{:03}");

        let mut namer = Namer::new(&registry);
        assert_eq!(namer.pattern_for("LOG").unwrap().as_str(), "run_{:03}");
        assert_eq!(namer.compiled.len(), 1);
        namer.name_for("log", 5).unwrap();
        assert_eq!(namer.compiled.len(), 1);
    }
}
