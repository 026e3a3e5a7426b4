//! Naming patterns and the per-extension pattern registry.
//!
//! A pattern is a template with exactly one integer replacement field, written
//! in the familiar brace syntax:
//!
//! ```
//! use smartfile::pattern::NamePattern;
//!
//! let pattern = NamePattern::parse("photo_{:02d}").unwrap();
//! assert_eq!(pattern.render(1), "photo_01");
//! assert_eq!(pattern.render(120), "photo_120");
//! ```
//!
//! Supported field syntax is `{[0][:[[fill]align][sign][0][width][d|n]]}`.
//! Literal braces are written `{{` and `}}`. Patterns may contain `/` to
//! route files into subdirectories of the target, but never outside of it.
//!
//! Registering a pattern never validates it. Parsing happens when a pattern
//! is compiled, either explicitly through [`PatternRegistry::validate`] or
//! when the organizer first needs it.

use regex::Regex;
use std::collections::HashMap;
use std::path::{Component, Path};
use std::sync::LazyLock;

/// Pattern used for every extension without an explicit override.
pub const DEFAULT_PATTERN: &str = "file_{:02d}";

/// Widths above this are rejected instead of allocating absurd names.
const MAX_WIDTH: usize = 255;

static FORMAT_SPEC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?P<fill>.)?(?P<align>[<>=^]))?(?P<sign>[+\- ])?(?P<zero>0)?(?P<width>[0-9]+)?(?P<kind>[dn])?$",
    )
    .expect("Invalid format spec regex")
});

/// Errors raised while compiling a naming pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingError {
    /// The pattern has no replacement field at all.
    MissingPlaceholder { pattern: String },
    /// The pattern has more than one replacement field.
    MultiplePlaceholders { pattern: String },
    /// A `{` was never closed, or a `}` appeared on its own.
    UnbalancedBrace { pattern: String, position: usize },
    /// The field names an argument other than the sequence number.
    UnsupportedField { pattern: String, field: String },
    /// The format directive after `:` is not an integer directive we render.
    UnsupportedDirective { pattern: String, directive: String },
    /// The rendered name would land outside the target directory.
    EscapesTarget { pattern: String },
}

impl std::fmt::Display for NamingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPlaceholder { pattern } => {
                write!(f, "Pattern '{}' has no {{}} placeholder", pattern)
            }
            Self::MultiplePlaceholders { pattern } => {
                write!(f, "Pattern '{}' has more than one placeholder", pattern)
            }
            Self::UnbalancedBrace { pattern, position } => {
                write!(
                    f,
                    "Pattern '{}' has an unbalanced brace at position {}",
                    pattern, position
                )
            }
            Self::UnsupportedField { pattern, field } => {
                write!(
                    f,
                    "Pattern '{}' uses unsupported field '{{{}}}'",
                    pattern, field
                )
            }
            Self::UnsupportedDirective { pattern, directive } => {
                write!(
                    f,
                    "Pattern '{}' uses unsupported format directive ':{}'",
                    pattern, directive
                )
            }
            Self::EscapesTarget { pattern } => {
                write!(
                    f,
                    "Pattern '{}' would place files outside the target directory",
                    pattern
                )
            }
        }
    }
}

impl std::error::Error for NamingError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
    /// Padding goes between the sign and the digits.
    AfterSign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Minus,
    Plus,
    Space,
}

/// Parsed `:` directive of the replacement field.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FormatSpec {
    fill: char,
    align: Align,
    sign: Sign,
    width: usize,
}

impl FormatSpec {
    fn parse(pattern: &str, field: &str) -> Result<Self, NamingError> {
        let (name, directive) = field.split_once(':').unwrap_or((field, ""));
        if !(name.is_empty() || name == "0") {
            return Err(NamingError::UnsupportedField {
                pattern: pattern.to_string(),
                field: field.to_string(),
            });
        }

        let unsupported = || NamingError::UnsupportedDirective {
            pattern: pattern.to_string(),
            directive: directive.to_string(),
        };

        let caps = FORMAT_SPEC.captures(directive).ok_or_else(unsupported)?;

        let explicit_fill = caps.name("fill").and_then(|m| m.as_str().chars().next());
        let explicit_align = caps.name("align").map(|m| match m.as_str() {
            "<" => Align::Left,
            "^" => Align::Center,
            "=" => Align::AfterSign,
            _ => Align::Right,
        });
        let zero = caps.name("zero").is_some();
        let sign = match caps.name("sign").map(|m| m.as_str()) {
            Some("+") => Sign::Plus,
            Some(" ") => Sign::Space,
            _ => Sign::Minus,
        };
        let width = match caps.name("width") {
            Some(m) => m
                .as_str()
                .parse::<usize>()
                .ok()
                .filter(|w| *w <= MAX_WIDTH)
                .ok_or_else(unsupported)?,
            None => 0,
        };

        // A bare `0` flag means zero padding after the sign.
        let (fill, align) = match (explicit_fill, explicit_align, zero) {
            (None, None, true) => ('0', Align::AfterSign),
            (None, Some(align), true) => ('0', align),
            (fill, align, _) => (fill.unwrap_or(' '), align.unwrap_or(Align::Right)),
        };

        Ok(Self {
            fill,
            align,
            sign,
            width,
        })
    }

    fn render(&self, value: usize) -> String {
        let digits = value.to_string();
        let sign = match self.sign {
            Sign::Minus => "",
            Sign::Plus => "+",
            Sign::Space => " ",
        };
        let pad = self.width.saturating_sub(sign.len() + digits.len());
        let fill = |n: usize| std::iter::repeat_n(self.fill, n).collect::<String>();

        match self.align {
            Align::Left => format!("{sign}{digits}{}", fill(pad)),
            Align::Right => format!("{}{sign}{digits}", fill(pad)),
            Align::AfterSign => format!("{sign}{}{digits}", fill(pad)),
            Align::Center => {
                let left = pad / 2;
                format!("{}{sign}{digits}{}", fill(left), fill(pad - left))
            }
        }
    }
}

/// A compiled naming pattern: literal prefix, one integer field, literal suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern {
    source: String,
    prefix: String,
    spec: FormatSpec,
    suffix: String,
}

impl NamePattern {
    /// Parses and validates a pattern string.
    ///
    /// # Errors
    ///
    /// Returns a [`NamingError`] describing the first problem found: missing or
    /// repeated placeholder, unbalanced braces, a field or directive we cannot
    /// render as an integer, or a path that would leave the target directory.
    pub fn parse(pattern: &str) -> Result<Self, NamingError> {
        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut spec: Option<FormatSpec> = None;
        let mut chars = pattern.char_indices().peekable();

        while let Some((position, c)) = chars.next() {
            let literal = match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    '{'
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    '}'
                }
                '}' => {
                    return Err(NamingError::UnbalancedBrace {
                        pattern: pattern.to_string(),
                        position,
                    });
                }
                '{' => {
                    let mut field = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        field.push(c);
                    }
                    if !closed {
                        return Err(NamingError::UnbalancedBrace {
                            pattern: pattern.to_string(),
                            position,
                        });
                    }
                    if spec.is_some() {
                        return Err(NamingError::MultiplePlaceholders {
                            pattern: pattern.to_string(),
                        });
                    }
                    spec = Some(FormatSpec::parse(pattern, &field)?);
                    continue;
                }
                other => other,
            };

            if spec.is_none() {
                prefix.push(literal);
            } else {
                suffix.push(literal);
            }
        }

        let spec = spec.ok_or_else(|| NamingError::MissingPlaceholder {
            pattern: pattern.to_string(),
        })?;

        let compiled = Self {
            source: pattern.to_string(),
            prefix,
            spec,
            suffix,
        };
        compiled.ensure_contained()?;
        Ok(compiled)
    }

    /// Rejects patterns whose output is absolute or climbs with `..`.
    fn ensure_contained(&self) -> Result<(), NamingError> {
        let sample = self.render(1);
        let escapes = Path::new(&sample).components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });

        if escapes {
            return Err(NamingError::EscapesTarget {
                pattern: self.source.clone(),
            });
        }
        Ok(())
    }

    /// Renders the pattern for a sequence number.
    pub fn render(&self, index: usize) -> String {
        format!("{}{}{}", self.prefix, self.spec.render(index), self.suffix)
    }

    /// The pattern string this was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Holds the default naming pattern and per-extension overrides.
///
/// Extension keys are stored lowercase without a leading dot, so `"JPG"`,
/// `".jpg"` and `"jpg"` all address the same entry.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    default_pattern: String,
    extension_patterns: HashMap<String, String>,
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self {
            default_pattern: DEFAULT_PATTERN.to_string(),
            extension_patterns: HashMap::new(),
        }
    }
}

impl PatternRegistry {
    /// Creates a registry using [`DEFAULT_PATTERN`] and no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes an extension into a registry key.
    pub fn normalize_key(extension: &str) -> String {
        extension.trim_start_matches('.').to_lowercase()
    }

    /// Replaces the pattern used for extensions without an override.
    pub fn set_default_pattern(&mut self, pattern: impl Into<String>) {
        self.default_pattern = pattern.into();
    }

    /// Sets (or replaces) the pattern for one extension.
    pub fn set_naming_pattern(&mut self, extension: &str, pattern: impl Into<String>) {
        self.extension_patterns
            .insert(Self::normalize_key(extension), pattern.into());
    }

    /// Returns the pattern that applies to `extension`.
    pub fn resolve(&self, extension: &str) -> &str {
        self.extension_patterns
            .get(&Self::normalize_key(extension))
            .map(String::as_str)
            .unwrap_or(&self.default_pattern)
    }

    pub fn default_pattern(&self) -> &str {
        &self.default_pattern
    }

    /// Iterates over the overrides in key order.
    pub fn overrides(&self) -> impl Iterator<Item = (&str, &str)> {
        let mut entries: Vec<_> = self
            .extension_patterns
            .iter()
            .map(|(ext, pattern)| (ext.as_str(), pattern.as_str()))
            .collect();
        entries.sort_unstable();
        entries.into_iter()
    }

    /// Compiles the pattern that applies to `extension`.
    pub fn compile(&self, extension: &str) -> Result<NamePattern, NamingError> {
        NamePattern::parse(self.resolve(extension))
    }

    /// Compiles the default pattern and every override.
    ///
    /// # Errors
    ///
    /// Returns the first [`NamingError`] found, checking the default pattern
    /// first and then overrides in key order.
    pub fn validate(&self) -> Result<(), NamingError> {
        NamePattern::parse(&self.default_pattern)?;
        for (_, pattern) in self.overrides() {
            NamePattern::parse(pattern)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(pattern: &str, index: usize) -> String {
        NamePattern::parse(pattern).unwrap().render(index)
    }

    #[test]
    fn test_zero_padded_width() {
        assert_eq!(render("file_{:02d}", 1), "file_01");
        assert_eq!(render("file_{:02d}", 10), "file_10");
        assert_eq!(render("file_{:02d}", 100), "file_100");
        assert_eq!(render("file_{:04}", 7), "file_0007");
    }

    #[test]
    fn test_plain_placeholders() {
        assert_eq!(render("img_{}", 3), "img_3");
        assert_eq!(render("img_{0}", 3), "img_3");
        assert_eq!(render("img_{:d}", 3), "img_3");
        assert_eq!(render("{}_scan", 12), "12_scan");
    }

    #[test]
    fn test_alignment_and_fill() {
        assert_eq!(render("[{:3}]", 5), "[  5]");
        assert_eq!(render("[{:<3}]", 5), "[5  ]");
        assert_eq!(render("[{:^5}]", 5), "[  5  ]");
        assert_eq!(render("[{:^4}]", 5), "[ 5  ]");
        assert_eq!(render("[{:x>4}]", 5), "[xxx5]");
        assert_eq!(render("[{:+03}]", 5), "[+05]");
    }

    #[test]
    fn test_escaped_braces() {
        assert_eq!(render("{{set}}_{:02d}", 2), "{set}_02");
    }

    #[test]
    fn test_subdirectory_pattern() {
        assert_eq!(render("images/img_{:02d}", 4), "images/img_04");
    }

    #[test]
    fn test_missing_placeholder() {
        assert!(matches!(
            NamePattern::parse("photo"),
            Err(NamingError::MissingPlaceholder { .. })
        ));
        assert!(matches!(
            NamePattern::parse("photo_{{}}"),
            Err(NamingError::MissingPlaceholder { .. })
        ));
    }

    #[test]
    fn test_multiple_placeholders() {
        assert!(matches!(
            NamePattern::parse("{}_{}"),
            Err(NamingError::MultiplePlaceholders { .. })
        ));
    }

    #[test]
    fn test_unbalanced_braces() {
        assert_eq!(
            NamePattern::parse("file_{:02d"),
            Err(NamingError::UnbalancedBrace {
                pattern: "file_{:02d".to_string(),
                position: 5,
            })
        );
        assert!(matches!(
            NamePattern::parse("file}_{}"),
            Err(NamingError::UnbalancedBrace { position: 4, .. })
        ));
    }

    #[test]
    fn test_unsupported_fields_and_directives() {
        assert!(matches!(
            NamePattern::parse("{name}"),
            Err(NamingError::UnsupportedField { .. })
        ));
        assert!(matches!(
            NamePattern::parse("{1}"),
            Err(NamingError::UnsupportedField { .. })
        ));
        assert!(matches!(
            NamePattern::parse("{!r}"),
            Err(NamingError::UnsupportedField { .. })
        ));
        assert!(matches!(
            NamePattern::parse("{:.2f}"),
            Err(NamingError::UnsupportedDirective { .. })
        ));
        assert!(matches!(
            NamePattern::parse("{:x}"),
            Err(NamingError::UnsupportedDirective { .. })
        ));
        assert!(matches!(
            NamePattern::parse("{:9999}"),
            Err(NamingError::UnsupportedDirective { .. })
        ));
    }

    #[test]
    fn test_patterns_cannot_escape_target() {
        for pattern in ["../up_{}", "/abs/file_{}", "a/../../b_{}"] {
            assert!(
                matches!(
                    NamePattern::parse(pattern),
                    Err(NamingError::EscapesTarget { .. })
                ),
                "{pattern} should be rejected"
            );
        }
        assert!(NamePattern::parse("./here_{}").is_ok());
        assert!(NamePattern::parse("a..b_{}").is_ok());
    }

    #[test]
    fn test_registry_default_pattern() {
        let registry = PatternRegistry::new();
        assert_eq!(registry.resolve("txt"), DEFAULT_PATTERN);
        assert_eq!(registry.resolve(""), DEFAULT_PATTERN);
    }

    #[test]
    fn test_registry_last_write_wins_case_insensitive() {
        let mut registry = PatternRegistry::new();
        registry.set_naming_pattern("JPG", "image_{:02d}");
        registry.set_naming_pattern("jpg", "photo_{:02d}");

        assert_eq!(registry.resolve("jpg"), "photo_{:02d}");
        assert_eq!(registry.resolve("JPG"), "photo_{:02d}");
        assert_eq!(registry.overrides().count(), 1);
    }

    #[test]
    fn test_registry_strips_leading_dot() {
        let mut registry = PatternRegistry::new();
        registry.set_naming_pattern(".Png", "shot_{}");
        assert_eq!(registry.resolve("png"), "shot_{}");
        assert_eq!(registry.overrides().collect::<Vec<_>>(), vec![("png", "shot_{}")]);
    }

    #[test]
    fn test_registry_set_default_pattern() {
        let mut registry = PatternRegistry::new();
        registry.set_naming_pattern("txt", "note_{}");
        registry.set_default_pattern("item_{:03d}");

        assert_eq!(registry.resolve("pdf"), "item_{:03d}");
        assert_eq!(registry.resolve("txt"), "note_{}");
    }

    #[test]
    fn test_registration_does_not_validate() {
        let mut registry = PatternRegistry::new();
        registry.set_naming_pattern("txt", "broken");
        registry.set_default_pattern("also broken {");

        assert!(registry.compile("txt").is_err());
        assert!(registry.validate().is_err());
    }

    #[test]
    fn test_validate_reports_bad_override() {
        let mut registry = PatternRegistry::new();
        registry.set_naming_pattern("jpg", "photo_{:02d}");
        assert!(registry.validate().is_ok());

        registry.set_naming_pattern("png", "{:q}");
        assert!(matches!(
            registry.validate(),
            Err(NamingError::UnsupportedDirective { .. })
        ));
    }
}
