//! Namespace-style name patterns: `App\Controller\UsersController` or `App\Controller\*`.

/// Marker that turns a pattern into a namespace prefix match.
pub const WILDCARD: char = '*';

/// A fully-qualified type name pattern.
///
/// A pattern ending in `*` is a strict prefix test against the pattern with the
/// marker stripped; anything else is an exact match. No other glob syntax is
/// recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePattern {
    /// Matches exactly this name.
    Exact(String),
    /// Matches any name starting with this prefix.
    Prefix(String),
}

impl NamePattern {
    /// Parses a pattern. A leading `\` is ignored, as in PHP source.
    pub fn new(pattern: &str) -> Self {
        let pattern = pattern.trim().trim_start_matches('\\');
        match pattern.strip_suffix(WILDCARD) {
            Some(prefix) => NamePattern::Prefix(prefix.to_string()),
            None => NamePattern::Exact(pattern.to_string()),
        }
    }

    /// Returns `true` if `name` matches this pattern.
    pub fn matches(&self, name: &str) -> bool {
        let name = name.trim_start_matches('\\');
        match self {
            NamePattern::Exact(exact) => name == exact,
            NamePattern::Prefix(prefix) => name.starts_with(prefix.as_str()),
        }
    }
}

/// Returns `true` if any pattern in `patterns` matches `name`.
pub fn matches_any(patterns: &[NamePattern], name: &str) -> bool {
    patterns.iter().any(|p| p.matches(name))
}
