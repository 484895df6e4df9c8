//! Regex outline of the types a file declares.
//!
//! A cheap scan over raw text that finds `namespace` statements and
//! `class`/`interface`/`trait`/`enum` declarations without lexing. Its result
//! is intersected with the syntax tree so that only types both passes agree
//! on are extracted.

use regex::Regex;
use std::sync::LazyLock;

static OUTLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?mi)(?:^|[\s;{}\]])(?:namespace(?:\s+([\w\\]+))?\s*[;{]|(?:(?:abstract|final|readonly)\s+)*(?:class|interface|trait|enum)\s+([A-Za-z_\x{80}-\x{10FFFF}]\w*))",
    )
    .expect("outline pattern is valid")
});

/// Returns the fully-qualified names of the types declared in `source`, in
/// declaration order.
///
/// May contain false positives (declarations inside comments or strings);
/// callers only use it to filter types found by the parser.
pub fn declared_type_names(source: &str) -> Vec<String> {
    let mut namespace = String::new();
    let mut names = Vec::new();
    for caps in OUTLINE.captures_iter(source) {
        if let Some(ty) = caps.get(2) {
            if namespace.is_empty() {
                names.push(ty.as_str().to_string());
            } else {
                names.push(format!("{namespace}\\{}", ty.as_str()));
            }
        } else {
            namespace = caps
                .get(1)
                .map_or("", |m| m.as_str())
                .trim_matches('\\')
                .to_string();
        }
    }
    names
}
