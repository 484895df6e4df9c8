//! Namespace-aware resolution of class names.

use crate::ast::{Name, NameKind, UseClause, UseKind};
use std::collections::HashMap;

/// Resolves class names written in source to fully-qualified names.
///
/// Holds the state of one namespace scope: the namespace name, the class
/// imports seen so far, and the class being declared (for `self`, `static`
/// and `parent`). Resolved names never carry a leading backslash.
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    namespace: String,
    /// Lower-cased alias to imported name.
    imports: HashMap<String, String>,
    current_class: Option<String>,
    parent_class: Option<String>,
}

impl NameResolver {
    /// Creates a resolver for the given namespace (`None` for the global one).
    pub fn new(namespace: Option<&str>) -> Self {
        Self {
            namespace: namespace
                .unwrap_or("")
                .trim_matches('\\')
                .to_string(),
            ..Self::default()
        }
    }

    /// Returns the current namespace, empty for the global namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Registers a `use` clause. Function and constant imports are ignored.
    pub fn add_import(&mut self, clause: &UseClause) {
        if clause.kind == UseKind::Class {
            self.imports
                .insert(clause.local_name().to_ascii_lowercase(), clause.name.clone());
        }
    }

    /// Sets the class whose body is being resolved.
    pub fn enter_class(&mut self, fqn: String, parent: Option<String>) {
        self.current_class = Some(fqn);
        self.parent_class = parent;
    }

    /// Returns the fully-qualified name of the class being resolved.
    pub fn current_class(&self) -> Option<&str> {
        self.current_class.as_deref()
    }

    /// Prefixes a declared short name with the current namespace.
    pub fn qualify(&self, short: &str) -> String {
        if self.namespace.is_empty() {
            short.to_string()
        } else {
            format!("{}\\{short}", self.namespace)
        }
    }

    /// Resolves a class name reference.
    pub fn resolve_class(&self, name: &Name) -> String {
        self.resolve(&name.text, name.kind)
    }

    /// Resolves a class name given as text and syntactic kind.
    pub fn resolve(&self, text: &str, kind: NameKind) -> String {
        match kind {
            NameKind::FullyQualified => text.trim_start_matches('\\').to_string(),
            NameKind::Relative => {
                let rest = text.split_once('\\').map_or("", |(_, rest)| rest);
                self.qualify(rest)
            }
            NameKind::Qualified => {
                let (first, rest) = text.split_once('\\').unwrap_or((text, ""));
                match self.imports.get(&first.to_ascii_lowercase()) {
                    Some(imported) => format!("{imported}\\{rest}"),
                    None => self.qualify(text),
                }
            }
            NameKind::Unqualified => {
                let lower = text.to_ascii_lowercase();
                let special = match lower.as_str() {
                    "self" | "static" => self.current_class.as_ref(),
                    "parent" => self.parent_class.as_ref(),
                    _ => None,
                };
                if let Some(resolved) = special {
                    return resolved.clone();
                }
                match self.imports.get(&lower) {
                    Some(imported) => imported.clone(),
                    None => self.qualify(text),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrix_source::Span;

    fn name(text: &str, kind: NameKind) -> Name {
        Name {
            text: text.into(),
            kind,
            span: Span::EMPTY,
        }
    }

    fn resolver() -> NameResolver {
        let mut r = NameResolver::new(Some("App\\Controller"));
        r.add_import(&UseClause {
            kind: UseKind::Class,
            name: "App\\Attribute\\Route".into(),
            alias: None,
        });
        r.add_import(&UseClause {
            kind: UseKind::Class,
            name: "Symfony\\Component\\Validator\\Constraints".into(),
            alias: Some("Assert".into()),
        });
        r.add_import(&UseClause {
            kind: UseKind::Function,
            name: "App\\helper".into(),
            alias: None,
        });
        r
    }

    #[test]
    fn fully_qualified_names_are_kept() {
        let r = resolver();
        assert_eq!(
            r.resolve_class(&name("\\Other\\Route", NameKind::FullyQualified)),
            "Other\\Route"
        );
    }

    #[test]
    fn imports_are_case_insensitive() {
        let r = resolver();
        assert_eq!(
            r.resolve_class(&name("route", NameKind::Unqualified)),
            "App\\Attribute\\Route"
        );
        assert_eq!(
            r.resolve_class(&name("Assert\\NotBlank", NameKind::Qualified)),
            "Symfony\\Component\\Validator\\Constraints\\NotBlank"
        );
    }

    #[test]
    fn unknown_names_get_namespace_prefix() {
        let r = resolver();
        assert_eq!(
            r.resolve_class(&name("Local", NameKind::Unqualified)),
            "App\\Controller\\Local"
        );
        assert_eq!(
            r.resolve_class(&name("Sub\\Local", NameKind::Qualified)),
            "App\\Controller\\Sub\\Local"
        );
        assert_eq!(
            r.resolve_class(&name("namespace\\Local", NameKind::Relative)),
            "App\\Controller\\Local"
        );
        assert_eq!(
            r.resolve_class(&name("helper", NameKind::Unqualified)),
            "App\\Controller\\helper"
        );
    }

    #[test]
    fn global_namespace() {
        let r = NameResolver::new(None);
        assert_eq!(r.namespace(), "");
        assert_eq!(r.qualify("Attribute"), "Attribute");
        assert_eq!(
            r.resolve_class(&name("Attribute", NameKind::Unqualified)),
            "Attribute"
        );
    }

    #[test]
    fn self_static_and_parent() {
        let mut r = resolver();
        r.enter_class("App\\Controller\\Home".into(), Some("App\\Base".into()));
        assert_eq!(
            r.resolve_class(&name("self", NameKind::Unqualified)),
            "App\\Controller\\Home"
        );
        assert_eq!(
            r.resolve_class(&name("STATIC", NameKind::Unqualified)),
            "App\\Controller\\Home"
        );
        assert_eq!(
            r.resolve_class(&name("parent", NameKind::Unqualified)),
            "App\\Base"
        );
        assert_eq!(r.current_class(), Some("App\\Controller\\Home"));
    }
}
