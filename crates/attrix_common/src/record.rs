//! The attribute record: one discovered attribute occurrence.

use crate::instance::{FromAttribute, InstantiateError};
use crate::value::Arguments;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// The kind of program element an attribute is attached to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// A class, interface, trait or enum declaration.
    Class,
    /// A method.
    Method,
    /// A property, including constructor-promoted properties.
    Property,
    /// A method parameter.
    Parameter,
    /// A class constant or enum case.
    Constant,
}

impl TargetKind {
    /// All target kinds, in declaration order.
    pub const ALL: [TargetKind; 5] = [
        TargetKind::Class,
        TargetKind::Method,
        TargetKind::Property,
        TargetKind::Parameter,
        TargetKind::Constant,
    ];

    /// Returns the lower-case name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Class => "class",
            TargetKind::Method => "method",
            TargetKind::Property => "property",
            TargetKind::Parameter => "parameter",
            TargetKind::Constant => "constant",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown target kind name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown target kind '{0}' (expected class, method, property, parameter or constant)")]
pub struct ParseTargetKindError(pub String);

impl FromStr for TargetKind {
    type Err = ParseTargetKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseTargetKindError(s.to_string()))
    }
}

/// Describes the element an attribute is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetDescriptor {
    /// The element kind.
    pub kind: TargetKind,
    /// Member name, or the short type name for class-level targets.
    pub name: String,
    /// Short name of the declaring type for member-level targets.
    pub owning_type_name: Option<String>,
}

impl TargetDescriptor {
    /// A class-level target.
    pub fn class(short_name: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::Class,
            name: short_name.into(),
            owning_type_name: None,
        }
    }

    /// A member-level target declared in `owner`.
    pub fn member(kind: TargetKind, name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            owning_type_name: Some(owner.into()),
        }
    }
}

impl fmt::Display for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.owning_type_name, self.kind) {
            (None, _) => write!(f, "{} {}", self.kind, self.name),
            (Some(owner), TargetKind::Method) => write!(f, "method {owner}::{}()", self.name),
            (Some(owner), TargetKind::Property | TargetKind::Parameter) => {
                write!(f, "{} {owner}::${}", self.kind, self.name)
            }
            (Some(owner), _) => write!(f, "{} {owner}::{}", self.kind, self.name),
        }
    }
}

/// One attribute occurrence discovered in a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRecord {
    /// Fully-qualified name of the type the attribute is attached to or declared in.
    pub owner_type: String,
    /// Fully-qualified name of the attribute type.
    pub attribute_type: String,
    /// Attribute arguments in source order.
    pub arguments: Arguments,
    /// Absolute path of the file containing the attribute.
    pub source_file: PathBuf,
    /// 1-based line of the target declaration, or 0 when unknown.
    pub line_number: u32,
    /// The element the attribute is attached to.
    pub target: TargetDescriptor,
    /// Modification time of `source_file` at scan time (unix seconds).
    pub file_modified_at: i64,
    /// Hex XXH3-64 of `source_file`'s content; empty when unknown.
    pub file_content_hash: String,
    /// Plugin the file belongs to, `None` for the application itself.
    pub owning_plugin_name: Option<String>,
}

impl AttributeRecord {
    /// Returns the attribute type name without its namespace.
    pub fn attribute_short_name(&self) -> &str {
        short_name(&self.attribute_type)
    }

    /// Returns the owner type name without its namespace.
    pub fn owner_short_name(&self) -> &str {
        short_name(&self.owner_type)
    }

    /// Returns the namespace of the owner type, or `""` for the global namespace.
    pub fn owner_namespace(&self) -> &str {
        self.owner_type
            .rfind('\\')
            .map(|i| &self.owner_type[..i])
            .unwrap_or("")
    }

    /// Reconstructs the attribute as a typed value.
    ///
    /// Fails with [`InstantiateError::TypeMismatch`] if this record is not an
    /// occurrence of `T`.
    pub fn instantiate<T: FromAttribute>(&self) -> Result<T, InstantiateError> {
        if self.attribute_type != T::TYPE {
            return Err(InstantiateError::TypeMismatch {
                expected: T::TYPE.to_string(),
                actual: self.attribute_type.clone(),
            });
        }
        T::from_arguments(&self.arguments)
    }
}

/// Returns the last segment of a namespaced name.
pub fn short_name(fqn: &str) -> &str {
    fqn.rsplit('\\').next().unwrap_or(fqn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ArgumentValue;

    fn sample() -> AttributeRecord {
        let mut arguments = Arguments::new();
        arguments.insert("path", ArgumentValue::String("/users".into()));
        AttributeRecord {
            owner_type: "App\\Controller\\UsersController".into(),
            attribute_type: "App\\Attribute\\Route".into(),
            arguments,
            source_file: PathBuf::from("/app/src/Controller/UsersController.php"),
            line_number: 7,
            target: TargetDescriptor::class("UsersController"),
            file_modified_at: 1_700_000_000,
            file_content_hash: String::new(),
            owning_plugin_name: None,
        }
    }

    #[test]
    fn name_helpers() {
        let r = sample();
        assert_eq!(r.attribute_short_name(), "Route");
        assert_eq!(r.owner_short_name(), "UsersController");
        assert_eq!(r.owner_namespace(), "App\\Controller");
        assert_eq!(short_name("Global"), "Global");
    }

    #[test]
    fn target_kind_parse() {
        assert_eq!("method".parse::<TargetKind>().unwrap(), TargetKind::Method);
        assert_eq!("CLASS".parse::<TargetKind>().unwrap(), TargetKind::Class);
        assert!("function".parse::<TargetKind>().is_err());
    }

    #[test]
    fn target_display() {
        assert_eq!(TargetDescriptor::class("Foo").to_string(), "class Foo");
        assert_eq!(
            TargetDescriptor::member(TargetKind::Method, "index", "Foo").to_string(),
            "method Foo::index()"
        );
        assert_eq!(
            TargetDescriptor::member(TargetKind::Property, "id", "Foo").to_string(),
            "property Foo::$id"
        );
    }

    #[test]
    fn target_kind_serializes_lowercase() {
        let json = serde_json::to_string(&TargetKind::Parameter).unwrap();
        assert_eq!(json, "\"parameter\"");
    }

    #[test]
    fn serde_roundtrip() {
        let r = sample();
        let json = serde_json::to_string(&r).unwrap();
        let back: AttributeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }
}
