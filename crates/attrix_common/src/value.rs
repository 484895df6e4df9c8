//! Attribute argument values extracted from constant expressions.
//!
//! Values are restricted to what a PHP attribute argument can hold as a constant
//! expression: scalars, arrays, enum case references, and nested `new` value
//! objects. Expressions that cannot be reduced statically are kept as
//! [`ArgumentValue::Closure`] or [`ArgumentValue::Opaque`] so that callers can
//! see them, but they are never written to a cache.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single attribute argument value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ArgumentValue {
    /// `null`.
    Null,
    /// `true` / `false`.
    Bool(bool),
    /// An integer literal.
    Int(i64),
    /// A float literal, including `NAN` and `INF` constants.
    Float(f64),
    /// A string literal, with escapes already decoded.
    String(String),
    /// An array whose keys are exactly `0..n`.
    List(Vec<ArgumentValue>),
    /// An array with explicit keys. Integer keys are stored in decimal form.
    Map(IndexMap<String, ArgumentValue>),
    /// A `Type::NAME` reference, most commonly an enum case.
    EnumCase {
        /// Fully-qualified name of the enum (or class) type.
        enum_type: String,
        /// The case or constant name.
        case: String,
    },
    /// A `new Type(...)` value object.
    Object {
        /// Fully-qualified class name.
        class: String,
        /// Constructor arguments.
        arguments: Arguments,
    },
    /// A closure or arrow function. Not serializable.
    Closure {
        /// The closure source text.
        source: String,
    },
    /// Any other expression that cannot be evaluated statically. Not serializable.
    Opaque {
        /// The expression source text.
        expression: String,
    },
}

impl ArgumentValue {
    /// Returns `true` if this value and every nested value can be persisted.
    pub fn is_serializable(&self) -> bool {
        self.find_unserializable().is_none()
    }

    /// Returns the first non-serializable value found in a depth-first walk.
    pub fn find_unserializable(&self) -> Option<&ArgumentValue> {
        match self {
            ArgumentValue::Closure { .. } | ArgumentValue::Opaque { .. } => Some(self),
            ArgumentValue::List(items) => items.iter().find_map(|v| v.find_unserializable()),
            ArgumentValue::Map(entries) => entries.values().find_map(|v| v.find_unserializable()),
            ArgumentValue::Object { arguments, .. } => arguments.find_unserializable(),
            _ => None,
        }
    }

    /// Short name of the value shape, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ArgumentValue::Null => "null",
            ArgumentValue::Bool(_) => "bool",
            ArgumentValue::Int(_) => "int",
            ArgumentValue::Float(_) => "float",
            ArgumentValue::String(_) => "string",
            ArgumentValue::List(_) => "list",
            ArgumentValue::Map(_) => "map",
            ArgumentValue::EnumCase { .. } => "enum case",
            ArgumentValue::Object { .. } => "object",
            ArgumentValue::Closure { .. } => "closure",
            ArgumentValue::Opaque { .. } => "expression",
        }
    }

    /// Returns the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgumentValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgumentValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the float payload. Integers are widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ArgumentValue::Float(f) => Some(*f),
            ArgumentValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the boolean payload, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgumentValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the items of a list.
    pub fn as_list(&self) -> Option<&[ArgumentValue]> {
        match self {
            ArgumentValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns `true` for `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, ArgumentValue::Null)
    }
}

impl PartialEq for ArgumentValue {
    fn eq(&self, other: &Self) -> bool {
        use ArgumentValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            // NaN compares equal to NaN so that cached values round-trip.
            (Float(a), Float(b)) => a.to_bits() == b.to_bits() || a == b,
            (String(a), String(b)) => a == b,
            (List(a), List(b)) => a == b,
            (Map(a), Map(b)) => a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y),
            (
                EnumCase {
                    enum_type: ta,
                    case: ca,
                },
                EnumCase {
                    enum_type: tb,
                    case: cb,
                },
            ) => ta == tb && ca == cb,
            (
                Object {
                    class: ca,
                    arguments: aa,
                },
                Object {
                    class: cb,
                    arguments: ab,
                },
            ) => ca == cb && aa == ab,
            (Closure { source: a }, Closure { source: b }) => a == b,
            (Opaque { expression: a }, Opaque { expression: b }) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for ArgumentValue {
    /// Renders the value in PHP literal notation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentValue::Null => write!(f, "null"),
            ArgumentValue::Bool(b) => write!(f, "{b}"),
            ArgumentValue::Int(i) => write!(f, "{i}"),
            ArgumentValue::Float(v) if v.is_nan() => write!(f, "NAN"),
            ArgumentValue::Float(v) if v.is_infinite() => {
                write!(f, "{}INF", if *v < 0.0 { "-" } else { "" })
            }
            ArgumentValue::Float(v) => write!(f, "{v:?}"),
            ArgumentValue::String(s) => write_quoted(f, s),
            ArgumentValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            ArgumentValue::Map(entries) => {
                write!(f, "[")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_quoted(f, key)?;
                    write!(f, " => {value}")?;
                }
                write!(f, "]")
            }
            ArgumentValue::EnumCase { enum_type, case } => write!(f, "\\{enum_type}::{case}"),
            ArgumentValue::Object { class, arguments } => {
                write!(f, "new \\{class}({arguments})")
            }
            ArgumentValue::Closure { source } => write!(f, "{source}"),
            ArgumentValue::Opaque { expression } => write!(f, "{expression}"),
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "'")?;
    for ch in s.chars() {
        match ch {
            '\'' => write!(f, "\\'")?,
            '\\' => write!(f, "\\\\")?,
            _ => write!(f, "{ch}")?,
        }
    }
    write!(f, "'")
}

/// Ordered mapping from parameter name to value.
///
/// Keys are parameter names when the attribute constructor is known and
/// positional indexes (`"0"`, `"1"`, ...) otherwise. Insertion order is the
/// order of the arguments in source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arguments(IndexMap<String, ArgumentValue>);

impl Arguments {
    /// Creates an empty argument map.
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Inserts an argument, replacing any previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: ArgumentValue) {
        self.0.insert(key.into(), value);
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&ArgumentValue> {
        self.0.get(key)
    }

    /// Looks up an argument by parameter name, falling back to its positional index.
    pub fn get_named_or_positional(&self, name: &str, index: usize) -> Option<&ArgumentValue> {
        self.0
            .get(name)
            .or_else(|| self.0.get(index.to_string().as_str()))
    }

    /// Returns the number of arguments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates arguments in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgumentValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the first non-serializable value among all arguments.
    pub fn find_unserializable(&self) -> Option<&ArgumentValue> {
        self.0.values().find_map(|v| v.find_unserializable())
    }
}

impl FromIterator<(String, ArgumentValue)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (String, ArgumentValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Arguments {
    /// Renders arguments as a PHP named-argument list.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if key.bytes().all(|b| b.is_ascii_digit()) {
                write!(f, "{value}")?;
            } else {
                write!(f, "{key}: {value}")?;
            }
        }
        Ok(())
    }
}
