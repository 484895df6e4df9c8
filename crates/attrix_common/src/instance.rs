//! Reconstruction of attribute values from recorded arguments.
//!
//! Discovery only records attribute arguments. Turning a record back into a
//! typed value is opt-in: the caller implements [`FromAttribute`] for every
//! attribute type it wants to reconstruct.

use crate::value::{ArgumentValue, Arguments};

/// Errors raised when reconstructing an attribute.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InstantiateError {
    /// No constructor is registered for the attribute type.
    #[error("attribute type '{0}' is not registered")]
    TypeNotFound(String),

    /// The record is an occurrence of a different attribute type.
    #[error("expected an instance of '{expected}', found '{actual}'")]
    TypeMismatch {
        /// The requested type.
        expected: String,
        /// The recorded attribute type.
        actual: String,
    },

    /// A required argument is missing.
    #[error("missing argument '{name}' for '{type_name}'")]
    MissingArgument {
        /// The attribute type.
        type_name: String,
        /// The parameter name.
        name: String,
    },

    /// An argument has the wrong shape.
    #[error("argument '{name}' for '{type_name}' must be {expected}, found {found}")]
    InvalidArgument {
        /// The attribute type.
        type_name: String,
        /// The parameter name.
        name: String,
        /// The expected shape.
        expected: &'static str,
        /// The shape that was found.
        found: &'static str,
    },
}

/// An attribute type that can be rebuilt from recorded arguments.
pub trait FromAttribute: Sized {
    /// Fully-qualified PHP name of the attribute type.
    const TYPE: &'static str;

    /// Builds the value from the recorded arguments.
    fn from_arguments(args: &Arguments) -> Result<Self, InstantiateError>;
}

/// Typed accessors over [`Arguments`] for [`FromAttribute`] implementations.
///
/// Each accessor looks up a parameter by name, then by positional index.
pub struct ArgumentReader<'a> {
    type_name: &'static str,
    args: &'a Arguments,
}

impl<'a> ArgumentReader<'a> {
    /// Creates a reader for the attribute type `type_name`.
    pub fn new(type_name: &'static str, args: &'a Arguments) -> Self {
        Self { type_name, args }
    }

    /// Returns the raw value of an optional parameter.
    pub fn value(&self, name: &str, index: usize) -> Option<&'a ArgumentValue> {
        self.args.get_named_or_positional(name, index)
    }

    /// Returns a required string parameter.
    pub fn string(&self, name: &str, index: usize) -> Result<String, InstantiateError> {
        match self.value(name, index) {
            Some(ArgumentValue::String(s)) => Ok(s.clone()),
            Some(other) => Err(self.invalid(name, "a string", other)),
            None => Err(self.missing(name)),
        }
    }

    /// Returns an optional string parameter; `null` counts as absent.
    pub fn opt_string(&self, name: &str, index: usize) -> Result<Option<String>, InstantiateError> {
        match self.value(name, index) {
            None | Some(ArgumentValue::Null) => Ok(None),
            Some(ArgumentValue::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.invalid(name, "a string", other)),
        }
    }

    /// Returns an integer parameter, or `default` when absent.
    pub fn int_or(&self, name: &str, index: usize, default: i64) -> Result<i64, InstantiateError> {
        match self.value(name, index) {
            None => Ok(default),
            Some(ArgumentValue::Int(i)) => Ok(*i),
            Some(other) => Err(self.invalid(name, "an integer", other)),
        }
    }

    /// Returns a boolean parameter, or `default` when absent.
    pub fn bool_or(&self, name: &str, index: usize, default: bool) -> Result<bool, InstantiateError> {
        match self.value(name, index) {
            None => Ok(default),
            Some(ArgumentValue::Bool(b)) => Ok(*b),
            Some(other) => Err(self.invalid(name, "a boolean", other)),
        }
    }

    /// Returns a list of strings, or an empty list when absent.
    pub fn strings(&self, name: &str, index: usize) -> Result<Vec<String>, InstantiateError> {
        match self.value(name, index) {
            None => Ok(Vec::new()),
            Some(ArgumentValue::String(s)) => Ok(vec![s.clone()]),
            Some(ArgumentValue::List(items)) => items
                .iter()
                .map(|item| match item {
                    ArgumentValue::String(s) => Ok(s.clone()),
                    other => Err(self.invalid(name, "a list of strings", other)),
                })
                .collect(),
            Some(other) => Err(self.invalid(name, "a list of strings", other)),
        }
    }

    fn missing(&self, name: &str) -> InstantiateError {
        InstantiateError::MissingArgument {
            type_name: self.type_name.to_string(),
            name: name.to_string(),
        }
    }

    fn invalid(&self, name: &str, expected: &'static str, found: &ArgumentValue) -> InstantiateError {
        InstantiateError::InvalidArgument {
            type_name: self.type_name.to_string(),
            name: name.to_string(),
            expected,
            found: found.kind_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Route {
        path: String,
        methods: Vec<String>,
    }

    impl FromAttribute for Route {
        const TYPE: &'static str = "App\\Attribute\\Route";

        fn from_arguments(args: &Arguments) -> Result<Self, InstantiateError> {
            let r = ArgumentReader::new(Self::TYPE, args);
            Ok(Route {
                path: r.string("path", 0)?,
                methods: r.strings("methods", 1)?,
            })
        }
    }

    #[test]
    fn builds_from_positional_and_named() {
        let mut args = Arguments::new();
        args.insert("0", ArgumentValue::String("/x".into()));
        args.insert(
            "methods",
            ArgumentValue::List(vec![ArgumentValue::String("GET".into())]),
        );
        let route = Route::from_arguments(&args).unwrap();
        assert_eq!(
            route,
            Route {
                path: "/x".into(),
                methods: vec!["GET".into()]
            }
        );
    }

    #[test]
    fn missing_required_argument() {
        let err = Route::from_arguments(&Arguments::new()).unwrap_err();
        assert!(matches!(err, InstantiateError::MissingArgument { .. }));
        assert!(err.to_string().contains("path"));
    }

    #[test]
    fn wrong_shape_reports_kinds() {
        let mut args = Arguments::new();
        args.insert("path", ArgumentValue::Int(3));
        let err = Route::from_arguments(&args).unwrap_err();
        assert_eq!(
            err.to_string(),
            "argument 'path' for 'App\\Attribute\\Route' must be a string, found int"
        );
    }
}
