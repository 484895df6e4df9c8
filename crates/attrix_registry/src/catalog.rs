//! Dynamic instantiation of attribute records by type name.

use std::any::Any;
use std::collections::HashMap;

use attrix_common::{AttributeRecord, FromAttribute, InstantiateError};

type Constructor = fn(&AttributeRecord) -> Result<Box<dyn Any + Send>, InstantiateError>;

/// Maps attribute type names to constructors of registered
/// [`FromAttribute`] types.
#[derive(Default)]
pub struct AttributeCatalog {
    constructors: HashMap<&'static str, Constructor>,
}

impl AttributeCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under [`FromAttribute::TYPE`], replacing any previous
    /// registration for that name.
    pub fn register<T: FromAttribute + Send + 'static>(&mut self) -> &mut Self {
        self.constructors.insert(T::TYPE, |record| {
            T::from_arguments(&record.arguments).map(|v| Box::new(v) as Box<dyn Any + Send>)
        });
        self
    }

    /// Returns `true` if a constructor is registered for `type_name`.
    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name.trim_start_matches('\\'))
    }

    /// Builds the attribute described by `record`.
    ///
    /// Fails with [`InstantiateError::TypeNotFound`] when its type is not
    /// registered, or with the constructor's error.
    pub fn instantiate(&self, record: &AttributeRecord) -> Result<Box<dyn Any + Send>, InstantiateError> {
        let constructor = self
            .constructors
            .get(record.attribute_type.as_str())
            .ok_or_else(|| InstantiateError::TypeNotFound(record.attribute_type.clone()))?;
        constructor(record)
    }

    /// Returns the registered type names, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.constructors.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for AttributeCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeCatalog")
            .field("types", &self.type_names())
            .finish()
    }
}
