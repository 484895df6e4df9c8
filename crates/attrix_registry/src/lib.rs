//! Attribute discovery with caching and in-memory queries.
//!
//! [`AttributeRegistry`] is the entry point: it serves the discovered set from
//! memory, then from the configured record store, and scans the project only
//! when both miss. Results are [`AttributeCollection`] views.

#![warn(missing_docs)]

pub mod catalog;
pub mod collection;
pub mod events;
pub mod global;
pub mod registry;
pub mod validator;

pub use catalog::AttributeCatalog;
pub use collection::AttributeCollection;
pub use events::{DiscoveryEvent, DiscoveryObserver, EventLog};
pub use registry::{AttributeRegistry, WarmReport, REGISTRY_KEY};
pub use validator::{validate, ValidationResult};
