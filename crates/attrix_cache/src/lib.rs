//! Persistent storage for discovered attribute records.
//!
//! The default engine is [`CompiledCache`], which writes one self-validating
//! artifact per key and keeps loaded sets in memory. [`AttributeCache`] stores
//! plain record payloads in any [`CacheBackend`]. Both implement
//! [`RecordStore`], and [`open_store`] picks one from the configuration.

#![warn(missing_docs)]

pub mod artifact;
pub mod backend;
pub mod compiled;
pub mod error;
pub mod store;

pub use backend::{AttributeCache, CacheBackend, FileBackend, MemoryBackend};
pub use compiled::CompiledCache;
pub use error::CacheError;
pub use store::{open_store, records_are_fresh, RecordStore, StoreOptions};
