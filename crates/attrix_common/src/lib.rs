//! Shared foundational types used across the attrix workspace.
//!
//! This crate provides the attribute record model, argument values, content
//! hashing, namespace name patterns, and the opt-in instantiation contract.

#![warn(missing_docs)]

pub mod hash;
pub mod instance;
pub mod pattern;
pub mod record;
pub mod value;

pub use hash::ContentHash;
pub use instance::{ArgumentReader, FromAttribute, InstantiateError};
pub use pattern::NamePattern;
pub use record::{short_name, AttributeRecord, ParseTargetKindError, TargetDescriptor, TargetKind};
pub use value::{ArgumentValue, Arguments};
