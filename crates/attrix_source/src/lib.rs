//! Source file loading and span tracking.
//!
//! This crate provides [`SourceFile`], which holds a PHP file's text together
//! with its modification time, content hash and line index, and the [`Span`]
//! type used by the lexer, parser and diagnostics to point back into it.

#![warn(missing_docs)]

pub mod source_file;
pub mod span;

pub use source_file::{mtime_seconds, LoadError, SourceFile};
pub use span::Span;
