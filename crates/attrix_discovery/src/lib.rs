//! File discovery and attribute extraction.
//!
//! [`path_resolver`] expands glob patterns into files, [`AttributeParser`]
//! turns one file into attribute records, and [`AttributeScanner`] ties both
//! together over every configured base path.

#![warn(missing_docs)]

pub mod attribute_parser;
pub mod base_paths;
pub mod error;
pub mod path_resolver;
pub mod scanner;

pub use attribute_parser::{AttributeParser, FileReport};
pub use base_paths::BasePaths;
pub use error::DiscoveryError;
pub use path_resolver::{resolve_all, MAX_WALK_DEPTH};
pub use scanner::{AttributeScanner, ScanStats};
