//! Parsing and validation of `attrix.toml` configuration files.
//!
//! This crate reads the project configuration file and produces a strongly-typed
//! [`AttrixConfig`] with cache, scanner and plugin settings, and resolves the
//! configured relative paths against the project root.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, load_config_or_default, CONFIG_FILE_NAME};
pub use resolve::{resolve_autoload, resolve_base_paths, resolve_cache_dir, AutoloadRoot, BasePath};
pub use types::*;
