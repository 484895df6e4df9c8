//! Resolution of configured relative paths against the project root.

use crate::types::AttrixConfig;
use std::path::{Path, PathBuf};

/// A directory that configured glob patterns are anchored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasePath {
    /// The directory.
    pub root: PathBuf,
    /// The plugin owning the directory, `None` for the application root.
    pub plugin: Option<String>,
}

impl BasePath {
    /// The application root.
    pub fn app(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            plugin: None,
        }
    }

    /// A plugin root.
    pub fn plugin(root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            plugin: Some(name.into()),
        }
    }
}

/// A PSR-4 autoload mapping with its directory resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoloadRoot {
    /// Namespace prefix without a leading backslash, always ending in `\`.
    pub prefix: String,
    /// The directory the prefix maps to.
    pub dir: PathBuf,
}

/// Returns the base paths to scan: the application root, then every plugin
/// root in declaration order.
pub fn resolve_base_paths(config: &AttrixConfig, project_root: &Path) -> Vec<BasePath> {
    let mut paths = vec![BasePath::app(project_root)];
    paths.extend(
        config
            .plugins
            .iter()
            .map(|p| BasePath::plugin(project_root.join(&p.path), p.name.clone())),
    );
    paths
}

/// Returns the cache directory. Absolute configured paths are kept as is.
pub fn resolve_cache_dir(config: &AttrixConfig, project_root: &Path) -> PathBuf {
    project_root.join(&config.cache.path)
}

/// Returns the autoload map with normalized prefixes and resolved directories.
///
/// Longer prefixes come first so the most specific mapping wins a lookup.
pub fn resolve_autoload(config: &AttrixConfig, project_root: &Path) -> Vec<AutoloadRoot> {
    let mut roots: Vec<AutoloadRoot> = config
        .scanner
        .autoload
        .iter()
        .map(|(prefix, dir)| {
            let mut prefix = prefix.trim_start_matches('\\').to_string();
            if !prefix.is_empty() && !prefix.ends_with('\\') {
                prefix.push('\\');
            }
            AutoloadRoot {
                prefix,
                dir: project_root.join(dir),
            }
        })
        .collect();
    roots.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
    roots
}
