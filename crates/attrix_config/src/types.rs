//! Configuration types deserialized from `attrix.toml`.

use indexmap::IndexMap;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

/// Default glob for the files to scan.
pub const DEFAULT_PATHS: &str = "src/**/*.php";
/// Default exclusion glob.
pub const DEFAULT_EXCLUDE: &str = "vendor/**";
/// Default cache directory, relative to the project root.
pub const DEFAULT_CACHE_PATH: &str = "tmp/cache/attributes";
/// Default upper bound on the size of a scanned file, in bytes.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// The top-level configuration parsed from `attrix.toml`.
///
/// Every section is optional; a missing file section takes its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttrixConfig {
    /// Cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// File discovery settings.
    #[serde(default)]
    pub scanner: ScannerConfig,
    /// Plugins whose roots are scanned after the application root.
    #[serde(default)]
    pub plugins: Vec<PluginConfig>,
}

/// Cache settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether discovered records are persisted at all.
    pub enabled: bool,
    /// Re-hash source files when loading a cached set and reject stale sets.
    pub validate_files: bool,
    /// Cache directory, relative to the project root unless absolute.
    pub path: String,
    /// Which store implementation is used.
    pub engine: CacheEngine,
    /// Blob backend for the `backend` engine.
    pub backend: BackendKind,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            validate_files: false,
            path: DEFAULT_CACHE_PATH.to_string(),
            engine: CacheEngine::default(),
            backend: BackendKind::default(),
        }
    }
}

/// Record store implementation.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheEngine {
    /// Self-validating artifact files with an in-process layer (default).
    #[default]
    Compiled,
    /// Encoded blobs stored through a generic byte backend.
    Backend,
}

/// Byte backend used by the `backend` cache engine.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One file per key under the cache directory (default).
    #[default]
    File,
    /// Process memory; nothing survives the process.
    Memory,
}

/// File discovery settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Glob patterns of files to scan, relative to each base path.
    ///
    /// Accepts either a single string or a list of strings.
    #[serde(deserialize_with = "deserialize_string_or_vec")]
    pub paths: Vec<String>,
    /// Glob patterns of files to skip.
    #[serde(deserialize_with = "deserialize_string_or_vec")]
    pub exclude_paths: Vec<String>,
    /// Attribute type names to drop: exact names or `Namespace\*` prefixes.
    #[serde(deserialize_with = "deserialize_string_or_vec")]
    pub exclude_attributes: Vec<String>,
    /// Files larger than this many bytes are never parsed.
    pub max_file_size: u64,
    /// PSR-4 namespace prefix to directory map used to find attribute
    /// constructor signatures outside the scanned file.
    pub autoload: IndexMap<String, String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            paths: vec![DEFAULT_PATHS.to_string()],
            exclude_paths: vec![DEFAULT_EXCLUDE.to_string()],
            exclude_attributes: Vec::new(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            autoload: IndexMap::new(),
        }
    }
}

/// A plugin with its own source root.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PluginConfig {
    /// The plugin name attached to every record found under its root.
    pub name: String,
    /// Plugin root, relative to the project root unless absolute.
    pub path: String,
}

/// Deserializes a field that can be either a single string or a list of strings.
///
/// Allows `paths = "src/**/*.php"` as well as `paths = ["src/**/*.php", "lib/*.php"]`.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn cache_engine_variants() {
        let config = load_config_from_str("[cache]\nengine = \"backend\"\nbackend = \"memory\"").unwrap();
        assert_eq!(config.cache.engine, CacheEngine::Backend);
        assert_eq!(config.cache.backend, BackendKind::Memory);
        let config = load_config_from_str("[cache]\nengine = \"compiled\"").unwrap();
        assert_eq!(config.cache.engine, CacheEngine::Compiled);
        assert_eq!(config.cache.backend, BackendKind::File);
    }

    #[test]
    fn unknown_engine_is_rejected() {
        assert!(load_config_from_str("[cache]\nengine = \"redis\"").is_err());
    }

    #[test]
    fn paths_single_string() {
        let config = load_config_from_str("[scanner]\npaths = \"lib/*.php\"").unwrap();
        assert_eq!(config.scanner.paths, vec!["lib/*.php"]);
        assert_eq!(config.scanner.exclude_paths, vec![DEFAULT_EXCLUDE]);
    }

    #[test]
    fn paths_list() {
        let config =
            load_config_from_str("[scanner]\npaths = [\"src/**/*.php\", \"lib/*.php\"]").unwrap();
        assert_eq!(config.scanner.paths.len(), 2);
    }

    #[test]
    fn autoload_keeps_declaration_order() {
        let toml = r#"
[scanner.autoload]
"App\\" = "src/"
"Lib\\" = "lib/"
"Acme\\Tools\\" = "vendor/acme/tools/src"
"#;
        let config = load_config_from_str(toml).unwrap();
        let prefixes: Vec<&str> = config.scanner.autoload.keys().map(String::as_str).collect();
        assert_eq!(prefixes, vec!["App\\", "Lib\\", "Acme\\Tools\\"]);
    }

    #[test]
    fn defaults() {
        let config = AttrixConfig::default();
        assert!(config.cache.enabled);
        assert!(!config.cache.validate_files);
        assert_eq!(config.cache.path, DEFAULT_CACHE_PATH);
        assert_eq!(config.scanner.paths, vec![DEFAULT_PATHS]);
        assert_eq!(config.scanner.max_file_size, 1_048_576);
        assert!(config.scanner.exclude_attributes.is_empty());
        assert!(config.plugins.is_empty());
    }
}
