//! The keyed record store contract and the helpers shared by its implementations.

use std::collections::HashMap;
use std::path::Path;

use attrix_common::{AttributeRecord, ContentHash};
use attrix_config::{resolve_cache_dir, AttrixConfig, BackendKind, CacheEngine};
use tracing::debug;

use crate::backend::{AttributeCache, FileBackend, MemoryBackend};
use crate::compiled::CompiledCache;

/// A keyed store of record sets.
///
/// Every operation is fail-safe: problems are logged and reported as a miss
/// or `false`, never as an error.
pub trait RecordStore {
    /// Returns the records stored under `key`, or `None` on a miss. A disabled
    /// store always misses; a stale or corrupt entry is a miss.
    fn get(&mut self, key: &str) -> Option<Vec<AttributeRecord>>;

    /// Stores `records` under `key`. Returns `false` without side effects when
    /// the store is disabled or a record cannot be persisted.
    fn set(&mut self, key: &str, records: &[AttributeRecord]) -> bool;

    /// Removes the entry under `key`. Returns `true` if it is gone afterwards.
    fn delete(&mut self, key: &str) -> bool;

    /// Removes every entry. Returns `true` if the store is empty afterwards.
    fn clear(&mut self) -> bool;

    /// Returns `true` if the store persists anything at all.
    fn is_enabled(&self) -> bool;
}

/// Behavior switches shared by the store implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// When `false`, `get` always misses and `set` always refuses.
    pub enabled: bool,
    /// Re-hash the source files of a loaded set and reject it if any changed.
    pub validate_files: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            validate_files: false,
        }
    }
}

/// Returns `true` if every record's source file still has the content hash
/// recorded at scan time.
///
/// Records with an empty hash are exempt. Each file is hashed at most once.
/// A missing or unreadable file rejects the whole set.
pub fn records_are_fresh(records: &[AttributeRecord]) -> bool {
    let mut hashes: HashMap<&Path, Option<String>> = HashMap::new();
    for record in records {
        if record.file_content_hash.is_empty() {
            continue;
        }
        let current = hashes
            .entry(record.source_file.as_path())
            .or_insert_with(|| {
                std::fs::read(&record.source_file)
                    .ok()
                    .map(|bytes| ContentHash::of_bytes(&bytes).to_hex())
            });
        match current {
            Some(hash) if *hash == record.file_content_hash => {}
            Some(_) => {
                debug!(path = %record.source_file.display(), "cached source file changed");
                return false;
            }
            None => {
                debug!(path = %record.source_file.display(), "cached source file is gone");
                return false;
            }
        }
    }
    true
}

/// Opens the record store selected by the configuration.
pub fn open_store(config: &AttrixConfig, project_root: &Path) -> Box<dyn RecordStore + Send> {
    let options = StoreOptions {
        enabled: config.cache.enabled,
        validate_files: config.cache.validate_files,
    };
    let dir = resolve_cache_dir(config, project_root);
    match (config.cache.engine, config.cache.backend) {
        (CacheEngine::Compiled, _) => Box::new(CompiledCache::new(dir, options)),
        (CacheEngine::Backend, BackendKind::File) => {
            Box::new(AttributeCache::new(FileBackend::new(dir), options))
        }
        (CacheEngine::Backend, BackendKind::Memory) => {
            Box::new(AttributeCache::new(MemoryBackend::new(), options))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrix_common::{Arguments, TargetDescriptor};
    use attrix_config::load_config_from_str;
    use std::path::PathBuf;

    fn record(path: PathBuf, hash: String) -> AttributeRecord {
        AttributeRecord {
            owner_type: "App\\A".into(),
            attribute_type: "App\\Marker".into(),
            arguments: Arguments::new(),
            source_file: path,
            line_number: 3,
            target: TargetDescriptor::class("A"),
            file_modified_at: 0,
            file_content_hash: hash,
            owning_plugin_name: None,
        }
    }

    #[test]
    fn freshness_follows_file_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("A.php");
        std::fs::write(&path, "<?php class A {}").unwrap();
        let hash = ContentHash::of_bytes(b"<?php class A {}").to_hex();
        let records = vec![record(path.clone(), hash.clone()), record(path.clone(), hash)];
        assert!(records_are_fresh(&records));

        std::fs::write(&path, "<?php class B {}").unwrap();
        assert!(!records_are_fresh(&records));

        std::fs::remove_file(&path).unwrap();
        assert!(!records_are_fresh(&records));
    }

    #[test]
    fn empty_hash_is_exempt() {
        let records = vec![record(PathBuf::from("/nowhere/A.php"), String::new())];
        assert!(records_are_fresh(&records));
        assert!(records_are_fresh(&[]));
    }

    #[test]
    fn open_store_follows_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let disabled = load_config_from_str("[cache]\nenabled = false").unwrap();
        assert!(!open_store(&disabled, dir.path()).is_enabled());

        let memory =
            load_config_from_str("[cache]\nengine = \"backend\"\nbackend = \"memory\"").unwrap();
        let mut store = open_store(&memory, dir.path());
        assert!(store.set("k", &[]));
        assert_eq!(store.get("k"), Some(Vec::new()));
        assert!(!dir.path().join("tmp").exists());

        let compiled = load_config_from_str("").unwrap();
        let mut store = open_store(&compiled, dir.path());
        assert!(store.set("k", &[]));
        assert!(dir.path().join("tmp/cache/attributes").is_dir());
    }
}
