//! Generic byte backends and the record store layered over them.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use attrix_common::AttributeRecord;
use tracing::{debug, warn};

use crate::artifact::{
    artifact_path, check_serializable, decode_records, encode_records, write_atomic,
};
use crate::store::{records_are_fresh, RecordStore, StoreOptions};

const BLOB_EXTENSION: &str = "blob";

/// A keyed byte store.
pub trait CacheBackend {
    /// Returns the bytes under `key`.
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    /// Stores `bytes` under `key`.
    fn set(&mut self, key: &str, bytes: &[u8]) -> bool;
    /// Removes `key`. Removing a missing key succeeds.
    fn delete(&mut self, key: &str) -> bool;
    /// Removes every key.
    fn clear(&mut self) -> bool;
}

/// Keeps entries in process memory only.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, bytes: &[u8]) -> bool {
        self.entries.insert(key.to_string(), bytes.to_vec());
        true
    }

    fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key);
        true
    }

    fn clear(&mut self) -> bool {
        self.entries.clear();
        true
    }
}

/// Keeps one file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Creates a backend rooted at `dir`. The directory is created on the
    /// first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        artifact_path(&self.dir, key, BLOB_EXTENSION)
    }
}

impl CacheBackend for FileBackend {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => Some(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                debug!(key, error = %err, "failed to read cache entry");
                None
            }
        }
    }

    fn set(&mut self, key: &str, bytes: &[u8]) -> bool {
        match write_atomic(&self.path_for(key), bytes) {
            Ok(()) => true,
            Err(err) => {
                warn!(key, error = %err, "failed to write cache entry");
                false
            }
        }
    }

    fn delete(&mut self, key: &str) -> bool {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => true,
            Err(err) => err.kind() == ErrorKind::NotFound,
        }
    }

    fn clear(&mut self) -> bool {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => return err.kind() == ErrorKind::NotFound,
        };
        let mut cleared = true;
        for path in entries.flatten().map(|e| e.path()) {
            if path.extension().and_then(|e| e.to_str()) != Some(BLOB_EXTENSION) {
                continue;
            }
            if let Err(err) = std::fs::remove_file(&path) {
                warn!(path = %path.display(), error = %err, "failed to remove cache entry");
                cleared = false;
            }
        }
        cleared
    }
}

/// Record store that serializes record sets into a [`CacheBackend`].
#[derive(Debug)]
pub struct AttributeCache<B> {
    backend: B,
    options: StoreOptions,
}

impl<B: CacheBackend> AttributeCache<B> {
    /// Wraps `backend`.
    pub fn new(backend: B, options: StoreOptions) -> Self {
        Self { backend, options }
    }

    /// Returns the wrapped backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: CacheBackend> RecordStore for AttributeCache<B> {
    fn get(&mut self, key: &str) -> Option<Vec<AttributeRecord>> {
        if !self.options.enabled {
            return None;
        }
        let bytes = self.backend.get(key)?;
        let records = match decode_records(&bytes) {
            Ok(records) => records,
            Err(err) => {
                debug!(key, error = %err, "discarding undecodable cache entry");
                return None;
            }
        };
        if self.options.validate_files && !records_are_fresh(&records) {
            debug!(key, "discarding stale cache entry");
            return None;
        }
        Some(records)
    }

    fn set(&mut self, key: &str, records: &[AttributeRecord]) -> bool {
        if !self.options.enabled {
            return false;
        }
        let encoded = check_serializable(records).and_then(|()| encode_records(records));
        match encoded {
            Ok(bytes) => self.backend.set(key, &bytes),
            Err(err) => {
                warn!(key, error = %err, "refusing to cache attributes");
                false
            }
        }
    }

    fn delete(&mut self, key: &str) -> bool {
        self.backend.delete(key)
    }

    fn clear(&mut self) -> bool {
        self.backend.clear()
    }

    fn is_enabled(&self) -> bool {
        self.options.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrix_common::{ArgumentValue, Arguments, ContentHash, TargetDescriptor, TargetKind};
    use std::path::Path;

    fn record(path: &Path, hash: String) -> AttributeRecord {
        let mut arguments = Arguments::new();
        arguments.insert("name", ArgumentValue::String("users".into()));
        arguments.insert("0", ArgumentValue::Float(f64::NAN));
        AttributeRecord {
            owner_type: "App\\UserController".into(),
            attribute_type: "App\\Route".into(),
            arguments,
            source_file: path.to_path_buf(),
            line_number: 12,
            target: TargetDescriptor::member(TargetKind::Method, "index", "UserController"),
            file_modified_at: 1_700_000_000,
            file_content_hash: hash,
            owning_plugin_name: Some("Blog".into()),
        }
    }

    fn enabled() -> StoreOptions {
        StoreOptions {
            enabled: true,
            validate_files: false,
        }
    }

    #[test]
    fn memory_backend_round_trip() {
        let mut cache = AttributeCache::new(MemoryBackend::new(), enabled());
        let records = vec![record(Path::new("/src/UserController.php"), String::new())];
        assert!(cache.set("k", &records));
        assert_eq!(cache.get("k"), Some(records));
        assert!(cache.delete("k"));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn file_backend_survives_a_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![record(Path::new("/src/UserController.php"), String::new())];
        let mut first = AttributeCache::new(FileBackend::new(dir.path().join("c")), enabled());
        assert!(first.set("k", &records));

        let mut second = AttributeCache::new(FileBackend::new(dir.path().join("c")), enabled());
        assert_eq!(second.get("k"), Some(records));
        assert!(second.clear());
        assert_eq!(second.get("k"), None);
    }

    #[test]
    fn file_backend_clear_without_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FileBackend::new(dir.path().join("absent"));
        assert!(backend.clear());
        assert!(backend.delete("k"));
        assert_eq!(backend.get("k"), None);
    }

    #[test]
    fn undecodable_bytes_are_a_miss() {
        let mut backend = MemoryBackend::new();
        backend.set("k", b"\xff\xff\xff");
        let mut cache = AttributeCache::new(backend, enabled());
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn disabled_store_refuses() {
        let mut cache = AttributeCache::new(
            MemoryBackend::new(),
            StoreOptions {
                enabled: false,
                validate_files: false,
            },
        );
        assert!(!cache.set("k", &[]));
        assert!(cache.backend().get("k").is_none());
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn closures_are_not_stored() {
        let mut bad = record(Path::new("/src/A.php"), String::new());
        bad.arguments.insert(
            "handler",
            ArgumentValue::Closure {
                source: "function () {}".into(),
            },
        );
        let mut cache = AttributeCache::new(MemoryBackend::new(), enabled());
        assert!(!cache.set("k", &[bad]));
        assert!(cache.backend().get("k").is_none());
    }

    #[test]
    fn validation_rejects_changed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("UserController.php");
        std::fs::write(&path, "<?php // v1").unwrap();
        let hash = ContentHash::of_bytes(b"<?php // v1").to_hex();
        let mut cache = AttributeCache::new(
            MemoryBackend::new(),
            StoreOptions {
                enabled: true,
                validate_files: true,
            },
        );
        assert!(cache.set("k", &[record(&path, hash)]));
        assert!(cache.get("k").is_some());
        std::fs::write(&path, "<?php // v2").unwrap();
        assert_eq!(cache.get("k"), None);
    }
}
