//! Record store backed by artifact files with an in-process layer.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use attrix_common::AttributeRecord;
use tracing::{debug, warn};

use crate::artifact::{
    artifact_path, check_serializable, decode_artifact, default_generator, encode_artifact,
    write_atomic, ARTIFACT_EXTENSION,
};
use crate::error::CacheError;
use crate::store::{records_are_fresh, RecordStore, StoreOptions};

/// Persists record sets as self-validating artifact files in one directory.
///
/// Loaded and written sets are also kept in process memory. The memory layer
/// is bypassed while file validation is enabled, so every `get` re-checks the
/// source files.
///
/// Writers never lock: concurrent writers of the same key each replace the
/// artifact atomically and the last one wins.
#[derive(Debug)]
pub struct CompiledCache {
    dir: PathBuf,
    options: StoreOptions,
    generator: String,
    memory: HashMap<String, Vec<AttributeRecord>>,
}

impl CompiledCache {
    /// Creates a cache storing artifacts in `dir`. The directory is created on
    /// the first write.
    pub fn new(dir: impl Into<PathBuf>, options: StoreOptions) -> Self {
        Self {
            dir: dir.into(),
            options,
            generator: default_generator(),
            memory: HashMap::new(),
        }
    }

    /// Overrides the generator recorded in artifact headers.
    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = generator.into();
        self
    }

    /// Returns the cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the artifact path for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        artifact_path(&self.dir, key, ARTIFACT_EXTENSION)
    }

    fn load(&self, key: &str) -> Result<Option<Vec<AttributeRecord>>, CacheError> {
        let path = self.path_for(key);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }),
        };
        decode_artifact(&path, &raw).map(Some)
    }

    fn store(&self, key: &str, records: &[AttributeRecord]) -> Result<(), CacheError> {
        check_serializable(records)?;
        let bytes = encode_artifact(records, &self.generator)?;
        write_atomic(&self.path_for(key), &bytes)
    }

    fn remove_artifacts(&self) -> Result<(), CacheError> {
        let io_err = |path: &Path, source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        };
        let entries = std::fs::read_dir(&self.dir).map_err(|e| io_err(&self.dir, e))?;
        let mut first_error = None;
        for entry in entries {
            let path = entry.map_err(|e| io_err(&self.dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXTENSION) {
                continue;
            }
            if let Err(err) = std::fs::remove_file(&path) {
                if err.kind() != ErrorKind::NotFound && first_error.is_none() {
                    first_error = Some(io_err(&path, err));
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl RecordStore for CompiledCache {
    fn get(&mut self, key: &str) -> Option<Vec<AttributeRecord>> {
        if !self.options.enabled {
            return None;
        }
        if !self.options.validate_files {
            if let Some(records) = self.memory.get(key) {
                debug!(key, "attribute cache hit (memory)");
                return Some(records.clone());
            }
        }
        let records = match self.load(key) {
            Ok(Some(records)) => records,
            Ok(None) => {
                debug!(key, "attribute cache miss");
                return None;
            }
            Err(err) => {
                debug!(key, error = %err, "discarding unreadable cache artifact");
                return None;
            }
        };
        if self.options.validate_files && !records.is_empty() && !records_are_fresh(&records) {
            debug!(key, "discarding stale cache artifact");
            return None;
        }
        debug!(key, records = records.len(), "attribute cache hit");
        self.memory.insert(key.to_string(), records.clone());
        Some(records)
    }

    fn set(&mut self, key: &str, records: &[AttributeRecord]) -> bool {
        if !self.options.enabled {
            return false;
        }
        match self.store(key, records) {
            Ok(()) => {
                self.memory.insert(key.to_string(), records.to_vec());
                true
            }
            Err(err) => {
                warn!(key, error = %err, "failed to write attribute cache");
                false
            }
        }
    }

    fn delete(&mut self, key: &str) -> bool {
        self.memory.remove(key);
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => true,
            Err(err) if err.kind() == ErrorKind::NotFound => true,
            Err(err) => {
                warn!(key, error = %err, "failed to delete attribute cache");
                false
            }
        }
    }

    fn clear(&mut self) -> bool {
        self.memory.clear();
        if !self.dir.exists() {
            return true;
        }
        match self.remove_artifacts() {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "failed to clear attribute cache");
                false
            }
        }
    }

    fn is_enabled(&self) -> bool {
        self.options.enabled
    }
}
