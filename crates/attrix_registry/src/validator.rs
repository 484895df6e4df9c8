//! Modification-time verification of a discovered set.

use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::Path;

use attrix_common::AttributeRecord;
use attrix_source::mtime_seconds;

/// Outcome of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    /// `true` when no record produced an error.
    pub valid: bool,
    /// One message per failing record, in record order.
    pub errors: Vec<String>,
    /// Number of records checked.
    pub total_attributes: usize,
    /// Number of distinct source files.
    pub total_files: usize,
}

#[derive(Clone, Copy)]
enum FileState {
    Missing,
    Modified(Option<i64>),
}

/// Checks every record's source file against the modification time recorded
/// at scan time. All records are checked; nothing short-circuits.
pub fn validate(records: &[AttributeRecord]) -> ValidationResult {
    let mut states: HashMap<&Path, FileState> = HashMap::new();
    let mut errors = Vec::new();
    for record in records {
        let path = record.source_file.as_path();
        let state = *states.entry(path).or_insert_with(|| match mtime_seconds(path) {
            Ok(mtime) => FileState::Modified(Some(mtime)),
            Err(err) if err.kind() == ErrorKind::NotFound => FileState::Missing,
            Err(_) => FileState::Modified(None),
        });
        match state {
            FileState::Missing => errors.push(format!("File not found: {}", path.display())),
            FileState::Modified(Some(mtime)) if mtime == record.file_modified_at => {}
            FileState::Modified(_) => errors.push(format!("File modified: {}", path.display())),
        }
    }
    let total_files = records
        .iter()
        .map(|r| r.source_file.as_path())
        .collect::<HashSet<_>>()
        .len();
    ValidationResult {
        valid: errors.is_empty(),
        errors,
        total_attributes: records.len(),
        total_files,
    }
}
