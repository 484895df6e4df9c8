//! Source file representation with line-start indexing for line lookup.

use attrix_common::ContentHash;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Errors raised while loading a source file from disk.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The path does not exist.
    #[error("file not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The file's metadata (modification time) could not be read.
    #[error("cannot read metadata of {}: {source}", path.display())]
    Metadata {
        /// The file path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file content could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// The file path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file content is not valid UTF-8.
    #[error("{} is not valid UTF-8", path.display())]
    NotUtf8 {
        /// The file path.
        path: PathBuf,
    },
}

/// A PHP source file loaded for parsing.
///
/// Stores the file's content along with precomputed line-start offsets, the
/// content hash and the modification time observed when the file was read.
pub struct SourceFile {
    /// The filesystem path of this file.
    pub path: PathBuf,
    /// The full text content of the file.
    pub content: String,
    /// Hash of the raw file bytes.
    pub content_hash: ContentHash,
    /// Modification time in unix seconds.
    pub modified_at: i64,
    /// Byte offsets of each line start (the first entry is always 0).
    line_starts: Vec<u32>,
}

impl SourceFile {
    /// Reads a file from disk.
    ///
    /// The modification time is read before the content, so a file modified
    /// while it is being read is detected as stale on the next validation.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let modified_at = mtime_seconds(path).map_err(|e| LoadError::Metadata {
            path: path.to_path_buf(),
            source: e,
        })?;
        let bytes = std::fs::read(path).map_err(|e| LoadError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let content_hash = ContentHash::of_bytes(&bytes);
        let content = String::from_utf8(bytes).map_err(|_| LoadError::NotUtf8 {
            path: path.to_path_buf(),
        })?;
        Ok(Self::with_metadata(
            path.to_path_buf(),
            content,
            content_hash,
            modified_at,
        ))
    }

    /// Creates an in-memory source file. The hash is computed from `content`.
    pub fn from_text(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let content = content.into();
        let content_hash = ContentHash::of_bytes(content.as_bytes());
        Self::with_metadata(path.into(), content, content_hash, 0)
    }

    fn with_metadata(
        path: PathBuf,
        content: String,
        content_hash: ContentHash,
        modified_at: i64,
    ) -> Self {
        let line_starts = compute_line_starts(&content);
        Self {
            path,
            content,
            content_hash,
            modified_at,
            line_starts,
        }
    }

    /// Converts a byte offset into a 1-based line number.
    pub fn line_of(&self, byte_offset: u32) -> u32 {
        let line_idx = match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        line_idx as u32 + 1
    }

    /// Returns the number of lines in the file.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Returns the modification time of `path` in whole unix seconds.
///
/// Times before the epoch are reported as negative values.
pub fn mtime_seconds(path: &Path) -> std::io::Result<i64> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(match modified.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    })
}

/// Computes the byte offsets of each line start in the given content.
fn compute_line_starts(content: &str) -> Vec<u32> {
    let mut starts = vec![0u32];
    for (i, byte) in content.bytes().enumerate() {
        if byte == b'\n' {
            starts.push((i + 1) as u32);
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_lookup() {
        let f = SourceFile::from_text("a.php", "abc\ndef\nghi");
        assert_eq!(f.line_count(), 3);
        assert_eq!(f.line_of(0), 1);
        assert_eq!(f.line_of(3), 1);
        assert_eq!(f.line_of(4), 2);
        assert_eq!(f.line_of(9), 3);
    }

    #[test]
    fn empty_file() {
        let f = SourceFile::from_text("a.php", "");
        assert_eq!(f.line_count(), 1);
        assert_eq!(f.line_of(0), 1);
    }

    #[test]
    fn load_reads_hash_and_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("A.php");
        std::fs::write(&path, "<?php\nclass A {}\n").unwrap();

        let f = SourceFile::load(&path).unwrap();
        assert_eq!(f.content_hash, ContentHash::of_bytes(b"<?php\nclass A {}\n"));
        assert_eq!(f.modified_at, mtime_seconds(&path).unwrap());
        assert!(f.modified_at > 0);
    }

    #[test]
    fn load_missing_file() {
        let err = SourceFile::load(Path::new("/nonexistent/A.php")).err().unwrap();
        assert!(matches!(err, LoadError::NotFound { .. }));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn load_rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.php");
        std::fs::write(&path, [0xffu8, 0xfe, 0x00]).unwrap();
        let err = SourceFile::load(&path).err().unwrap();
        assert!(matches!(err, LoadError::NotUtf8 { .. }));
    }
}
