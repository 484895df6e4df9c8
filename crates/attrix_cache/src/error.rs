//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur during cache operations.
///
/// Cache operations are fail-safe: the [`RecordStore`](crate::RecordStore)
/// methods turn these errors into misses or `false` after logging them. This
/// enum is used for error propagation within the cache subsystem.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An artifact file has an invalid or missing header.
    #[error("invalid artifact header in {path}: {reason}")]
    InvalidHeader {
        /// The artifact file path.
        path: PathBuf,
        /// Description of the header problem.
        reason: String,
    },

    /// The stored checksum does not match the computed checksum of the payload.
    #[error("checksum mismatch in {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The artifact file path.
        path: PathBuf,
        /// The expected checksum from the header.
        expected: String,
        /// The actual checksum computed from the payload.
        actual: String,
    },

    /// The artifact format version does not match the current version.
    #[error("version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The artifact file path.
        path: PathBuf,
        /// The expected format version.
        expected: u32,
        /// The actual format version found in the file.
        actual: u32,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// A record holds a value that cannot be persisted.
    #[error("cannot persist {kind} argument of {attribute} on {owner}")]
    Unserializable {
        /// The attribute type of the offending record.
        attribute: String,
        /// The owner type of the offending record.
        owner: String,
        /// The kind of the offending value.
        kind: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_io_error() {
        let err = CacheError::Io {
            path: PathBuf::from("/tmp/cache/x.attrs"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(format!("{err}").starts_with("cache I/O error at /tmp/cache/x.attrs"));
    }

    #[test]
    fn display_version_mismatch() {
        let err = CacheError::VersionMismatch {
            path: PathBuf::from("a.attrs"),
            expected: 1,
            actual: 7,
        };
        assert_eq!(
            format!("{err}"),
            "version mismatch in a.attrs: expected 1, got 7"
        );
    }

    #[test]
    fn display_unserializable() {
        let err = CacheError::Unserializable {
            attribute: "App\\Hook".into(),
            owner: "App\\Listener".into(),
            kind: "closure",
        };
        assert_eq!(
            format!("{err}"),
            "cannot persist closure argument of App\\Hook on App\\Listener"
        );
    }
}
