//! Error types for file discovery and attribute extraction.

use std::path::PathBuf;

/// Errors raised by [`AttributeParser::parse_file`](crate::AttributeParser::parse_file).
///
/// Everything else that can go wrong inside a file (unreadable content,
/// syntax errors, unresolvable constructor signatures) degrades to fewer
/// records instead of an error.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// The file does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The file's metadata could not be read.
    #[error("cannot read metadata of {}: {source}", path.display())]
    Io {
        /// The file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl DiscoveryError {
    /// Returns the path the error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            DiscoveryError::FileNotFound { path } | DiscoveryError::Io { path, .. } => path,
        }
    }
}
