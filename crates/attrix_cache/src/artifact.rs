//! Self-validating binary artifacts holding a record set.
//!
//! An artifact is a 4-byte little-endian header length, a bincode header and
//! a bincode payload of the records. The header carries magic bytes, the
//! format version, provenance and a checksum of the payload, so a truncated,
//! foreign or outdated file is detected before the payload is decoded.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use attrix_common::{AttributeRecord, ContentHash};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CacheError;

/// Magic bytes identifying an attrix cache artifact.
pub const ARTIFACT_MAGIC: [u8; 4] = *b"ATRX";

/// Current artifact format version. Increment on breaking changes to
/// the header or payload format.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// File extension of artifact files.
pub const ARTIFACT_EXTENSION: &str = "attrs";

/// Notice embedded in every artifact header.
pub const GENERATED_NOTICE: &str = "generated file, do not edit";

/// Header prepended to every artifact for validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactHeader {
    /// Magic bytes: must be `b"ATRX"`.
    pub magic: [u8; 4],
    /// Artifact format version.
    pub format_version: u32,
    /// Name and version of the program that wrote the artifact.
    pub generator: String,
    /// Write time in unix seconds.
    pub generated_at: i64,
    /// Number of records in the payload.
    pub record_count: u64,
    /// Human-readable notice.
    pub notice: String,
    /// Content hash of the payload bytes.
    pub checksum: ContentHash,
}

/// Returns the default generator string for this build.
pub fn default_generator() -> String {
    format!("attrix {}", env!("CARGO_PKG_VERSION"))
}

/// Returns the artifact path for `key` under `dir`.
///
/// The file name keeps the key readable (`[A-Za-z0-9_-]` kept, anything else
/// mapped to `_`) and appends the hash of the raw key, so distinct keys never
/// share a file.
pub fn artifact_path(dir: &Path, key: &str, extension: &str) -> PathBuf {
    let readable: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let hash = ContentHash::of_bytes(key.as_bytes());
    dir.join(format!("{readable}_{}.{extension}", hash.to_hex()))
}

/// Fails with [`CacheError::Unserializable`] if any record carries a closure
/// or an unevaluated expression, at any nesting depth.
pub fn check_serializable(records: &[AttributeRecord]) -> Result<(), CacheError> {
    for record in records {
        if let Some(value) = record.arguments.find_unserializable() {
            return Err(CacheError::Unserializable {
                attribute: record.attribute_type.clone(),
                owner: record.owner_type.clone(),
                kind: value.kind_name(),
            });
        }
    }
    Ok(())
}

/// Encodes records into the plain bincode payload used by blobs and artifacts.
pub fn encode_records(records: &[AttributeRecord]) -> Result<Vec<u8>, CacheError> {
    bincode::serde::encode_to_vec(records, bincode::config::standard()).map_err(|e| {
        CacheError::Serialization {
            reason: e.to_string(),
        }
    })
}

/// Decodes a payload written by [`encode_records`]. Trailing bytes are an error.
pub fn decode_records(payload: &[u8]) -> Result<Vec<AttributeRecord>, CacheError> {
    let (records, read): (Vec<AttributeRecord>, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard()).map_err(|e| {
            CacheError::Serialization {
                reason: e.to_string(),
            }
        })?;
    if read != payload.len() {
        return Err(CacheError::Serialization {
            reason: format!("{} trailing bytes after records", payload.len() - read),
        });
    }
    Ok(records)
}

/// Encodes a complete artifact.
pub fn encode_artifact(records: &[AttributeRecord], generator: &str) -> Result<Vec<u8>, CacheError> {
    let payload = encode_records(records)?;
    let header = ArtifactHeader {
        magic: ARTIFACT_MAGIC,
        format_version: ARTIFACT_FORMAT_VERSION,
        generator: generator.to_string(),
        generated_at: unix_now(),
        record_count: records.len() as u64,
        notice: GENERATED_NOTICE.to_string(),
        checksum: ContentHash::of_bytes(&payload),
    };
    let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
        .map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;

    // 4-byte header length (little-endian) + header + payload
    let header_len = header_bytes.len() as u32;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(&payload);
    Ok(output)
}

/// Reads the header of an artifact without validating the payload.
pub fn decode_header(path: &Path, raw: &[u8]) -> Result<(ArtifactHeader, usize), CacheError> {
    let invalid = |reason: &str| CacheError::InvalidHeader {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };
    let len_bytes: [u8; 4] = raw
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| invalid("file too short"))?;
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    let header_end = 4usize
        .checked_add(header_len)
        .filter(|end| *end <= raw.len())
        .ok_or_else(|| invalid("truncated header"))?;
    let (header, _): (ArtifactHeader, usize) =
        bincode::serde::decode_from_slice(&raw[4..header_end], bincode::config::standard())
            .map_err(|e| invalid(&e.to_string()))?;
    if header.magic != ARTIFACT_MAGIC {
        return Err(invalid("bad magic bytes"));
    }
    Ok((header, header_end))
}

/// Validates and decodes a complete artifact.
pub fn decode_artifact(path: &Path, raw: &[u8]) -> Result<Vec<AttributeRecord>, CacheError> {
    let (header, payload_start) = decode_header(path, raw)?;
    if header.format_version != ARTIFACT_FORMAT_VERSION {
        return Err(CacheError::VersionMismatch {
            path: path.to_path_buf(),
            expected: ARTIFACT_FORMAT_VERSION,
            actual: header.format_version,
        });
    }
    let payload = &raw[payload_start..];
    let actual = ContentHash::of_bytes(payload);
    if actual != header.checksum {
        return Err(CacheError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: header.checksum.to_hex(),
            actual: actual.to_hex(),
        });
    }
    let records = decode_records(payload)?;
    if records.len() as u64 != header.record_count {
        return Err(CacheError::InvalidHeader {
            path: path.to_path_buf(),
            reason: format!(
                "header announces {} records, payload holds {}",
                header.record_count,
                records.len()
            ),
        });
    }
    Ok(records)
}

/// Writes `bytes` to `path` atomically.
///
/// The data goes to a temporary file in the same directory, which is then
/// renamed over `path`; readers see either the old or the new content. The
/// temporary file is removed on failure.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    use std::io::Write;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let io_err = |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(|source| CacheError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    temp.write_all(bytes).map_err(io_err)?;
    temp.as_file().sync_all().map_err(io_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o644);
        if let Err(err) = std::fs::set_permissions(temp.path(), perms) {
            warn!(path = %temp.path().display(), error = %err, "cannot set cache file permissions");
        }
    }

    temp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
