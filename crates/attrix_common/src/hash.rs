//! Content hashing for cache invalidation and staleness detection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 64-bit content hash computed using XXH3.
///
/// Two files with the same `ContentHash` are assumed to have identical content.
/// Records store the hash in its hex form so that cached entries can be checked
/// against the current bytes of their source file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(u64);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-64.
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_64(data))
    }

    /// Parses a hash from its 16-digit lower-case hex form.
    ///
    /// Returns `None` for anything that is not exactly 16 hex digits.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 16 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u64::from_str_radix(hex, 16).ok().map(Self)
    }

    /// Returns the hex form used in records and artifact file names.
    pub fn to_hex(self) -> String {
        format!("{:016x}", self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:08x}..)", self.0 >> 32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = ContentHash::of_bytes(b"<?php class A {}");
        let b = ContentHash::of_bytes(b"<?php class A {}");
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_differ() {
        let a = ContentHash::of_bytes(b"hello");
        let b = ContentHash::of_bytes(b"world");
        assert_ne!(a, b);
    }

    #[test]
    fn hex_is_fixed_width() {
        let h = ContentHash::of_bytes(b"");
        let s = h.to_hex();
        assert_eq!(s.len(), 16);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(s, format!("{h}"));
    }

    #[test]
    fn hex_parse_roundtrip() {
        let h = ContentHash::of_bytes(b"roundtrip");
        assert_eq!(ContentHash::from_hex(&h.to_hex()), Some(h));
    }

    #[test]
    fn hex_parse_rejects_garbage() {
        assert!(ContentHash::from_hex("").is_none());
        assert!(ContentHash::from_hex("abc").is_none());
        assert!(ContentHash::from_hex("zzzzzzzzzzzzzzzz").is_none());
    }

    #[test]
    fn debug_abbreviated() {
        let h = ContentHash::of_bytes(b"test");
        let s = format!("{h:?}");
        assert!(s.starts_with("ContentHash("));
        assert!(s.ends_with("..)"));
    }
}
