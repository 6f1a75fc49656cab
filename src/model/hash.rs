//! BLAKE3 content digests for stored file data

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte BLAKE3 digest of a file's content
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash([u8; 32]);

impl Hash {
    /// Digest raw file content
    pub fn digest(data: &[u8]) -> Self {
        Hash(*blake3::hash(data).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 12 hex chars, enough to tell revisions apart in a log
    pub fn short(&self) -> String {
        self.to_hex()[..12].to_string()
    }

    /// Check that `data` is what this digest was computed from
    pub fn matches(&self, data: &[u8]) -> bool {
        Hash::digest(data) == *self
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_content_sensitive() {
        assert_eq!(Hash::digest(b"png"), Hash::digest(b"png"));
        assert_ne!(Hash::digest(b"png"), Hash::digest(b"jpg"));
    }

    #[test]
    fn test_matches() {
        let h = Hash::digest(b"image bytes");
        assert!(h.matches(b"image bytes"));
        assert!(!h.matches(b"image bytez"));
        assert_eq!(h.short().len(), 12);
    }
}
