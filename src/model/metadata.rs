//! File metadata - the small record kept alongside every stored file

use serde::{Deserialize, Serialize};

/// Metadata of a stored file.
///
/// In the versioned backend there is exactly one of these per
/// (assets root, filepath, version); the flat backend keeps none.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Size of the file, in bytes
    pub size: u64,
}

impl FileMetadata {
    pub fn new(size: u64) -> Self {
        FileMetadata { size }
    }

    pub fn for_content(content: &[u8]) -> Self {
        FileMetadata::new(content.len() as u64)
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}
