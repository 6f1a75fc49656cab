//! Versioned record store contract
//!
//! Records are kept as an append-only log per `(kind, key)`. Every save and
//! every delete appends a new version; nothing is rewritten in place.

use crate::model::{ChangeEntry, FileMetadata, Hash};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Which of the two parallel histories a record belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    FileMetadata,
    FileData,
}

impl RecordKind {
    pub fn as_byte(&self) -> u8 {
        match self {
            RecordKind::FileMetadata => 0,
            RecordKind::FileData => 1,
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(RecordKind::FileMetadata),
            1 => Some(RecordKind::FileData),
            _ => None,
        }
    }
}

/// Payload of one record version
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RecordBody {
    Metadata(FileMetadata),
    Data { content: Vec<u8>, digest: Hash },
    /// Marks the key as deleted from this version on
    Tombstone,
}

impl RecordBody {
    /// Wrap file content, computing its digest
    pub fn data(content: Vec<u8>) -> Self {
        let digest = Hash::digest(&content);
        RecordBody::Data { content, digest }
    }

    fn label(&self) -> &'static str {
        match self {
            RecordBody::Metadata(_) => "metadata",
            RecordBody::Data { .. } => "data",
            RecordBody::Tombstone => "tombstone",
        }
    }

    fn fits(&self, kind: RecordKind) -> bool {
        matches!(
            (self, kind),
            (RecordBody::Metadata(_), RecordKind::FileMetadata)
                | (RecordBody::Data { .. }, RecordKind::FileData)
        )
    }
}

/// A single version of a record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub kind: RecordKind,
    pub key: String,
    pub version: u64,
    pub body: RecordBody,
    pub change: ChangeEntry,
}

impl Record {
    pub fn is_deleted(&self) -> bool {
        matches!(self.body, RecordBody::Tombstone)
    }

    pub fn metadata(&self) -> Option<&FileMetadata> {
        match &self.body {
            RecordBody::Metadata(m) => Some(m),
            _ => None,
        }
    }

    pub fn content(&self) -> Option<&[u8]> {
        match &self.body {
            RecordBody::Data { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn digest(&self) -> Option<Hash> {
        match &self.body {
            RecordBody::Data { digest, .. } => Some(*digest),
            _ => None,
        }
    }

    pub fn into_content(self) -> Option<Vec<u8>> {
        match self.body {
            RecordBody::Data { content, .. } => Some(content),
            _ => None,
        }
    }
}

/// A transactional, version-aware record store.
///
/// Each individual `commit`/`delete` is atomic; there are no cross-record
/// transactions.
pub trait RecordStore: Send + Sync {
    /// Latest version of a record, `None` if absent or deleted
    fn get(&self, kind: RecordKind, key: &str) -> Result<Option<Record>>;

    /// A specific version, `None` if it never existed or is a deletion marker
    fn get_version(&self, kind: RecordKind, key: &str, version: u64) -> Result<Option<Record>>;

    /// Append a new version and return its number (first version is 1)
    fn commit(&self, kind: RecordKind, key: &str, body: RecordBody, change: ChangeEntry) -> Result<u64>;

    /// Append a deletion marker. Returns `None` if there was nothing live to delete.
    fn delete(&self, kind: RecordKind, key: &str, change: ChangeEntry) -> Result<Option<u64>>;

    /// Keys whose latest version is not deleted, sorted
    fn list_undeleted(&self, kind: RecordKind) -> Result<Vec<String>>;

    /// Every version of a record, oldest first
    fn history(&self, kind: RecordKind, key: &str) -> Result<Vec<Record>>;
}

/// Reject bodies that do not belong in the given history
pub(crate) fn check_body(kind: RecordKind, body: &RecordBody) -> Result<()> {
    if body.fits(kind) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "cannot commit {} payload to {:?} record",
            body.label(),
            kind
        )))
    }
}
