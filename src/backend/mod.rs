//! Storage backends
//!
//! Two variants share one contract but disagree on history: the versioned
//! backend keeps every write, the flat backend keeps only the current
//! object. [`Backend`] is the sum of the two; which one is used is decided
//! once, when it is built.

mod flat;
mod versioned;

pub(crate) use flat::check_dir_name;
pub use flat::FlatBackend;
pub use versioned::VersionedBackend;

use crate::model::{ChangeCommand, FileStream, Hash};
use crate::{Error, Result, MAX_FILE_SIZE_BYTES};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which backend variant to build
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Versioned,
    Flat,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Versioned => f.write_str("versioned"),
            BackendKind::Flat => f.write_str("flat"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "versioned" => Ok(BackendKind::Versioned),
            "flat" => Ok(BackendKind::Flat),
            other => Err(Error::Config(format!("Unknown backend: {}", other))),
        }
    }
}

/// One entry in a file's change history
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub version: u64,
    pub command: ChangeCommand,
    pub author: String,
    pub message: String,
    pub timestamp: u64,
    /// Size recorded in metadata; `None` for deletions
    pub size: Option<u64>,
    /// Digest of the data written at the same version, if any
    pub digest: Option<Hash>,
}

/// The active storage backend
pub enum Backend {
    Versioned(VersionedBackend),
    Flat(FlatBackend),
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Versioned(_) => BackendKind::Versioned,
            Backend::Flat(_) => BackendKind::Flat,
        }
    }

    pub fn assets_root(&self) -> &str {
        match self {
            Backend::Versioned(b) => b.assets_root(),
            Backend::Flat(b) => b.assets_root(),
        }
    }

    pub fn isfile(&self, filepath: &str) -> Result<bool> {
        match self {
            Backend::Versioned(b) => b.isfile(filepath),
            Backend::Flat(b) => b.isfile(filepath),
        }
    }

    pub fn get(&self, filepath: &str, version: Option<u64>) -> Result<Option<FileStream>> {
        match self {
            Backend::Versioned(b) => b.get(filepath, version),
            Backend::Flat(b) => b.get(filepath, version),
        }
    }

    /// Returns the new version, or `None` for a backend without versions
    pub fn commit(
        &self,
        user_id: &str,
        filepath: &str,
        raw_bytes: &[u8],
        mimetype: Option<&str>,
    ) -> Result<Option<u64>> {
        match self {
            Backend::Versioned(b) => b.commit(user_id, filepath, raw_bytes, mimetype).map(Some),
            Backend::Flat(b) => b.commit(user_id, filepath, raw_bytes, mimetype).map(|_| None),
        }
    }

    pub fn delete(&self, user_id: &str, filepath: &str) -> Result<()> {
        match self {
            Backend::Versioned(b) => b.delete(user_id, filepath),
            Backend::Flat(b) => b.delete(user_id, filepath),
        }
    }

    pub fn listdir(&self, dir_name: &str) -> Result<Vec<String>> {
        match self {
            Backend::Versioned(b) => b.listdir(dir_name),
            Backend::Flat(b) => b.listdir(dir_name),
        }
    }

    /// Change history; always empty for the flat backend
    pub fn history(&self, filepath: &str) -> Result<Vec<Revision>> {
        match self {
            Backend::Versioned(b) => b.history(filepath),
            Backend::Flat(_) => Ok(Vec::new()),
        }
    }
}

impl From<VersionedBackend> for Backend {
    fn from(backend: VersionedBackend) -> Self {
        Backend::Versioned(backend)
    }
}

impl From<FlatBackend> for Backend {
    fn from(backend: FlatBackend) -> Self {
        Backend::Flat(backend)
    }
}

/// Fail before any write if the payload is over the limit
pub(crate) fn check_size(raw_bytes: &[u8]) -> Result<()> {
    if raw_bytes.len() > MAX_FILE_SIZE_BYTES {
        return Err(Error::SizeLimitExceeded {
            size: raw_bytes.len(),
            max: MAX_FILE_SIZE_BYTES,
        });
    }
    Ok(())
}
