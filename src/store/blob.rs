//! Flat blob store contract
//!
//! One current object per key, no history. Keys are absolute,
//! `/`-separated strings of the form `/<bucket>/<rest>`.

use crate::Result;
use serde::{Deserialize, Serialize};

/// What the store reports about a single object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobStat {
    /// Full key of the object, as stored
    pub filename: String,
    /// Size in bytes
    pub size: u64,
    pub content_type: Option<String>,
}

/// A flat, versionless object store.
///
/// `stat`, `read` and `delete` report a missing key as
/// [`Error::NotFound`](crate::Error::NotFound); every other error is a
/// genuine store failure.
pub trait BlobStore: Send + Sync {
    fn stat(&self, key: &str) -> Result<BlobStat>;

    /// Read the whole object
    fn read(&self, key: &str) -> Result<Vec<u8>>;

    /// Create or fully overwrite an object
    fn write(&self, key: &str, data: &[u8], content_type: Option<&str>) -> Result<()>;

    fn delete(&self, key: &str) -> Result<()>;

    /// All objects whose key starts with `prefix`
    fn list(&self, prefix: &str) -> Result<Vec<BlobStat>>;
}
