//! In-memory stores for tests and ephemeral use.

use super::blob::{BlobStat, BlobStore};
use super::record::{check_body, Record, RecordBody, RecordKind, RecordStore};
use crate::model::ChangeEntry;
use crate::{Error, Result};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

type LogKey = (RecordKind, String);

/// An in-memory [`RecordStore`].
///
/// Keeps every version of every record; nothing is ever dropped.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    logs: RwLock<HashMap<LogKey, Vec<Record>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of record versions held, across all keys
    pub fn record_count(&self) -> usize {
        self.logs.read().values().map(Vec::len).sum()
    }

    fn append(&self, kind: RecordKind, key: &str, body: RecordBody, change: ChangeEntry) -> u64 {
        let mut logs = self.logs.write();
        let log = logs.entry((kind, key.to_string())).or_default();
        let version = log.last().map_or(1, |r| r.version + 1);
        log.push(Record {
            kind,
            key: key.to_string(),
            version,
            body,
            change,
        });
        version
    }
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, kind: RecordKind, key: &str) -> Result<Option<Record>> {
        let logs = self.logs.read();
        Ok(logs
            .get(&(kind, key.to_string()))
            .and_then(|log| log.last())
            .filter(|r| !r.is_deleted())
            .cloned())
    }

    fn get_version(&self, kind: RecordKind, key: &str, version: u64) -> Result<Option<Record>> {
        let logs = self.logs.read();
        Ok(logs
            .get(&(kind, key.to_string()))
            .and_then(|log| log.iter().find(|r| r.version == version))
            .filter(|r| !r.is_deleted())
            .cloned())
    }

    fn commit(&self, kind: RecordKind, key: &str, body: RecordBody, change: ChangeEntry) -> Result<u64> {
        check_body(kind, &body)?;
        Ok(self.append(kind, key, body, change))
    }

    fn delete(&self, kind: RecordKind, key: &str, change: ChangeEntry) -> Result<Option<u64>> {
        let mut logs = self.logs.write();
        let Some(log) = logs.get_mut(&(kind, key.to_string())) else {
            return Ok(None);
        };
        let Some(latest) = log.last().filter(|r| !r.is_deleted()) else {
            return Ok(None);
        };
        let version = latest.version + 1;
        log.push(Record {
            kind,
            key: key.to_string(),
            version,
            body: RecordBody::Tombstone,
            change,
        });
        Ok(Some(version))
    }

    fn list_undeleted(&self, kind: RecordKind) -> Result<Vec<String>> {
        let logs = self.logs.read();
        let mut keys: Vec<String> = logs
            .iter()
            .filter(|((k, _), log)| *k == kind && log.last().is_some_and(|r| !r.is_deleted()))
            .map(|((_, key), _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn history(&self, kind: RecordKind, key: &str) -> Result<Vec<Record>> {
        let logs = self.logs.read();
        Ok(logs.get(&(kind, key.to_string())).cloned().unwrap_or_default())
    }
}

#[derive(Clone, Debug)]
struct StoredObject {
    data: Vec<u8>,
    content_type: Option<String>,
}

/// An in-memory [`BlobStore`]. Listing is in key order.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object_count(&self) -> usize {
        self.objects.read().len()
    }
}

fn stat_of(key: &str, object: &StoredObject) -> BlobStat {
    BlobStat {
        filename: key.to_string(),
        size: object.data.len() as u64,
        content_type: object.content_type.clone(),
    }
}

impl BlobStore for MemoryBlobStore {
    fn stat(&self, key: &str) -> Result<BlobStat> {
        let objects = self.objects.read();
        objects
            .get(key)
            .map(|o| stat_of(key, o))
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    fn read(&self, key: &str) -> Result<Vec<u8>> {
        let objects = self.objects.read();
        objects
            .get(key)
            .map(|o| o.data.clone())
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    fn write(&self, key: &str, data: &[u8], content_type: Option<&str>) -> Result<()> {
        self.objects.write().insert(
            key.to_string(),
            StoredObject {
                data: data.to_vec(),
                content_type: content_type.map(str::to_string),
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.objects
            .write()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    fn list(&self, prefix: &str) -> Result<Vec<BlobStat>> {
        let objects = self.objects.read();
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, o)| stat_of(k, o))
            .collect())
    }
}
