//! Versioned backend: every write becomes a new, retrievable version
//!
//! Metadata and data live in two parallel histories in the record store.
//! Data is always persisted before metadata, so a crash between the two
//! writes leaves new data without metadata (reads as "not found") rather
//! than metadata pointing at data that does not exist.

use super::{check_size, Revision};
use crate::model::{ChangeEntry, EntityRef, FileMetadata, FileStream};
use crate::path;
use crate::store::{Record, RecordBody, RecordKind, RecordStore};
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Number of leading segments in a key (`""`, entity, id, `assets`)
const KEY_ROOT_SEGMENTS: usize = 4;

/// A record-store-backed file system for a single entity
pub struct VersionedBackend {
    entity: EntityRef,
    records: Arc<dyn RecordStore>,
}

impl VersionedBackend {
    pub fn new(entity: EntityRef, records: Arc<dyn RecordStore>) -> Self {
        VersionedBackend { entity, records }
    }

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn assets_root(&self) -> &str {
        self.entity.assets_root()
    }

    fn key(&self, filepath: &str) -> String {
        format!("/{}/{}", self.entity.assets_root(), filepath)
    }

    fn lookup(&self, kind: RecordKind, filepath: &str, version: Option<u64>) -> Result<Option<Record>> {
        let key = self.key(filepath);
        match version {
            None => self.records.get(kind, &key),
            Some(v) => self.records.get_version(kind, &key, v),
        }
    }

    /// Pair up the metadata and data records at `version`
    fn resolve(&self, filepath: &str, version: Option<u64>) -> Result<Resolved> {
        let metadata = self.lookup(RecordKind::FileMetadata, filepath, version)?;
        let data = self.lookup(RecordKind::FileData, filepath, version)?;

        Ok(match (metadata, data) {
            (None, None) => Resolved::Missing,
            (Some(metadata), Some(data)) => {
                let version = version.unwrap_or(data.version);
                let metadata = metadata.metadata().copied();
                let content = data.into_content().unwrap_or_default();
                Resolved::Found(FileStream::new(content, Some(version), metadata))
            }
            (None, Some(data)) => Resolved::Uncommitted(data.version),
            (Some(_), None) => Resolved::Orphaned,
        })
    }

    /// Like [`get`](Self::get), but reports a metadata/data desync in either
    /// direction as [`Error::ConsistencyFault`].
    pub fn try_get(&self, filepath: &str, version: Option<u64>) -> Result<Option<FileStream>> {
        match self.resolve(filepath, version)? {
            Resolved::Missing => Ok(None),
            Resolved::Found(stream) => Ok(Some(stream)),
            Resolved::Uncommitted(_) | Resolved::Orphaned => Err(Error::ConsistencyFault {
                filepath: filepath.to_string(),
                version: describe_version(version),
            }),
        }
    }

    /// Fetch a file at `version`, or the latest version if `None`.
    ///
    /// Returns `None` if the file does not exist. Data without metadata is
    /// what an interrupted commit leaves behind and reads as missing.
    /// Metadata without data is logged as an error and also reads as missing.
    pub fn get(&self, filepath: &str, version: Option<u64>) -> Result<Option<FileStream>> {
        match self.resolve(filepath, version)? {
            Resolved::Found(stream) => Ok(Some(stream)),
            Resolved::Missing => Ok(None),
            Resolved::Uncommitted(data_version) => {
                tracing::warn!(
                    entity = %self.entity,
                    filepath,
                    data_version,
                    "Data without metadata, treating as an interrupted commit"
                );
                Ok(None)
            }
            Resolved::Orphaned => {
                let fault = Error::ConsistencyFault {
                    filepath: filepath.to_string(),
                    version: describe_version(version),
                };
                tracing::error!(entity = %self.entity, "{}", fault);
                Ok(None)
            }
        }
    }

    /// Save `raw_bytes` as a new version of `filepath`, returning the version
    /// number the metadata was written at.
    pub fn commit(&self, user_id: &str, filepath: &str, raw_bytes: &[u8], _mimetype: Option<&str>) -> Result<u64> {
        check_size(raw_bytes)?;
        let key = self.key(filepath);

        let data_version = self.records.commit(
            RecordKind::FileData,
            &key,
            RecordBody::data(raw_bytes.to_vec()),
            ChangeEntry::save(user_id),
        )?;
        let metadata_version = self.records.commit(
            RecordKind::FileMetadata,
            &key,
            RecordBody::Metadata(FileMetadata::for_content(raw_bytes)),
            ChangeEntry::save(user_id),
        )?;

        tracing::debug!(
            key = %key,
            size = raw_bytes.len(),
            data_version,
            metadata_version,
            "Committed file"
        );
        Ok(metadata_version)
    }

    /// Soft-delete the current version. Deleting a missing file is a no-op.
    pub fn delete(&self, user_id: &str, filepath: &str) -> Result<()> {
        let key = self.key(filepath);
        let metadata = self
            .records
            .delete(RecordKind::FileMetadata, &key, ChangeEntry::delete(user_id, ""))?;
        let data = self
            .records
            .delete(RecordKind::FileData, &key, ChangeEntry::delete(user_id, ""))?;

        tracing::debug!(key = %key, ?metadata, ?data, "Deleted file");
        Ok(())
    }

    pub fn isfile(&self, filepath: &str) -> Result<bool> {
        Ok(self.lookup(RecordKind::FileMetadata, filepath, None)?.is_some())
    }

    /// Sorted, de-duplicated paths (relative to the assets root) of every
    /// live file under `dir_name`.
    pub fn listdir(&self, dir_name: &str) -> Result<Vec<String>> {
        // The trailing slash keeps `/abc` from matching `/abcd/123.png`.
        let mut prefix = path::construct_path(&["/", self.entity.assets_root(), dir_name]);
        if !prefix.ends_with('/') {
            prefix.push('/');
        }

        let files: BTreeSet<String> = self
            .records
            .list_undeleted(RecordKind::FileMetadata)?
            .into_iter()
            .filter(|key| key.starts_with(&prefix))
            .map(|key| {
                key.split('/')
                    .skip(KEY_ROOT_SEGMENTS)
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .collect();

        Ok(files.into_iter().collect())
    }

    /// Every recorded change to `filepath`, oldest first
    pub fn history(&self, filepath: &str) -> Result<Vec<Revision>> {
        let key = self.key(filepath);
        let digests: BTreeMap<u64, _> = self
            .records
            .history(RecordKind::FileData, &key)?
            .into_iter()
            .filter_map(|r| r.digest().map(|d| (r.version, d)))
            .collect();

        Ok(self
            .records
            .history(RecordKind::FileMetadata, &key)?
            .into_iter()
            .map(|r| Revision {
                version: r.version,
                command: r.change.command,
                author: r.change.author.clone(),
                message: r.change.message.clone(),
                timestamp: r.change.timestamp,
                size: r.metadata().map(|m| m.size),
                digest: digests.get(&r.version).copied(),
            })
            .collect())
    }
}

/// Outcome of looking up both halves of a file
enum Resolved {
    Missing,
    Found(FileStream),
    /// Data written but metadata never followed, at this data version
    Uncommitted(u64),
    /// Metadata with no data behind it
    Orphaned,
}

fn describe_version(version: Option<u64>) -> String {
    version.map_or_else(|| "latest".to_string(), |v| v.to_string())
}
