//! Single-file record store with an append-only log
//!
//! File format:
//! ```text
//! [HEADER: 64 bytes]
//!   - magic: 8 bytes ("ASSETVFS")
//!   - version: 4 bytes (u32 LE)
//!   - reserved: 52 bytes
//!
//! [FRAMES: variable]
//!   - len: 4 bytes (u32 LE)
//!   - frame: `len` bytes, see `store::frame`
//! ```
//!
//! Frames are only ever appended. The index is rebuilt by scanning on open;
//! a frame cut short by a crash mid-write is dropped.

use super::frame;
use super::record::{check_body, Record, RecordBody, RecordKind, RecordStore};
use crate::model::ChangeEntry;
use crate::{Error, Result, FORMAT_VERSION, MAGIC};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const HEADER_SIZE: u64 = 64;
const LEN_PREFIX: u64 = 4;

/// Location of one record version in the file
#[derive(Clone, Copy, Debug)]
struct IndexEntry {
    version: u64,
    deleted: bool,
    offset: u64,
    size: u32,
}

/// In-memory index: per key, every version in append order
#[derive(Default)]
struct Index {
    logs: HashMap<(RecordKind, String), Vec<IndexEntry>>,
}

impl Index {
    fn latest(&self, kind: RecordKind, key: &str) -> Option<IndexEntry> {
        self.logs
            .get(&(kind, key.to_string()))
            .and_then(|log| log.last())
            .copied()
    }

    fn insert(&mut self, record: &Record, offset: u64, size: u32) {
        self.logs
            .entry((record.kind, record.key.clone()))
            .or_default()
            .push(IndexEntry {
                version: record.version,
                deleted: record.is_deleted(),
                offset,
                size,
            });
    }
}

/// A [`RecordStore`] backed by a single append-only file
pub struct FileRecordStore {
    path: PathBuf,
    file: RwLock<File>,
    index: RwLock<Index>,
    write_offset: RwLock<u64>,
}

impl FileRecordStore {
    /// Create a new, empty store file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        let mut header = [0u8; HEADER_SIZE as usize];
        header[0..8].copy_from_slice(MAGIC);
        header[8..12].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
        file.write_all(&header)?;
        file.sync_all()?;

        Ok(FileRecordStore {
            path,
            file: RwLock::new(file),
            index: RwLock::new(Index::default()),
            write_offset: RwLock::new(HEADER_SIZE),
        })
    }

    /// Open an existing store file and rebuild its index
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;
        let file_len = file.metadata()?.len();
        if file_len < HEADER_SIZE {
            return Err(Error::InvalidFile("File shorter than header".into()));
        }

        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;

        if &header[0..8] != MAGIC {
            return Err(Error::InvalidFile("Invalid magic bytes".into()));
        }

        let mut version_bytes = [0u8; 4];
        version_bytes.copy_from_slice(&header[8..12]);
        let version = u32::from_le_bytes(version_bytes);
        if version != FORMAT_VERSION {
            return Err(Error::VersionMismatch {
                expected: FORMAT_VERSION,
                found: version,
            });
        }

        let mut index = Index::default();
        let mut offset = HEADER_SIZE;
        while offset < file_len {
            if file_len - offset < LEN_PREFIX {
                break;
            }
            let mut len_buf = [0u8; 4];
            file.read_exact(&mut len_buf)?;
            let size = u32::from_le_bytes(len_buf);
            let frame_offset = offset + LEN_PREFIX;
            if frame_offset + size as u64 > file_len {
                break;
            }

            let mut data = vec![0u8; size as usize];
            file.read_exact(&mut data)?;
            let record = frame::decode(&data)?;
            index.insert(&record, frame_offset, size);

            offset = frame_offset + size as u64;
        }

        if offset < file_len {
            tracing::warn!(
                path = %path.display(),
                dropped = file_len - offset,
                "Discarding torn record at end of store file"
            );
            file.set_len(offset)?;
        }

        Ok(FileRecordStore {
            path,
            file: RwLock::new(file),
            index: RwLock::new(index),
            write_offset: RwLock::new(offset),
        })
    }

    /// Open or create a store file
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Number of record versions in the file
    pub fn record_count(&self) -> usize {
        let index = self.index.read();
        index.logs.values().map(Vec::len).sum()
    }

    /// Flush appended frames to disk
    pub fn sync(&self) -> Result<()> {
        self.file.write().sync_all()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entry(&self, entry: IndexEntry) -> Result<Record> {
        let mut file = self.file.write();
        file.seek(SeekFrom::Start(entry.offset))?;

        let mut data = vec![0u8; entry.size as usize];
        file.read_exact(&mut data)?;

        frame::decode(&data)
    }

    // Caller holds the index write lock, so version assignment and the
    // append happen as one step.
    fn append(&self, index: &mut Index, record: Record) -> Result<u64> {
        let encoded = frame::encode(&record)?;
        let size = u32::try_from(encoded.len())
            .map_err(|_| Error::InvalidArgument(format!("Record too large: {} bytes", encoded.len())))?;

        let frame_offset = {
            let mut write_offset = self.write_offset.write();
            let offset = *write_offset;

            let mut file = self.file.write();
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(&size.to_le_bytes())?;
            file.write_all(&encoded)?;

            *write_offset = offset + LEN_PREFIX + size as u64;
            offset + LEN_PREFIX
        };

        index.insert(&record, frame_offset, size);
        Ok(record.version)
    }
}

impl RecordStore for FileRecordStore {
    fn get(&self, kind: RecordKind, key: &str) -> Result<Option<Record>> {
        let entry = self.index.read().latest(kind, key);
        match entry {
            Some(entry) if !entry.deleted => Ok(Some(self.read_entry(entry)?)),
            _ => Ok(None),
        }
    }

    fn get_version(&self, kind: RecordKind, key: &str, version: u64) -> Result<Option<Record>> {
        let entry = {
            let index = self.index.read();
            index
                .logs
                .get(&(kind, key.to_string()))
                .and_then(|log| log.iter().find(|e| e.version == version))
                .copied()
        };
        match entry {
            Some(entry) if !entry.deleted => Ok(Some(self.read_entry(entry)?)),
            _ => Ok(None),
        }
    }

    fn commit(&self, kind: RecordKind, key: &str, body: RecordBody, change: ChangeEntry) -> Result<u64> {
        check_body(kind, &body)?;
        let mut index = self.index.write();
        let version = index.latest(kind, key).map_or(1, |e| e.version + 1);
        let record = Record {
            kind,
            key: key.to_string(),
            version,
            body,
            change,
        };
        self.append(&mut index, record)
    }

    fn delete(&self, kind: RecordKind, key: &str, change: ChangeEntry) -> Result<Option<u64>> {
        let mut index = self.index.write();
        let latest = match index.latest(kind, key) {
            Some(entry) if !entry.deleted => entry,
            _ => return Ok(None),
        };
        let record = Record {
            kind,
            key: key.to_string(),
            version: latest.version + 1,
            body: RecordBody::Tombstone,
            change,
        };
        self.append(&mut index, record).map(Some)
    }

    fn list_undeleted(&self, kind: RecordKind) -> Result<Vec<String>> {
        let index = self.index.read();
        let mut keys: Vec<String> = index
            .logs
            .iter()
            .filter(|((k, _), log)| *k == kind && log.last().is_some_and(|e| !e.deleted))
            .map(|((_, key), _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn history(&self, kind: RecordKind, key: &str) -> Result<Vec<Record>> {
        let entries: Vec<IndexEntry> = {
            let index = self.index.read();
            index
                .logs
                .get(&(kind, key.to_string()))
                .cloned()
                .unwrap_or_default()
        };
        entries.into_iter().map(|e| self.read_entry(e)).collect()
    }
}

impl Drop for FileRecordStore {
    fn drop(&mut self) {
        // Best-effort sync on drop
        let _ = self.sync();
    }
}
