//! Storage collaborators
//!
//! The VFS sits on top of two kinds of store: a versioned record store
//! (append-only histories, soft deletes) and a flat blob store (one object
//! per key, overwritten in place). Each has an in-memory and an on-disk
//! implementation.

mod blob;
mod dir_store;
mod file_store;
mod frame;
mod memory;
mod record;

pub use blob::{BlobStat, BlobStore};
pub use dir_store::DirBlobStore;
pub use file_store::FileRecordStore;
pub use memory::{MemoryBlobStore, MemoryRecordStore};
pub use record::{Record, RecordBody, RecordKind, RecordStore};
