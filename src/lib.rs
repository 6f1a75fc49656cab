//! # asset_vfs
//!
//! A versioned virtual file system for binary assets owned by an entity.
//!
//! Application code stores, reads, lists and deletes assets (images, audio,
//! ...) without knowing which physical store holds the bytes. Two backends
//! sit behind one contract:
//!
//! - **Versioned**: every write is a new version in a record store; old
//!   versions stay readable, deletes are soft.
//! - **Flat**: one current object per path in a blob store; writes
//!   overwrite, there is no history.
//!
//! Every path is validated against the entity's assets root before it
//! reaches a backend.
//!
//! ## Example
//!
//! ```ignore
//! use asset_vfs::{EntityKind, EntityRef, FileSystemFactory, MemoryRecordStore};
//! use std::sync::Arc;
//!
//! let factory = FileSystemFactory::versioned(Arc::new(MemoryRecordStore::new()));
//! let fs = factory.build(EntityRef::new(EntityKind::Exploration, "exp1")?)?;
//! fs.commit("user_id", "image/logo.png", png_bytes, Some("image/png"))?;
//! let bytes = fs.get("image/logo.png", None)?;
//! ```

pub mod backend;
pub mod config;
pub mod model;
pub mod path;
pub mod store;

mod error;
mod vfs;

pub use backend::{Backend, BackendKind, FlatBackend, Revision, VersionedBackend};
pub use config::VfsConfig;
pub use error::{Error, Result};
pub use model::{ChangeCommand, ChangeEntry, EntityKind, EntityRef, FileMetadata, FileStream, Hash};
pub use store::{
    BlobStat, BlobStore, DirBlobStore, FileRecordStore, MemoryBlobStore, MemoryRecordStore,
    RecordStore,
};
pub use vfs::{FileSystem, FileSystemFactory};

/// Largest payload a commit accepts (1 MiB)
pub const MAX_FILE_SIZE_BYTES: usize = 1024 * 1024;

/// Record store file format version
pub const FORMAT_VERSION: u32 = 1;

/// Magic bytes for record store files
pub const MAGIC: &[u8; 8] = b"ASSETVFS";
