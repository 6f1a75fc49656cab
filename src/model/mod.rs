//! Core data model types for asset_vfs

mod change;
mod entity;
mod hash;
mod metadata;
mod stream;

pub use change::{ChangeCommand, ChangeEntry};
pub use entity::{EntityKind, EntityRef};
pub use hash::Hash;
pub use metadata::FileMetadata;
pub use stream::FileStream;
