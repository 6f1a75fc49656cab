//! High-level file system API
//!
//! [`FileSystem`] is the single entry point for the rest of an application.
//! It validates every caller-supplied path against the entity's assets root
//! and then delegates to whichever backend it was built with.

use crate::backend::{check_dir_name, Backend, BackendKind, FlatBackend, Revision, VersionedBackend};
use crate::config::VfsConfig;
use crate::model::{EntityRef, FileStream};
use crate::path;
use crate::store::{BlobStore, DirBlobStore, FileRecordStore, RecordStore};
use crate::{Error, Result};
use bytes::Bytes;
use std::sync::Arc;

/// Builds per-entity file systems over one shared set of stores.
///
/// The backend variant is fixed when the factory is created; every
/// [`FileSystem`] it builds uses the same one.
#[derive(Clone)]
pub enum FileSystemFactory {
    Versioned {
        records: Arc<dyn RecordStore>,
    },
    Flat {
        bucket: String,
        blobs: Arc<dyn BlobStore>,
    },
}

impl FileSystemFactory {
    pub fn versioned(records: Arc<dyn RecordStore>) -> Self {
        FileSystemFactory::Versioned { records }
    }

    pub fn flat(bucket: impl Into<String>, blobs: Arc<dyn BlobStore>) -> Self {
        FileSystemFactory::Flat {
            bucket: bucket.into(),
            blobs,
        }
    }

    /// Open the on-disk stores named by `config`
    pub fn from_config(config: &VfsConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        match config.backend {
            BackendKind::Versioned => {
                let store = FileRecordStore::open_or_create(config.records_path())?;
                Ok(Self::versioned(Arc::new(store)))
            }
            BackendKind::Flat => {
                let store = DirBlobStore::open(config.blobs_dir())?;
                Ok(Self::flat(config.bucket.clone(), Arc::new(store)))
            }
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            FileSystemFactory::Versioned { .. } => BackendKind::Versioned,
            FileSystemFactory::Flat { .. } => BackendKind::Flat,
        }
    }

    /// A file system scoped to one entity's assets
    pub fn build(&self, entity: EntityRef) -> Result<FileSystem> {
        let backend = match self {
            FileSystemFactory::Versioned { records } => {
                Backend::Versioned(VersionedBackend::new(entity, records.clone()))
            }
            FileSystemFactory::Flat { bucket, blobs } => {
                Backend::Flat(FlatBackend::new(entity, bucket.clone(), blobs.clone())?)
            }
        };
        Ok(FileSystem::new(backend))
    }
}

/// The file system for a single entity's assets
pub struct FileSystem {
    backend: Backend,
}

impl FileSystem {
    pub fn new(backend: impl Into<Backend>) -> Self {
        FileSystem {
            backend: backend.into(),
        }
    }

    /// Shorthand for opening the configured stores and building one file system
    pub fn from_config(config: &VfsConfig, entity: EntityRef) -> Result<Self> {
        FileSystemFactory::from_config(config)?.build(entity)
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn assets_root(&self) -> &str {
        self.backend.assets_root()
    }

    /// Validate `filepath` and return it normalized, relative to the assets root.
    ///
    /// Runs on every call; a path checked earlier is checked again.
    fn check_filepath(&self, filepath: &str) -> Result<String> {
        let root = format!("/{}", self.backend.assets_root());
        let absolute = path::validate(&root, filepath)?;
        Ok(path::relative_to(&root, &absolute)?.to_string())
    }

    /// Like [`check_filepath`](Self::check_filepath), but the path must name
    /// something below the assets root, not the root itself.
    fn check_file(&self, filepath: &str) -> Result<String> {
        let relative = self.check_filepath(filepath)?;
        if relative.is_empty() {
            return Err(Error::InvalidPath(filepath.to_string()));
        }
        Ok(relative)
    }

    /// Whether a file exists
    pub fn isfile(&self, filepath: &str) -> Result<bool> {
        let filepath = self.check_file(filepath)?;
        self.backend.isfile(&filepath)
    }

    /// Open a stream over the file content, or `None` if there is no such file
    pub fn open(&self, filepath: &str, version: Option<u64>) -> Result<Option<FileStream>> {
        let filepath = self.check_file(filepath)?;
        self.backend.get(&filepath, version)
    }

    /// Like [`open`](Self::open), but a missing file is [`Error::NotFound`]
    pub fn open_existing(&self, filepath: &str, version: Option<u64>) -> Result<FileStream> {
        self.open(filepath, version)?.ok_or_else(|| {
            Error::NotFound(format!(
                "File {} (version {}) not found.",
                filepath,
                version.map_or_else(|| "latest".to_string(), |v| v.to_string())
            ))
        })
    }

    /// Read the whole file
    pub fn get(&self, filepath: &str, version: Option<u64>) -> Result<Bytes> {
        Ok(self.open_existing(filepath, version)?.read())
    }

    /// Replace the file content. Accepts anything byte-like.
    ///
    /// Returns the new version for the versioned backend.
    pub fn commit(
        &self,
        user_id: &str,
        filepath: &str,
        raw_bytes: impl AsRef<[u8]>,
        mimetype: Option<&str>,
    ) -> Result<Option<u64>> {
        let filepath = self.check_file(filepath)?;
        self.backend
            .commit(user_id, &filepath, raw_bytes.as_ref(), mimetype)
    }

    pub fn delete(&self, user_id: &str, filepath: &str) -> Result<()> {
        let filepath = self.check_file(filepath)?;
        self.backend.delete(user_id, &filepath)
    }

    /// List the files under a directory.
    ///
    /// The directory is validated and normalized like any other path. The
    /// flat backend additionally rejects a leading or trailing `/` in the
    /// name as given.
    pub fn listdir(&self, dir_name: &str) -> Result<Vec<String>> {
        let relative = self.check_filepath(dir_name)?;
        if let Backend::Flat(_) = self.backend {
            check_dir_name(dir_name)?;
        }
        self.backend.listdir(&relative)
    }

    pub fn history(&self, filepath: &str) -> Result<Vec<Revision>> {
        let filepath = self.check_file(filepath)?;
        self.backend.history(&filepath)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityKind;
    use crate::store::{MemoryBlobStore, MemoryRecordStore};
    use tempfile::tempdir;

    fn entity() -> EntityRef {
        EntityRef::new(EntityKind::Exploration, "exp_id").unwrap()
    }

    fn versioned() -> FileSystem {
        FileSystemFactory::versioned(Arc::new(MemoryRecordStore::new()))
            .build(entity())
            .unwrap()
    }

    fn flat() -> FileSystem {
        FileSystemFactory::flat("bucket", Arc::new(MemoryBlobStore::new()))
            .build(entity())
            .unwrap()
    }

    #[test]
    fn test_roundtrip_on_both_backends() {
        for fs in [versioned(), flat()] {
            fs.commit("user", "a/b.png", b"bytes", Some("image/png")).unwrap();
            assert!(fs.isfile("a/b.png").unwrap());
            assert_eq!(&fs.get("a/b.png", None).unwrap()[..], b"bytes");
        }
    }

    #[test]
    fn test_traversal_rejected_everywhere() {
        let fs = versioned();
        let bad = "../../secret";
        assert!(matches!(fs.isfile(bad), Err(Error::InvalidPath(_))));
        assert!(matches!(fs.open(bad, None), Err(Error::InvalidPath(_))));
        assert!(matches!(fs.get(bad, None), Err(Error::InvalidPath(_))));
        assert!(matches!(fs.commit("u", bad, b"x", None), Err(Error::InvalidPath(_))));
        assert!(matches!(fs.delete("u", bad), Err(Error::InvalidPath(_))));
        assert!(matches!(fs.listdir(bad), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_paths_are_normalized_before_delegating() {
        let fs = versioned();
        fs.commit("user", "img/./x/../a.png", b"x", None).unwrap();
        assert!(fs.isfile("img/a.png").unwrap());
        assert_eq!(fs.listdir("img").unwrap(), vec!["img/a.png"]);
    }

    #[test]
    fn test_listdir_normalizes_dir_name() {
        for fs in [versioned(), flat()] {
            fs.commit("user", "images/a.png", b"x", None).unwrap();
            let expected = fs.listdir("images").unwrap();
            assert_eq!(expected.len(), 1);

            for spelling in ["./images", "x/../images", "images/./", "images//"] {
                if fs.backend_kind() == BackendKind::Flat && spelling.ends_with('/') {
                    continue;
                }
                assert_eq!(fs.listdir(spelling).unwrap(), expected, "{}", spelling);
            }
            assert_eq!(fs.listdir(".").unwrap(), fs.listdir("").unwrap());
            assert_eq!(fs.listdir(".").unwrap().len(), 1);
        }
    }

    #[test]
    fn test_flat_listdir_checks_name_as_given() {
        let fs = flat();
        for bad in ["images/", "./images/", "x/../images/"] {
            assert!(matches!(fs.listdir(bad), Err(Error::InvalidArgument(_))), "{}", bad);
        }
    }

    #[test]
    fn test_assets_root_is_not_a_file() {
        for fs in [versioned(), flat()] {
            for root in ["", ".", "img/..", "./"] {
                assert!(matches!(fs.commit("u", root, b"x", None), Err(Error::InvalidPath(_))));
                assert!(matches!(fs.isfile(root), Err(Error::InvalidPath(_))));
                assert!(matches!(fs.open(root, None), Err(Error::InvalidPath(_))));
                assert!(matches!(fs.delete("u", root), Err(Error::InvalidPath(_))));
                assert!(matches!(fs.history(root), Err(Error::InvalidPath(_))));
            }
            assert!(fs.listdir("").unwrap().is_empty());
        }
    }

    #[test]
    fn test_get_missing_names_version() {
        let fs = versioned();
        let err = fs.get("none.png", None).unwrap_err();
        assert!(err.to_string().contains("none.png (version latest)"));

        let err = fs.get("none.png", Some(4)).unwrap_err();
        assert!(matches!(err, Error::NotFound(ref m) if m.contains("(version 4)")));
    }

    #[test]
    fn test_commit_accepts_text() {
        let fs = versioned();
        fs.commit("user", "notes.txt", "plain text", None).unwrap();
        fs.commit("user", "notes.txt", String::from("owned text"), None).unwrap();
        assert_eq!(&fs.get("notes.txt", Some(1)).unwrap()[..], b"plain text");
        assert_eq!(&fs.get("notes.txt", None).unwrap()[..], b"owned text");
    }

    #[test]
    fn test_versioned_commit_reports_version() {
        let fs = versioned();
        assert_eq!(fs.commit("u", "a.png", b"1", None).unwrap(), Some(1));
        assert_eq!(fs.commit("u", "a.png", b"2", None).unwrap(), Some(2));
        assert_eq!(flat().commit("u", "a.png", b"1", None).unwrap(), None);
    }

    #[test]
    fn test_delete_asymmetry() {
        // A missing file is a no-op for the versioned backend but an error
        // for the flat one.
        versioned().delete("user", "missing.png").unwrap();
        assert!(matches!(
            flat().delete("user", "missing.png"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_from_config_picks_backend() {
        let dir = tempdir().unwrap();
        let mut config = VfsConfig {
            data_dir: dir.path().to_path_buf(),
            ..VfsConfig::default()
        };

        assert_eq!(FileSystemFactory::from_config(&config).unwrap().kind(), BackendKind::Versioned);
        let fs = FileSystem::from_config(&config, entity()).unwrap();
        assert_eq!(fs.backend_kind(), BackendKind::Versioned);
        assert_eq!(fs.assets_root(), "exploration/exp_id/assets");

        config.backend = BackendKind::Flat;
        let fs = FileSystem::from_config(&config, entity()).unwrap();
        assert_eq!(fs.backend_kind(), BackendKind::Flat);
        assert!(matches!(fs.backend(), Backend::Flat(_)));
    }

    #[test]
    fn test_factory_shares_stores_between_entities() {
        let factory = FileSystemFactory::versioned(Arc::new(MemoryRecordStore::new()));
        let a = factory.build(EntityRef::new(EntityKind::Topic, "a").unwrap()).unwrap();
        let b = factory.build(EntityRef::new(EntityKind::Topic, "b").unwrap()).unwrap();

        a.commit("user", "x.png", b"a", None).unwrap();
        assert!(a.isfile("x.png").unwrap());
        assert!(!b.isfile("x.png").unwrap());
    }
}
