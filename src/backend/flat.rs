//! Flat backend: one current object per path, no history
//!
//! Objects live in the blob store under `/<bucket>/<assets_root>/<filepath>`.
//! Versions are accepted for interface parity and ignored.

use super::check_size;
use crate::model::{EntityRef, FileStream};
use crate::path;
use crate::store::BlobStore;
use crate::{Error, Result};
use std::sync::Arc;

/// A blob-store-backed file system for a single entity
pub struct FlatBackend {
    entity: EntityRef,
    bucket: String,
    blobs: Arc<dyn BlobStore>,
}

impl FlatBackend {
    pub fn new(entity: EntityRef, bucket: impl Into<String>, blobs: Arc<dyn BlobStore>) -> Result<Self> {
        let bucket = bucket.into();
        if bucket.is_empty() || bucket.contains('/') {
            return Err(Error::InvalidConfiguration(format!(
                "Invalid bucket name: {:?}",
                bucket
            )));
        }
        Ok(FlatBackend {
            entity,
            bucket,
            blobs,
        })
    }

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn assets_root(&self) -> &str {
        self.entity.assets_root()
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn key(&self, filepath: &str) -> String {
        format!("/{}/{}/{}", self.bucket, self.entity.assets_root(), filepath)
    }

    pub fn isfile(&self, filepath: &str) -> Result<bool> {
        match self.blobs.stat(&self.key(filepath)) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Fetch the current object. The stream carries no version or metadata.
    pub fn get(&self, filepath: &str, _version: Option<u64>) -> Result<Option<FileStream>> {
        if !self.isfile(filepath)? {
            return Ok(None);
        }
        let data = self.blobs.read(&self.key(filepath))?;
        Ok(Some(FileStream::new(data, None, None)))
    }

    /// Overwrite the object at `filepath` with `raw_bytes`
    pub fn commit(&self, _user_id: &str, filepath: &str, raw_bytes: &[u8], mimetype: Option<&str>) -> Result<()> {
        check_size(raw_bytes)?;
        let key = self.key(filepath);
        self.blobs.write(&key, raw_bytes, mimetype)?;
        tracing::debug!(key = %key, size = raw_bytes.len(), "Wrote object");
        Ok(())
    }

    /// Delete the object. Unlike the versioned backend, a missing file is
    /// an error here.
    pub fn delete(&self, _user_id: &str, filepath: &str) -> Result<()> {
        match self.blobs.delete(&self.key(filepath)) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Err(Error::NotFound(format!(
                "File does not exist: {}",
                filepath
            ))),
            Err(e) => Err(e),
        }
    }

    /// Full store keys of every object under `dir_name`, in store order.
    ///
    /// `dir_name` must not start or end with `/`.
    pub fn listdir(&self, dir_name: &str) -> Result<Vec<String>> {
        check_dir_name(dir_name)?;

        // The trailing slash keeps `/abc` from matching `/abcd/123.png`.
        let mut prefix = path::construct_path(&["/", self.entity.assets_root(), dir_name]);
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        let prefix = format!("/{}{}", self.bucket, prefix);

        Ok(self
            .blobs
            .list(&prefix)?
            .into_iter()
            .map(|stat| stat.filename)
            .collect())
    }
}

/// Reject a directory name with a leading or trailing `/`
pub(crate) fn check_dir_name(dir_name: &str) -> Result<()> {
    if dir_name.starts_with('/') || dir_name.ends_with('/') {
        return Err(Error::InvalidArgument(format!(
            "The dir_name should not start with / or end with / : {}",
            dir_name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityKind;
    use crate::store::MemoryBlobStore;
    use crate::MAX_FILE_SIZE_BYTES;

    fn backend() -> (FlatBackend, Arc<MemoryBlobStore>) {
        let blobs = Arc::new(MemoryBlobStore::new());
        let entity = EntityRef::new(EntityKind::Skill, "skill1").unwrap();
        (FlatBackend::new(entity, "bucket", blobs.clone()).unwrap(), blobs)
    }

    #[test]
    fn test_commit_overwrites() {
        let (fs, blobs) = backend();
        fs.commit("user", "a.png", b"first", Some("image/png")).unwrap();
        fs.commit("user", "a.png", b"second", Some("image/png")).unwrap();

        let mut stream = fs.get("a.png", Some(1)).unwrap().unwrap();
        assert_eq!(&stream.read()[..], b"second");
        assert_eq!(stream.version(), None);
        assert!(stream.metadata().is_none());
        assert_eq!(blobs.object_count(), 1);

        let stat = blobs.stat("/bucket/skill/skill1/assets/a.png").unwrap();
        assert_eq!(stat.content_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_get_missing() {
        let (fs, _) = backend();
        assert!(!fs.isfile("none.png").unwrap());
        assert!(fs.get("none.png", None).unwrap().is_none());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let (fs, _) = backend();
        let err = fs.delete("user", "none.png").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_delete_existing() {
        let (fs, _) = backend();
        fs.commit("user", "a.png", b"x", None).unwrap();
        fs.delete("user", "a.png").unwrap();
        assert!(!fs.isfile("a.png").unwrap());
    }

    #[test]
    fn test_oversized_commit_writes_nothing() {
        let (fs, blobs) = backend();
        let payload = vec![0u8; MAX_FILE_SIZE_BYTES + 1];
        assert!(matches!(
            fs.commit("user", "big.png", &payload, None),
            Err(Error::SizeLimitExceeded { .. })
        ));
        assert_eq!(blobs.object_count(), 0);
    }

    #[test]
    fn test_listdir_returns_full_keys() {
        let (fs, _) = backend();
        for path in ["img/a.png", "img/b.png", "imgx/c.png"] {
            fs.commit("user", path, b"x", None).unwrap();
        }

        assert_eq!(
            fs.listdir("img").unwrap(),
            vec![
                "/bucket/skill/skill1/assets/img/a.png",
                "/bucket/skill/skill1/assets/img/b.png",
            ]
        );
    }

    #[test]
    fn test_listdir_rejects_slashes() {
        let (fs, _) = backend();
        for bad in ["/img", "img/", "/"] {
            assert!(matches!(fs.listdir(bad), Err(Error::InvalidArgument(_))));
        }
    }

    #[test]
    fn test_invalid_bucket() {
        let entity = EntityRef::new(EntityKind::Skill, "s").unwrap();
        let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
        assert!(FlatBackend::new(entity.clone(), "", blobs.clone()).is_err());
        assert!(FlatBackend::new(entity, "a/b", blobs).is_err());
    }
}
