//! Directory-backed blob store
//!
//! Layout under the root directory:
//! ```text
//! objects/<key>   object bytes
//! types/<key>     content type, if one was given
//! tmp/            staging area for atomic overwrites
//! ```

use super::blob::{BlobStat, BlobStore};
use crate::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// A [`BlobStore`] that keeps each object as a file on the local disk
pub struct DirBlobStore {
    root: PathBuf,
    staged: AtomicU64,
}

impl DirBlobStore {
    /// Open a store rooted at `root`, creating the directory layout if needed
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        for sub in ["objects", "types", "tmp"] {
            fs::create_dir_all(root.join(sub))?;
        }
        Ok(DirBlobStore {
            root,
            staged: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> Result<PathBuf> {
        Ok(self.root.join("objects").join(relative_key(key)?))
    }

    fn type_path(&self, key: &str) -> Result<PathBuf> {
        Ok(self.root.join("types").join(relative_key(key)?))
    }

    fn stat_path(&self, key: &str, path: &Path) -> Result<BlobStat> {
        let meta = fs::metadata(path).map_err(|e| not_found_or(e, key))?;
        if !meta.is_file() {
            return Err(Error::NotFound(key.to_string()));
        }
        let content_type = match fs::read_to_string(self.type_path(key)?) {
            Ok(t) => Some(t),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Ok(BlobStat {
            filename: key.to_string(),
            size: meta.len(),
            content_type,
        })
    }
}

/// Turn `/bucket/a/b.png` into `bucket/a/b.png`, refusing anything that
/// could step outside the store root.
fn relative_key(key: &str) -> Result<&str> {
    let rel = key.trim_start_matches('/');
    let bad = rel.is_empty()
        || rel
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if bad {
        return Err(Error::InvalidArgument(format!("Invalid blob key: {}", key)));
    }
    Ok(rel)
}

fn not_found_or(e: io::Error, key: &str) -> Error {
    if e.kind() == io::ErrorKind::NotFound {
        Error::NotFound(key.to_string())
    } else {
        Error::Io(e)
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

impl BlobStore for DirBlobStore {
    fn stat(&self, key: &str) -> Result<BlobStat> {
        let path = self.object_path(key)?;
        self.stat_path(key, &path)
    }

    fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(key)?;
        fs::read(&path).map_err(|e| not_found_or(e, key))
    }

    fn write(&self, key: &str, data: &[u8], content_type: Option<&str>) -> Result<()> {
        let path = self.object_path(key)?;
        let type_path = self.type_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Stage then rename, so readers never see a half-written object.
        let n = self.staged.fetch_add(1, Ordering::Relaxed);
        let staging = self
            .root
            .join("tmp")
            .join(format!("{}-{}", std::process::id(), n));
        fs::write(&staging, data)?;
        fs::rename(&staging, &path)?;

        match content_type {
            Some(t) => {
                if let Some(parent) = type_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&type_path, t)?;
            }
            None => match fs::remove_file(&type_path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.object_path(key)?;
        fs::remove_file(&path).map_err(|e| not_found_or(e, key))?;
        let _ = fs::remove_file(self.type_path(key)?);
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<BlobStat>> {
        let objects = self.root.join("objects");
        let mut files = Vec::new();
        collect_files(&objects, &mut files)?;

        let mut stats = Vec::new();
        for file in files {
            let Ok(rel) = file.strip_prefix(&objects) else {
                continue;
            };
            let parts: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            let key = format!("/{}", parts.join("/"));
            if key.starts_with(prefix) {
                stats.push(self.stat_path(&key, &file)?);
            }
        }
        stats.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(stats)
    }
}
