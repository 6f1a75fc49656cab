//! Configuration loading
//!
//! Looks for `~/.config/assetfs/config.json` unless a path is given.
//! Missing fields fall back to defaults.

use crate::backend::BackendKind;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which backend to build and where its stores live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VfsConfig {
    pub backend: BackendKind,
    /// Directory holding the record store file and/or the blob directory
    pub data_dir: PathBuf,
    /// Bucket name used by the flat backend
    pub bucket: String,
}

impl Default for VfsConfig {
    fn default() -> Self {
        VfsConfig {
            backend: BackendKind::Versioned,
            data_dir: PathBuf::from(".assetfs"),
            bucket: "assets".to_string(),
        }
    }
}

impl VfsConfig {
    /// Default config location (~/.config/assetfs/config.json)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("assetfs").join("config.json"))
    }

    /// Load from an explicit path, or from the default location if it
    /// exists, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config {}: {}", path.display(), e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config dir: {}", e)))?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Record store file used by the versioned backend
    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join("records.avfs")
    }

    /// Blob directory used by the flat backend
    pub fn blobs_dir(&self) -> PathBuf {
        self.data_dir.join("blobs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"backend": "flat"}"#).unwrap();

        let config = VfsConfig::load(Some(&path)).unwrap();
        assert_eq!(config.backend, BackendKind::Flat);
        assert_eq!(config.bucket, "assets");
        assert_eq!(config.data_dir, PathBuf::from(".assetfs"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = VfsConfig {
            backend: BackendKind::Flat,
            data_dir: dir.path().join("data"),
            bucket: "media".into(),
        };
        config.save(&path).unwrap();

        assert_eq!(VfsConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = VfsConfig::load(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"backend": "cloud"}"#).unwrap();
        assert!(VfsConfig::load(Some(&path)).is_err());
    }
}
