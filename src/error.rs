//! Error types for asset_vfs

use thiserror::Error;

/// Result type alias for asset_vfs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in asset_vfs operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bad entity name or id handed to a backend constructor
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Path escapes the assets root or is otherwise malformed
    #[error("Invalid filepath: {0}")]
    InvalidPath(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("The maximum allowed file size is 1 MB (got {size} bytes, limit {max})")]
    SizeLimitExceeded { size: usize, max: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    /// Metadata and data histories disagree for a file
    #[error("Metadata and data for file {filepath} (version {version}) are out of sync")]
    ConsistencyFault { filepath: String, version: String },

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Invalid store file: {0}")]
    InvalidFile(String),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this is the store-level "does not exist" signal
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
