//! Error types for filemodel-core

use crate::arena::ModelId;
use std::path::{Path, PathBuf};

/// Result type for filemodel-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or saving model trees
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Load settings were queried before being initialized
    #[error("Load settings have not been initialized")]
    NotInitialized,

    /// A declared path does not point at an existing file
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// A file's data was rejected by its schema
    #[error("Validation failed for {}: {message}", path.display())]
    Validation { path: PathBuf, message: String },

    /// Schema-raised rejection, before the core knows which file it came from
    #[error("Invalid model data: {0}")]
    InvalidData(String),

    /// A handle no longer refers to a live node
    #[error("No model for handle {id}")]
    ModelMissing { id: ModelId },

    /// A handle refers to a node of a different type
    #[error("Model {id} is not a {expected}")]
    KindMismatch { id: ModelId, expected: &'static str },

    /// The node behind a handle is not file-backed
    #[error("Model {id} is not file-backed")]
    NotFileBacked { id: ModelId },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from filemodel-fs
    #[error(transparent)]
    Fs(#[from] filemodel_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    /// Schema-side shorthand for rejecting raw data.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    /// Attach the path of the file being processed to a schema rejection.
    ///
    /// Errors that already identify a file are returned unchanged, so the
    /// innermost file wins when a failure propagates up a nested load.
    pub fn at_path(self, path: &Path) -> Self {
        match self {
            Self::InvalidData(message) => Self::Validation {
                path: path.to_path_buf(),
                message,
            },
            Self::Json(e) => Self::Validation {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
            other => other,
        }
    }
}
