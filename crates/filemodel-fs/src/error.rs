//! Error types for filemodel-fs

use std::path::PathBuf;

/// Result type for filemodel-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in filemodel-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported path style: {style}")]
    UnsupportedPathStyle { style: String },

    #[error("Resolving casing is not supported on {os}")]
    UnsupportedCasingPlatform { os: String },

    #[error("Failed to parse {format} data at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Failed to serialize {format} data to {path}: {message}")]
    ConfigSerialize {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
