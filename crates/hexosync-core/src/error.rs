//! Error types for the sync pipeline.
//!
//! All errors in the system are represented by the [`Error`] enum.
//! Malformed metadata is deliberately absent: the parser degrades to an
//! empty header instead of failing.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;

/// The core error type for all sync operations.
#[derive(ThisError, Debug)]
pub enum Error {
    /// File system error with the path that was being touched
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File system error without path context
    #[error("I/O error: {0}")]
    RawIo(#[from] io::Error),

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Invalid file path (outside a managed root, no file name, etc.)
    #[error("Invalid file path: {reason}")]
    InvalidPath { reason: String },

    /// Invalid or missing configuration
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    /// Generic unclassified error
    #[error("Error: {0}")]
    Other(String),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an IO error bound to a path
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Error::FileNotFound { path: path.into() }
    }

    /// Create an invalid path error
    pub fn invalid_path(reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(reason: impl Into<String>) -> Self {
        Error::ConfigError {
            reason: reason.into(),
        }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Whether this error belongs to the configuration class
    pub fn is_config(&self) -> bool {
        matches!(self, Error::ConfigError { .. })
    }

    /// Whether this error is a missing-file condition
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::FileNotFound { .. } => true,
            Error::Io { source, .. } | Error::RawIo(source) => {
                source.kind() == io::ErrorKind::NotFound
            }
            _ => false,
        }
    }
}
