//! Error types for the media sorter.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Which directory a name collision was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionScope {
    /// The watch directory, while renaming in place.
    Source,
    /// The library directory, while moving into place.
    Destination,
}

impl std::fmt::Display for CollisionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollisionScope::Source => write!(f, "source directory"),
            CollisionScope::Destination => write!(f, "destination directory"),
        }
    }
}

/// Main error type for the media sorter.
#[derive(Error, Debug)]
pub enum Error {
    // Classification errors
    #[error("Unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("Could not find an episode tag or year in: {0}")]
    AmbiguousFilename(String),

    #[error("Invalid season in episode tag: {0}")]
    InvalidSeasonToken(String),

    // Ingestion errors
    #[error("A file named {} already exists in the {scope}", .path.display())]
    NameCollision { scope: CollisionScope, path: PathBuf },

    #[error("Source file vanished: {0}")]
    SourceVanished(String),

    #[error("File never became available after {attempts} attempts: {path}")]
    StabilizationTimeout { path: String, attempts: u32 },

    #[error("Rename declined for {0}")]
    Declined(String),

    // File system errors
    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // Watcher errors
    #[error("Watch error: {0}")]
    Watch(String),

    // Config errors
    #[error("Invalid config file: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Wrap an IO error raised while touching `path`.
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                Error::PermissionDenied(path.display().to_string())
            }
            _ => Error::Io(err),
        }
    }
}

impl From<notify::Error> for Error {
    fn from(err: notify::Error) -> Self {
        Error::Watch(err.to_string())
    }
}
