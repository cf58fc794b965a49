//! File system utilities.
//!
//! Ingestion only needs five primitives, collected in the [`FileSystem`]
//! trait so tests can substitute their own.

use crate::Result;
use fs2::FileExt;
use std::fs::File;
use std::io;
use std::path::Path;

/// Filesystem operations the ingestion pipeline depends on.
pub trait FileSystem: Send + Sync {
    /// Open the file for reading without sharing and return its length.
    fn open_exclusive(&self, path: &Path) -> io::Result<u64>;

    /// Whether anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Rename a file within its directory.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create a directory and all missing parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Move a file, possibly across filesystems.
    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl FileSystem for RealFs {
    fn open_exclusive(&self, path: &Path) -> io::Result<u64> {
        let file = File::open(path)?;
        file.try_lock_exclusive()?;
        let len = file.metadata().map(|m| m.len());
        let _ = FileExt::unlock(&file);
        len
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        // Try rename first (fast, same filesystem)
        if std::fs::rename(from, to).is_ok() {
            return Ok(());
        }

        // Fall back to copy + delete (cross filesystem)
        std::fs::copy(from, to)?;
        std::fs::remove_file(from)
    }
}

/// Check if a path exists and is a directory.
pub fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(crate::Error::PathNotFound(path.display().to_string()));
    }
    if !path.is_dir() {
        return Err(crate::Error::NotADirectory(path.display().to_string()));
    }
    Ok(())
}

/// File name component of a path as a string.
pub fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().to_string())
}
