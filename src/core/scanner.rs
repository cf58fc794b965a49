//! Startup scanner module.
//!
//! Lists files already sitting in the watch directory so they can be fed
//! through admission as if they had just been written.

use crate::core::watcher::{ChangeEvent, ChangeKind};
use crate::Result;
use std::path::Path;
use walkdir::WalkDir;

/// Collect synthetic `Modified` events for files at the top level of `dir`.
///
/// Hidden files (leading dot) are skipped. Results are sorted by name so
/// files are offered in a predictable order.
pub fn scan_existing(dir: &Path) -> Result<Vec<ChangeEvent>> {
    crate::utils::fs::ensure_directory(dir)?;

    let mut events: Vec<ChangeEvent> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|e| ChangeEvent::from_path(e.path(), ChangeKind::Modified))
        .collect();

    events.sort_by(|a, b| a.name.cmp(&b.name));

    tracing::info!("Found {} existing file(s) in {}", events.len(), dir.display());

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_existing_top_level_only() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.2001.mkv"), "x").unwrap();
        fs::write(temp_dir.path().join("a.1999.mp4"), "x").unwrap();
        fs::write(temp_dir.path().join(".hidden.mkv"), "x").unwrap();
        fs::create_dir(temp_dir.path().join("nested")).unwrap();
        fs::write(temp_dir.path().join("nested").join("c.2002.mkv"), "x").unwrap();

        let events = scan_existing(temp_dir.path()).unwrap();
        let names: Vec<_> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.1999.mp4", "b.2001.mkv"]);
        assert!(events.iter().all(|e| e.kind == ChangeKind::Modified));
    }

    #[test]
    fn test_scan_nonexistent_path() {
        assert!(scan_existing(Path::new("/nonexistent/path")).is_err());
    }
}
