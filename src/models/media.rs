//! Media-related data models.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Content type inferred from a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Unknown,
    Movie,
    Television,
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentType::Unknown => write!(f, "unknown"),
            ContentType::Movie => write!(f, "movie"),
            ContentType::Television => write!(f, "television"),
        }
    }
}

/// Result of classifying a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Movie or Television, never Unknown.
    pub content_type: ContentType,
    /// Byte offset where the tag starts in the filename.
    pub match_position: usize,
    /// Matched year or episode tag, verbatim.
    pub extracted_tag: String,
}

/// One file currently being ingested.
#[derive(Debug, Clone)]
pub struct MediaItem {
    /// Correlation id used in log lines.
    pub id: Uuid,
    /// When the first admitted notification arrived.
    pub detected_at: DateTime<Utc>,
    /// Full path as first observed.
    pub original_path: PathBuf,
    /// File name as first observed.
    pub original_name: String,
    /// Set once by classification.
    pub content_type: ContentType,
    /// Normalized title.
    pub title: Option<String>,
    /// Four-digit year (movies only).
    pub year: Option<String>,
    /// Upper-cased `SNNENN` tag (television only).
    pub episode_tag: Option<String>,
    /// Extension including the leading dot, as written in the filename.
    pub extension: Option<String>,
    /// Canonical file name, defined after classification.
    pub proposed_name: Option<String>,
    /// Same-directory path of the renamed file.
    pub proposed_path: Option<PathBuf>,
    /// Planned library location.
    pub destination_path: Option<PathBuf>,
    /// Library location after a successful move.
    pub final_destination_path: Option<PathBuf>,
    /// True once the file is fully written and unlocked.
    pub available: bool,
}

impl MediaItem {
    /// Create a new, unclassified item.
    pub fn new(name: impl Into<String>, full_path: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            detected_at: Utc::now(),
            original_path: full_path.into(),
            original_name: name.into(),
            content_type: ContentType::Unknown,
            title: None,
            year: None,
            episode_tag: None,
            extension: None,
            proposed_name: None,
            proposed_path: None,
            destination_path: None,
            final_destination_path: None,
            available: false,
        }
    }

    /// Directory containing the original file.
    pub fn source_dir(&self) -> &Path {
        self.original_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Whether the item has been classified.
    pub fn is_classified(&self) -> bool {
        self.content_type != ContentType::Unknown
    }
}
