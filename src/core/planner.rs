//! Destination planner module.
//!
//! Turns a classified item into:
//! - A canonical file name (`Title (Year).ext` or `Title - S01E05.ext`)
//! - A library path under the movies or television root
//!
//! No filesystem access happens here; directory creation and collision
//! checks belong to the ingestion step that performs the move.

use crate::models::media::{ContentType, MediaItem};
use crate::Result;
use std::path::{Path, PathBuf};

/// Library roots the planner files items under.
#[derive(Debug, Clone)]
pub struct PathPlanner {
    movies_root: PathBuf,
    tv_root: PathBuf,
}

impl PathPlanner {
    /// Create a planner for the given library roots.
    pub fn new(movies_root: impl Into<PathBuf>, tv_root: impl Into<PathBuf>) -> Self {
        Self {
            movies_root: movies_root.into(),
            tv_root: tv_root.into(),
        }
    }

    /// Compute the library path for a classified item.
    pub fn plan(&self, item: &MediaItem) -> Result<PathBuf> {
        plan(item, &self.movies_root, &self.tv_root)
    }
}

/// Canonical file name for a classified item.
///
/// Format: `${title} (${year})${ext}` for movies and
/// `${title} - ${episodeTag}${ext}` for television.
pub fn proposed_name(item: &MediaItem) -> Result<String> {
    let (title, ext) = title_and_extension(item)?;

    match item.content_type {
        ContentType::Movie => {
            let year = required(&item.year, "year", item)?;
            Ok(format!("{} ({}){}", title, year, ext))
        }
        ContentType::Television => {
            let tag = required(&item.episode_tag, "episode tag", item)?;
            Ok(format!("{} - {}{}", title, tag, ext))
        }
        ContentType::Unknown => Err(unclassified(item)),
    }
}

/// Compute the library path for a classified item.
///
/// Movies go to `${moviesRoot}/${title} (${year})${ext}`; episodes go to
/// `${tvRoot}/${title}/Season ${season}/${title} - ${episodeTag}${ext}`.
pub fn plan(item: &MediaItem, movies_root: &Path, tv_root: &Path) -> Result<PathBuf> {
    let name = proposed_name(item)?;

    match item.content_type {
        ContentType::Movie => Ok(movies_root.join(name)),
        ContentType::Television => {
            let (title, _) = title_and_extension(item)?;
            let tag = required(&item.episode_tag, "episode tag", item)?;
            let season = season_number(tag)?;
            Ok(tv_root
                .join(title)
                .join(season_folder(season))
                .join(name))
        }
        ContentType::Unknown => Err(unclassified(item)),
    }
}

/// Season folder name, without zero padding.
pub fn season_folder(season: u32) -> String {
    format!("Season {}", season)
}

/// Parse the season number out of an `SNNENN` tag.
pub fn season_number(episode_tag: &str) -> Result<u32> {
    let invalid = || crate::Error::InvalidSeasonToken(episode_tag.to_string());

    let upper = episode_tag.to_uppercase();
    let rest = upper.strip_prefix('S').ok_or_else(invalid)?;
    let end = rest.find('E').ok_or_else(invalid)?;
    let digits = &rest[..end];

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    digits.parse::<u32>().map_err(|_| invalid())
}

fn title_and_extension(item: &MediaItem) -> Result<(&str, &str)> {
    let title = required(&item.title, "title", item)?;
    Ok((title, item.extension.as_deref().unwrap_or_default()))
}

fn required<'a>(field: &'a Option<String>, what: &str, item: &MediaItem) -> Result<&'a str> {
    field
        .as_deref()
        .ok_or_else(|| crate::Error::other(format!("{} has no {}", item.original_name, what)))
}

fn unclassified(item: &MediaItem) -> crate::Error {
    crate::Error::other(format!("{} has not been classified", item.original_name))
}
