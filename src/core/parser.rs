//! Filename parser module.
//!
//! Works out whether a video file is a movie or a TV episode from its name
//! alone and extracts:
//! - Episode tag (`S01E23`) for television
//! - Release year for movies
//! - A cleaned-up, title-cased title
//!
//! Everything here is pure: no I/O, same input gives the same output.

use crate::models::media::{Classification, ContentType};
use crate::Result;
use regex::Regex;
use std::sync::OnceLock;

/// Extensions accepted when no list is configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["mkv", "mp4"];

fn episode_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)S[0-9]{2}E[0-9]{2}").expect("valid episode pattern"))
}

fn digit_run_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]{4,}").expect("valid digit pattern"))
}

/// Everything the parser can tell about a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    /// Movie or Television.
    pub content_type: ContentType,
    /// Normalized title, never empty.
    pub title: String,
    /// Year (movies only).
    pub year: Option<String>,
    /// Upper-cased episode tag (television only).
    pub episode_tag: Option<String>,
    /// Extension including the dot, as written.
    pub extension: String,
}

/// Filename parser with a fixed extension allow-list.
#[derive(Debug, Clone)]
pub struct NameParser {
    extensions: Vec<String>,
}

impl NameParser {
    /// Create a parser accepting `.mkv` and `.mp4`.
    pub fn new() -> Self {
        Self::with_extensions(DEFAULT_EXTENSIONS.iter().copied())
    }

    /// Create a parser with a custom allow-list (dot optional, any case).
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Check the extension against the allow-list (case-insensitive).
    pub fn is_supported(&self, name: &str) -> bool {
        split_extension(name)
            .map(|(_, ext)| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext[1..])))
            .unwrap_or(false)
    }

    /// Classify a filename as movie or television.
    ///
    /// An episode tag wins over a year. Names with neither are rejected with
    /// `AmbiguousFilename` rather than guessed at.
    pub fn classify(&self, name: &str) -> Result<Classification> {
        if !self.is_supported(name) {
            return Err(crate::Error::UnsupportedExtension(name.to_string()));
        }

        if let Some(m) = episode_regex().find(name) {
            return Ok(Classification {
                content_type: ContentType::Television,
                match_position: m.start(),
                extracted_tag: m.as_str().to_string(),
            });
        }

        if let Some((position, year)) = find_year(name) {
            return Ok(Classification {
                content_type: ContentType::Movie,
                match_position: position,
                extracted_tag: year.to_string(),
            });
        }

        Err(crate::Error::AmbiguousFilename(name.to_string()))
    }

    /// Classify a filename and extract its title.
    pub fn parse(&self, name: &str) -> Result<ParsedName> {
        let classification = self.classify(name)?;
        let title = normalize_title(&name[..classification.match_position]);
        if title.is_empty() {
            return Err(crate::Error::AmbiguousFilename(name.to_string()));
        }

        let extension = split_extension(name)
            .map(|(_, ext)| ext.to_string())
            .unwrap_or_default();

        let (year, episode_tag) = match classification.content_type {
            ContentType::Television => (None, Some(classification.extracted_tag.to_uppercase())),
            _ => (Some(classification.extracted_tag), None),
        };

        tracing::debug!(
            "Parsed {}: {} '{}' ({})",
            name,
            classification.content_type,
            title,
            year.as_deref().or(episode_tag.as_deref()).unwrap_or_default()
        );

        Ok(ParsedName {
            content_type: classification.content_type,
            title,
            year,
            episode_tag,
            extension,
        })
    }
}

impl Default for NameParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Split `name` into stem and extension (extension keeps its dot).
pub fn split_extension(name: &str) -> Option<(&str, &str)> {
    let dot = name.rfind('.')?;
    if dot + 1 == name.len() {
        return None;
    }
    Some((&name[..dot], &name[dot..]))
}

/// Find the year token: the first run of exactly four digits, falling back
/// to the first four digits of a longer run.
fn find_year(name: &str) -> Option<(usize, &str)> {
    let runs: Vec<_> = digit_run_regex().find_iter(name).collect();

    runs.iter()
        .find(|m| m.len() == 4)
        .or_else(|| runs.first())
        .map(|m| (m.start(), &name[m.start()..m.start() + 4]))
}

/// Turn the raw text before a tag into a display title.
///
/// Dots become spaces, whitespace is collapsed, and every word is
/// lower-cased with its first character upper-cased. Applying it twice
/// gives the same result as applying it once.
pub fn normalize_title(raw: &str) -> String {
    raw.replace('.', " ")
        .split_whitespace()
        .map(capitalize_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_word(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => {
            let mut upper = first.to_uppercase();
            // Keep single-character mappings only, so the word length is stable.
            let first = match (upper.next(), upper.next()) {
                (Some(c), None) => c,
                _ => first,
            };
            std::iter::once(first).chain(chars).collect()
        }
        None => String::new(),
    }
}
