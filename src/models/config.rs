//! Configuration model.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stabilizer configuration.
    pub stabilizer: StabilizerConfig,
    /// Ingestion configuration.
    pub ingest: IngestConfig,
}

/// Stabilizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Delay between availability checks, in milliseconds.
    pub poll_interval_ms: u64,
    /// Give up after this many checks. `None` polls forever.
    pub max_attempts: Option<u32>,
}

/// Ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Accepted extensions, without the dot.
    pub extensions: Vec<String>,
    /// Approve every proposed rename without prompting.
    pub auto_confirm: bool,
    /// Feed files already in the watch directory through ingestion at startup.
    pub scan_existing: bool,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            max_attempts: None,
        }
    }
}

impl StabilizerConfig {
    /// Poll interval as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["mkv".to_string(), "mp4".to_string()],
            auto_confirm: false,
            scan_existing: false,
        }
    }
}

/// Get the configuration directory path.
fn dirs_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("media_sorter")
}

/// Default location of the config file.
pub fn default_config_path() -> PathBuf {
    dirs_config_path().join("config.toml")
}

/// Load configuration from file.
///
/// An explicit path must exist and parse. Without one, the default location
/// is tried and defaults are used when it is missing or unreadable.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| crate::Error::Config(format!("{}: {}", path.display(), e)))?;
            parse_config(&content)
        }
        None => {
            let config_path = default_config_path();
            if let Ok(content) = std::fs::read_to_string(&config_path) {
                match parse_config(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Ignoring {}: {}", config_path.display(), e),
                }
            }
            Ok(Config::default())
        }
    }
}

/// Parse a TOML config document.
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.stabilizer.poll_interval_ms, 1000);
        assert!(config.stabilizer.max_attempts.is_none());
        assert_eq!(config.ingest.extensions, vec!["mkv", "mp4"]);
        assert!(!config.ingest.auto_confirm);
    }

    #[test]
    fn test_parse_partial_config() {
        let config = parse_config(
            r#"
            [stabilizer]
            max_attempts = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.stabilizer.max_attempts, Some(30));
        assert_eq!(config.stabilizer.poll_interval_ms, 1000);
        assert_eq!(config.ingest.extensions.len(), 2);
    }

    #[test]
    fn test_parse_invalid_config() {
        assert!(matches!(
            parse_config("[stabilizer]\npoll_interval_ms = \"fast\""),
            Err(crate::Error::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_explicit_config() {
        let result = load_config(Some(Path::new("/nonexistent/config.toml")));
        assert!(result.is_err());
    }
}
