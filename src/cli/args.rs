//! Command line argument definitions.

use clap::Parser;
use std::path::PathBuf;

/// Media Sorter - File new downloads into your movie and TV library
#[derive(Parser, Debug)]
#[command(name = "media-sorter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to watch for new video files
    #[arg(value_name = "WATCH_DIR")]
    pub watch_dir: PathBuf,

    /// Movies library root
    #[arg(value_name = "MOVIES_DIR")]
    pub movies_dir: PathBuf,

    /// Television library root
    #[arg(value_name = "TV_DIR")]
    pub tv_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Config file (default: <config dir>/media_sorter/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Approve every proposed rename without prompting
    #[arg(short, long)]
    pub yes: bool,

    /// Process files already in the watch directory at startup
    #[arg(long)]
    pub scan_existing: bool,

    /// Milliseconds between availability checks
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Give up on a file after this many availability checks
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,
}

impl Cli {
    /// Apply command line overrides on top of a loaded config.
    pub fn apply_to(&self, config: &mut crate::models::config::Config) {
        if let Some(ms) = self.poll_interval_ms {
            config.stabilizer.poll_interval_ms = ms;
        }
        if self.max_attempts.is_some() {
            config.stabilizer.max_attempts = self.max_attempts;
        }
        if self.yes {
            config.ingest.auto_confirm = true;
        }
        if self.scan_existing {
            config.ingest.scan_existing = true;
        }
    }
}
