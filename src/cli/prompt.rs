//! Interactive rename confirmation.

use crate::core::ingest::{is_affirmative, Confirm};
use crate::models::media::MediaItem;
use colored::Colorize;
use std::io::{BufRead, Write};
use tokio_util::sync::CancellationToken;

/// Asks on stdin before every rename.
///
/// Reading happens on a blocking thread so change notifications keep being
/// admitted while the prompt is open. Shutdown counts as "no".
#[derive(Debug, Clone)]
pub struct PromptConfirm {
    shutdown: CancellationToken,
}

impl PromptConfirm {
    /// Create a prompt that gives up when `shutdown` is cancelled.
    pub fn new(shutdown: CancellationToken) -> Self {
        Self { shutdown }
    }
}

impl Confirm for PromptConfirm {
    async fn confirm(&self, item: &MediaItem) -> bool {
        println!();
        println!("{} {}", "Input file:      ".bold(), item.original_name);
        println!("{} {}", "File type:       ".bold(), item.content_type);
        println!(
            "{} {}",
            "Recommended name:".bold(),
            item.proposed_name.as_deref().unwrap_or_default().cyan()
        );
        if let Some(dest) = &item.destination_path {
            println!("{} {}", "Destination:     ".bold(), dest.display());
        }
        print!("{} ", "Accept rename? Y/N:".bold());
        let _ = std::io::stdout().flush();

        let read = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        });

        tokio::select! {
            _ = self.shutdown.cancelled() => false,
            answer = read => match answer {
                Ok(Ok(line)) => is_affirmative(&line),
                Ok(Err(e)) => {
                    tracing::warn!("Failed to read answer: {}", e);
                    false
                }
                Err(e) => {
                    tracing::warn!("Prompt task failed: {}", e);
                    false
                }
            },
        }
    }
}
