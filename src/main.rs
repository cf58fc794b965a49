//! Media Sorter CLI
//!
//! Watches a directory and files new movies and TV episodes into a library.

use clap::Parser;
use media_sorter::cli::{
    args::Cli,
    commands::watch::{self, Directories},
    runtime,
};
use media_sorter::models::config;
use tokio_util::sync::CancellationToken;

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    runtime::block_on(run(cli))?
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load config, then let flags override it
    let mut config = config::load_config(cli.config.as_deref())?;
    cli.apply_to(&mut config);

    let dirs = Directories {
        watch: &cli.watch_dir,
        movies: &cli.movies_dir,
        tv: &cli.tv_dir,
    };

    // Stop cleanly on Ctrl-C
    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutting down...");
            signal.cancel();
        }
    });

    watch::watch(dirs, &config, shutdown).await?;

    Ok(())
}

/// Initialize the logging system.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("media_sorter=debug")
    } else {
        EnvFilter::new("media_sorter=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
