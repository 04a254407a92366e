//! Ratiocut CLI - headless driver for ratio-locked cropping and WebP variant export.
//!
//! Each invocation opens one image, applies the requested crop and color
//! edits through an editing session, and writes the variant set next to
//! the output path. Results are printed to stdout as JSON.
//!
//! # Usage
//!
//! ```bash
//! # 16:9 crop, brighter, export 4K/1080p/720p variants
//! ratiocut export dunes.jpg --ratio 16:9 --brightness 1.2 --contrast 1.1
//!
//! # Let the conservative heuristic pick the adjustments
//! ratiocut export harbor.png --ratio 1:1 --auto-balance conservative
//!
//! # Compare the auto-balance heuristics
//! ratiocut balance harbor.png
//!
//! # Cached 256px preview
//! ratiocut thumbnail harbor.png
//!
//! # View configuration
//! ratiocut config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Ratiocut - ratio-locked cropping, color correction and WebP variant export.
#[derive(Parser, Debug)]
#[command(name = "ratiocut")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Crop, adjust and export an image as three WebP variants
    Export(cli::export::ExportArgs),

    /// Show the adjustments each auto-balance mode derives for an image
    Balance(cli::balance::BalanceArgs),

    /// Look up or generate a cached thumbnail
    Thumbnail(cli::thumbnail::ThumbnailArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match ratiocut_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `ratiocut config path`."
            );
            ratiocut_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Ratiocut v{}", ratiocut_core::VERSION);

    match cli.command {
        Commands::Export(args) => cli::export::execute(args, &config).await,
        Commands::Balance(args) => cli::balance::execute(args, &config).await,
        Commands::Thumbnail(args) => cli::thumbnail::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
