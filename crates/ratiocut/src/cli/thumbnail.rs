//! The `ratiocut thumbnail` command.

use clap::Args;
use ratiocut_core::{Config, ThumbnailCache};
use serde::Serialize;
use std::path::PathBuf;

use super::args::expand_path;

/// Arguments for the `thumbnail` command.
#[derive(Args, Debug)]
pub struct ThumbnailArgs {
    /// Image to preview
    #[arg(required = true)]
    pub input: PathBuf,

    /// Cache directory (defaults to the configured thumbnail directory)
    #[arg(long, env = "RATIOCUT_THUMBNAIL_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Also write the thumbnail to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ThumbnailReport {
    source: PathBuf,
    cache_file: PathBuf,
    width: u32,
    height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<PathBuf>,
}

/// Execute the thumbnail command.
pub async fn execute(args: ThumbnailArgs, config: &Config) -> anyhow::Result<()> {
    let input = expand_path(&args.input);
    let cache = match &args.cache_dir {
        Some(dir) => ThumbnailCache::with_dir(config, expand_path(dir)),
        None => ThumbnailCache::new(config),
    };

    let Some(thumb) = cache.thumbnail_for(&input).await else {
        anyhow::bail!("No thumbnail available for {}", input.display());
    };

    let output = args.output.as_deref().map(expand_path);
    if let Some(path) = &output {
        thumb.as_rgb().save(path)?;
    }

    let report = ThumbnailReport {
        source: input.clone(),
        cache_file: cache.file_for(&input),
        width: thumb.width(),
        height: thumb.height(),
        output,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
