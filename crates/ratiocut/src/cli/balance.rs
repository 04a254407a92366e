//! The `ratiocut balance` command.

use clap::Args;
use ratiocut_core::{auto_balance, AspectRatio, AutoBalanceMode, Config, ImageSession};
use serde::Serialize;
use std::path::PathBuf;

use super::args::{expand_path, parse_mode, parse_ratio};

/// Arguments for the `balance` command.
#[derive(Args, Debug)]
pub struct BalanceArgs {
    /// Image to analyze
    #[arg(required = true)]
    pub input: PathBuf,

    /// Analyze the centered crop of this ratio instead of the full frame
    #[arg(short, long, value_parser = parse_ratio)]
    pub ratio: Option<AspectRatio>,

    /// Only run this mode (default: all three)
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<AutoBalanceMode>,
}

#[derive(Debug, Serialize)]
struct ModeResult {
    mode: AutoBalanceMode,
    neutral: bool,
    adjustments: ratiocut_core::AdjustmentState,
}

/// Execute the balance command.
pub async fn execute(args: BalanceArgs, config: &Config) -> anyhow::Result<()> {
    let input = expand_path(&args.input);
    let mut session = ImageSession::new(config);
    session.load_path(&input).await?;
    if let Some(ratio) = args.ratio {
        session.apply_ratio(Some(ratio))?;
    }

    let snapshot = session
        .snapshot()
        .ok_or_else(|| anyhow::anyhow!("no image loaded"))?;
    let region = ratiocut_core::ProcessingPipeline::new(config)
        .extract(&snapshot.original, &snapshot.entry.crop)?;

    let modes: Vec<AutoBalanceMode> = match args.mode {
        Some(mode) => vec![mode],
        None => AutoBalanceMode::ALL.to_vec(),
    };
    let results: Vec<ModeResult> = modes
        .into_iter()
        .map(|mode| {
            let adjustments = auto_balance(&region, mode);
            tracing::debug!("{}: {:?}", mode, adjustments);
            ModeResult {
                mode,
                neutral: adjustments.is_neutral(),
                adjustments,
            }
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
