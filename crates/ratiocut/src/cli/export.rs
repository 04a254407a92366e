//! The `ratiocut export` command.

use clap::Args;
use ratiocut_core::{
    read_source_metadata, AdjustmentState, AspectRatio, AutoBalanceMode, Config, CropRect,
    ExportService, ImageSession, MetadataMap, RgbBalance, WrittenFile,
};
use serde::Serialize;
use std::path::PathBuf;

use super::args::{expand_path, parse_crop, parse_meta, parse_mode, parse_ratio, parse_rgb};

/// Arguments for the `export` command.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Image to edit (JPEG, PNG, WebP, BMP or TIFF)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Base path for the variants; its directory and stem name the files (defaults to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Lock the crop to a ratio, e.g. 16:9, 4x3, 1.5
    #[arg(short, long, value_parser = parse_ratio)]
    pub ratio: Option<AspectRatio>,

    /// Explicit crop as x,y,width,height (must honor --ratio when both are given)
    #[arg(long, value_parser = parse_crop)]
    pub crop: Option<CropRect>,

    /// Derive adjustments from the cropped histogram: aggressive, conservative, color-only
    #[arg(long, value_parser = parse_mode)]
    pub auto_balance: Option<AutoBalanceMode>,

    /// Brightness factor (0.2 - 3.0)
    #[arg(long)]
    pub brightness: Option<f32>,

    /// Contrast factor (0.2 - 3.0)
    #[arg(long)]
    pub contrast: Option<f32>,

    /// Saturation factor (0.2 - 3.0)
    #[arg(long)]
    pub saturation: Option<f32>,

    /// Sharpness factor (0.2 - 3.0)
    #[arg(long)]
    pub sharpness: Option<f32>,

    /// Color temperature shift (-100 - 100, positive is warmer)
    #[arg(long, allow_hyphen_values = true)]
    pub temperature: Option<i32>,

    /// RGB balance offsets as r,g,b (each -100 - 100)
    #[arg(long, value_parser = parse_rgb, allow_hyphen_values = true)]
    pub rgb: Option<RgbBalance>,

    /// Metadata entry to embed, repeatable (key=value)
    #[arg(short, long = "meta", value_parser = parse_meta)]
    pub meta: Vec<(String, String)>,

    /// File with key=value metadata lines to embed
    #[arg(long)]
    pub meta_file: Option<PathBuf>,

    /// Don't pre-fill metadata from the source's EXIF
    #[arg(long)]
    pub no_exif: bool,
}

impl ExportArgs {
    /// `base` with every adjustment flag that was given applied on top.
    fn adjustments_over(&self, base: AdjustmentState) -> Option<AdjustmentState> {
        let touched = self.brightness.is_some()
            || self.contrast.is_some()
            || self.saturation.is_some()
            || self.sharpness.is_some()
            || self.temperature.is_some()
            || self.rgb.is_some();
        touched.then(|| AdjustmentState {
            brightness: self.brightness.unwrap_or(base.brightness),
            contrast: self.contrast.unwrap_or(base.contrast),
            saturation: self.saturation.unwrap_or(base.saturation),
            sharpness: self.sharpness.unwrap_or(base.sharpness),
            temperature: self.temperature.unwrap_or(base.temperature),
            rgb_balance: self.rgb.unwrap_or(base.rgb_balance),
        })
    }
}

/// JSON summary printed on success.
#[derive(Debug, Serialize)]
struct ExportReport {
    input: PathBuf,
    crop: CropRect,
    ratio: Option<String>,
    adjustments: AdjustmentState,
    metadata: MetadataMap,
    files: Vec<WrittenFile>,
}

/// Execute the export command.
pub async fn execute(args: ExportArgs, config: &Config) -> anyhow::Result<()> {
    let input = expand_path(&args.input);
    let base_path = args
        .output
        .as_deref()
        .map(expand_path)
        .unwrap_or_else(|| input.clone());

    let mut session = ImageSession::new(config);
    session.load_path(&input).await?;

    // Discrete edits, in the order an interactive user would commit them.
    if let Some(ratio) = args.ratio {
        session.apply_ratio(Some(ratio))?;
    }
    if let Some(crop) = args.crop {
        session.apply_crop(crop)?;
    }
    if let Some(mode) = args.auto_balance {
        session.apply_auto_balance(mode)?;
    }
    let current = session
        .current_entry()
        .map(|e| e.adjustments)
        .unwrap_or(AdjustmentState::NEUTRAL);
    if let Some(state) = args.adjustments_over(current) {
        session.apply_adjustment(state)?;
    }

    let metadata = collect_metadata(&args, &input)?;
    let snapshot = session
        .snapshot()
        .ok_or_else(|| anyhow::anyhow!("no image loaded"))?;
    let entry = snapshot.entry.clone();

    let job = ExportService::new(config).spawn_export(snapshot, base_path, metadata.clone());
    let cancel = job.cancel_flag();
    let wait = job.wait();
    tokio::pin!(wait);
    let files = tokio::select! {
        result = &mut wait => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, stopping after the current variant");
            cancel.cancel();
            wait.await?
        }
    };
    session.mark_saved();

    let report = ExportReport {
        input,
        crop: entry.crop,
        ratio: entry.ratio.map(|r| r.label()),
        adjustments: entry.adjustments,
        metadata,
        files,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// EXIF pre-fill, then the metadata file, then `--meta` pairs; later entries replace earlier ones.
fn collect_metadata(args: &ExportArgs, input: &std::path::Path) -> anyhow::Result<MetadataMap> {
    let mut metadata = if args.no_exif {
        MetadataMap::new()
    } else {
        read_source_metadata(input)
    };
    if let Some(path) = &args.meta_file {
        let text = std::fs::read_to_string(expand_path(path))?;
        for (key, value) in MetadataMap::parse_text(&text).iter() {
            metadata.insert(key, value);
        }
    }
    for (key, value) in &args.meta {
        metadata.insert(key.as_str(), value.as_str());
    }
    Ok(metadata)
}
