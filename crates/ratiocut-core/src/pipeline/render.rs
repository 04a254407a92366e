//! Deterministic render: crop → resample → adjust.

use image::imageops::{self, FilterType};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::adjust::{self, unsharp_mask, AdjustmentState};
use crate::config::{Config, SharpenConfig};
use crate::error::{GeometryError, PipelineError, Result};
use crate::geometry::{validate_rect, CropRect, ImageSize};
use crate::types::RasterImage;

/// Shared cancellation flag for render and export jobs.
///
/// Cancellation is cooperative: long-running work checks the flag between
/// stages and stops with [`PipelineError::RenderCancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(RenderCancelled)` once cancellation was requested.
    pub fn check(&self) -> std::result::Result<(), PipelineError> {
        if self.is_cancelled() {
            Err(PipelineError::RenderCancelled)
        } else {
            Ok(())
        }
    }
}

/// Composes crop extraction, quality resampling and the adjustment chain.
#[derive(Debug, Clone)]
pub struct ProcessingPipeline {
    filter: FilterType,
    sharpen: SharpenConfig,
    preview_max_width: u32,
}

impl ProcessingPipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            filter: config.processing.resample_method.filter(),
            sharpen: config.sharpen.clone(),
            preview_max_width: config.processing.preview_max_width,
        }
    }

    /// Render `crop` of `original` at `target_width` (native when `None`) with `state`.
    ///
    /// Identical inputs always produce byte-identical output.
    pub fn render(
        &self,
        original: &RasterImage,
        crop: &CropRect,
        target_width: Option<u32>,
        state: &AdjustmentState,
    ) -> Result<RasterImage> {
        self.render_cancellable(original, crop, target_width, state, &CancelFlag::new())
    }

    /// [`ProcessingPipeline::render`] with a cancellation check between stages.
    pub fn render_cancellable(
        &self,
        original: &RasterImage,
        crop: &CropRect,
        target_width: Option<u32>,
        state: &AdjustmentState,
        cancel: &CancelFlag,
    ) -> Result<RasterImage> {
        state.validate()?;
        let start = Instant::now();

        let extracted = self.extract(original, crop)?;
        tracing::trace!("  Extract: {:?}", start.elapsed());
        cancel.check()?;

        let resample_start = Instant::now();
        let resized = match target_width {
            Some(width) => self.resize_with_quality(&extracted, width)?,
            None => extracted,
        };
        tracing::trace!("  Resample: {:?}", resample_start.elapsed());
        cancel.check()?;

        let adjust_start = Instant::now();
        let output = adjust::apply(&resized, state)?;
        tracing::trace!("  Adjust: {:?}", adjust_start.elapsed());
        cancel.check()?;

        tracing::debug!(
            "Rendered {}x{} in {:?}",
            output.width(),
            output.height(),
            start.elapsed()
        );
        Ok(output)
    }

    /// Copy the crop region out of `original`. A full-image crop shares the buffer.
    pub fn extract(
        &self,
        original: &RasterImage,
        crop: &CropRect,
    ) -> std::result::Result<RasterImage, GeometryError> {
        let size = ImageSize::new(original.width(), original.height());
        validate_rect(crop, size, None)?;
        if *crop == CropRect::full(size) {
            return Ok(original.clone());
        }
        let region = imageops::crop_imm(original.as_rgb(), crop.x, crop.y, crop.width, crop.height);
        Ok(RasterImage::new(region.to_image()))
    }

    /// Resample to `target_width` keeping the aspect ratio, then sharpen.
    ///
    /// The same filter serves upscale and downscale. When the size does not
    /// change, no resampling or sharpening happens.
    pub fn resize_with_quality(
        &self,
        raster: &RasterImage,
        target_width: u32,
    ) -> std::result::Result<RasterImage, PipelineError> {
        if target_width == 0 {
            return Err(PipelineError::Resample(
                "target width must be greater than 0".to_string(),
            ));
        }
        let (width, height) = (raster.width(), raster.height());
        if width == 0 || height == 0 {
            return Err(PipelineError::Resample(format!(
                "cannot resample a {width}x{height} image"
            )));
        }
        let target_height = scaled_height(width, height, target_width);
        if (target_width, target_height) == (width, height) {
            return Ok(raster.clone());
        }

        let resized = imageops::resize(raster.as_rgb(), target_width, target_height, self.filter);
        let sharpened = if self.sharpen.amount > 0.0 {
            unsharp_mask(
                &resized,
                self.sharpen.radius,
                self.sharpen.amount,
                self.sharpen.threshold,
            )
        } else {
            resized
        };
        Ok(RasterImage::new(sharpened))
    }

    /// Width an interactive preview of `crop` should be rendered at.
    pub fn preview_width(&self, crop: &CropRect) -> Option<u32> {
        (crop.width > self.preview_max_width).then_some(self.preview_max_width)
    }
}

/// Height matching `target_width` at the source aspect ratio, at least 1.
pub fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    let h = (target_width as f64 * height as f64 / width as f64).round();
    (h as u32).max(1)
}
