//! Editing session: original raster, committed history, preview renders.
//!
//! ```text
//! Empty ──load──▶ Loaded ──apply_*──▶ Edited ⟲ apply_* / undo / redo
//!                   ▲                    │
//!                   └──reset_to_original─┘
//! ```
//!
//! State-changing commands take `&mut self`, so a session has exactly one
//! writer. Commits are synchronous and cheap (a state copy). Pixel work is
//! handed back as a [`RenderTask`] that runs on a blocking thread; issuing a
//! new task cancels the previous one, and only a render for the current
//! entry is ever installed as the preview.

mod history;

pub use history::{HistoryEntry, HistoryStack};

use std::path::{Path, PathBuf};

use crate::adjust::{auto_balance, AdjustmentState, AutoBalanceMode};
use crate::config::Config;
use crate::error::{PipelineError, Result, SessionError};
use crate::geometry::{compute_initial_rect, validate_rect, AspectRatio, CropRect, ImageSize};
use crate::pipeline::{CancelFlag, ImageDecoder, ProcessingPipeline};
use crate::types::RasterImage;

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Empty,
    Loaded,
    Edited,
}

/// A render produced for one history entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPreview {
    pub sequence_id: u64,
    pub raster: RasterImage,
}

/// The committed state export reads from.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub original: RasterImage,
    pub entry: HistoryEntry,
    pub source_path: Option<PathBuf>,
}

/// A pending preview render for one committed entry.
///
/// Dropping the task discards the work. Running it after it was superseded
/// yields [`PipelineError::RenderCancelled`].
#[derive(Debug)]
pub struct RenderTask {
    pipeline: ProcessingPipeline,
    original: RasterImage,
    entry: HistoryEntry,
    target_width: Option<u32>,
    cancel: CancelFlag,
}

impl RenderTask {
    pub fn sequence_id(&self) -> u64 {
        self.entry.sequence_id
    }

    /// Flag that cancels this render.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Render on the calling thread.
    pub fn run_blocking(self) -> Result<RenderedPreview> {
        let raster = self.pipeline.render_cancellable(
            &self.original,
            &self.entry.crop,
            self.target_width,
            &self.entry.adjustments,
            &self.cancel,
        )?;
        Ok(RenderedPreview {
            sequence_id: self.entry.sequence_id,
            raster,
        })
    }

    /// Render on tokio's blocking pool.
    pub async fn run(self) -> Result<RenderedPreview> {
        match tokio::task::spawn_blocking(move || self.run_blocking()).await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(PipelineError::RenderCancelled.into()),
            Err(e) => Err(PipelineError::Resample(format!("render task failed: {e}")).into()),
        }
    }
}

/// Single-owner editing session over one image.
pub struct ImageSession {
    pipeline: ProcessingPipeline,
    decoder: ImageDecoder,
    history: HistoryStack,
    original: Option<RasterImage>,
    source_path: Option<PathBuf>,
    phase: SessionPhase,
    preview: Option<RenderedPreview>,
    in_flight: Option<CancelFlag>,
    saved_sequence: Option<u64>,
}

impl ImageSession {
    pub fn new(config: &Config) -> Self {
        Self {
            pipeline: ProcessingPipeline::new(config),
            decoder: ImageDecoder::new(config.limits.clone()),
            history: HistoryStack::new(config.history.capacity),
            original: None,
            source_path: None,
            phase: SessionPhase::Empty,
            preview: None,
            in_flight: None,
            saved_sequence: None,
        }
    }

    /// Start over with `raster`: full-image crop, neutral adjustments.
    pub fn load(&mut self, raster: RasterImage) {
        self.cancel_in_flight();
        let size = ImageSize::new(raster.width(), raster.height());
        let seq = self
            .history
            .reset(CropRect::full(size), None, AdjustmentState::NEUTRAL)
            .sequence_id;
        tracing::debug!(
            width = size.width,
            height = size.height,
            "Session loaded"
        );
        self.original = Some(raster);
        self.source_path = None;
        self.preview = None;
        self.saved_sequence = Some(seq);
        self.phase = SessionPhase::Loaded;
    }

    /// Decode `path` and load it. On failure the session is left untouched.
    pub async fn load_path(&mut self, path: &Path) -> std::result::Result<(), SessionError> {
        let decoded = self.decoder.decode(path).await?;
        self.load(decoded.raster);
        self.source_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Commit a new crop, validated against the active ratio lock.
    pub fn apply_crop(&mut self, rect: CropRect) -> std::result::Result<RenderTask, SessionError> {
        let (size, current) = self.loaded()?;
        validate_rect(&rect, size, current.ratio)?;
        let (ratio, adjustments) = (current.ratio, current.adjustments);
        self.commit(rect, ratio, adjustments)
    }

    /// Lock to `ratio` with the largest centered crop, or unlock with `None`.
    pub fn apply_ratio(
        &mut self,
        ratio: Option<AspectRatio>,
    ) -> std::result::Result<RenderTask, SessionError> {
        let (size, current) = self.loaded()?;
        let (crop, adjustments) = (current.crop, current.adjustments);
        let crop = match ratio {
            Some(r) => compute_initial_rect(size, r)?,
            None => crop,
        };
        self.commit(crop, ratio, adjustments)
    }

    /// Commit new adjustment values; out-of-range values are rejected.
    pub fn apply_adjustment(
        &mut self,
        state: AdjustmentState,
    ) -> std::result::Result<RenderTask, SessionError> {
        state.validate()?;
        let (_, current) = self.loaded()?;
        let (crop, ratio) = (current.crop, current.ratio);
        self.commit(crop, ratio, state)
    }

    /// Replace the adjustments with ones derived from the cropped original.
    pub fn apply_auto_balance(
        &mut self,
        mode: AutoBalanceMode,
    ) -> std::result::Result<RenderTask, SessionError> {
        let (_, current) = self.loaded()?;
        let (crop, ratio) = (current.crop, current.ratio);
        let original = self.original.as_ref().ok_or(SessionError::NoImage)?;
        let region = self.pipeline.extract(original, &crop)?;
        let state = auto_balance(&region, mode);
        self.commit(crop, ratio, state)
    }

    /// Step back one entry. `Ok(false)` when already at the oldest entry.
    pub fn undo(&mut self) -> std::result::Result<bool, SessionError> {
        self.loaded()?;
        let moved = self.history.undo().is_some();
        if moved {
            self.cancel_in_flight();
            tracing::debug!(cursor = self.history.cursor(), "Undo");
        }
        Ok(moved)
    }

    /// Step forward one entry. `Ok(false)` when already at the newest entry.
    pub fn redo(&mut self) -> std::result::Result<bool, SessionError> {
        self.loaded()?;
        let moved = self.history.redo().is_some();
        if moved {
            self.cancel_in_flight();
            tracing::debug!(cursor = self.history.cursor(), "Redo");
        }
        Ok(moved)
    }

    /// Collapse history to the neutral full-image entry.
    pub fn reset_to_original(&mut self) -> std::result::Result<(), SessionError> {
        let (size, _) = self.loaded()?;
        self.cancel_in_flight();
        self.history
            .reset(CropRect::full(size), None, AdjustmentState::NEUTRAL);
        self.preview = None;
        self.phase = SessionPhase::Loaded;
        tracing::debug!("Session reset to original");
        Ok(())
    }

    /// Preview for the current entry, rendered now if not cached.
    pub fn current_render(&mut self) -> Result<RasterImage> {
        let (_, current) = self.loaded()?;
        let seq = current.sequence_id;
        if let Some(preview) = self.preview.as_ref().filter(|p| p.sequence_id == seq) {
            return Ok(preview.raster.clone());
        }
        let rendered = self.render_task(CancelFlag::new())?.run_blocking()?;
        let raster = rendered.raster.clone();
        self.preview = Some(rendered);
        Ok(raster)
    }

    /// Task rendering the current entry, superseding any earlier task.
    pub fn request_render(&mut self) -> std::result::Result<RenderTask, SessionError> {
        let cancel = self.issue_cancel_flag();
        self.render_task(cancel)
    }

    /// Install a finished render. Returns `false` (and drops it) when it is
    /// not for the current entry.
    pub fn install_preview(&mut self, rendered: RenderedPreview) -> bool {
        let current = self.history.current().map(|e| e.sequence_id);
        if current != Some(rendered.sequence_id) {
            tracing::trace!(
                sequence_id = rendered.sequence_id,
                "Discarding superseded preview"
            );
            return false;
        }
        self.preview = Some(rendered);
        true
    }

    /// Committed state for export.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        let original = self.original.clone()?;
        let entry = self.history.current()?.clone();
        Some(SessionSnapshot {
            original,
            entry,
            source_path: self.source_path.clone(),
        })
    }

    /// Record that the current entry has been exported.
    pub fn mark_saved(&mut self) {
        self.saved_sequence = self.history.current().map(|e| e.sequence_id);
    }

    /// Whether the current entry differs from the last loaded or saved one.
    pub fn has_unsaved_changes(&self) -> bool {
        match (self.history.current(), self.saved_sequence) {
            (Some(entry), Some(saved)) => entry.sequence_id != saved,
            _ => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn current_entry(&self) -> Option<&HistoryEntry> {
        self.history.current()
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn original(&self) -> Option<&RasterImage> {
        self.original.as_ref()
    }

    pub fn image_size(&self) -> Option<ImageSize> {
        self.original
            .as_ref()
            .map(|r| ImageSize::new(r.width(), r.height()))
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Image size and current entry, or `NoImage`.
    fn loaded(&self) -> std::result::Result<(ImageSize, HistoryEntry), SessionError> {
        let size = self.image_size().ok_or(SessionError::NoImage)?;
        let entry = self.history.current().ok_or(SessionError::NoImage)?;
        Ok((size, entry.clone()))
    }

    fn commit(
        &mut self,
        crop: CropRect,
        ratio: Option<AspectRatio>,
        adjustments: AdjustmentState,
    ) -> std::result::Result<RenderTask, SessionError> {
        let seq = self.history.push(crop, ratio, adjustments).sequence_id;
        self.phase = SessionPhase::Edited;
        tracing::debug!(sequence_id = seq, ?crop, "Committed history entry");
        self.request_render()
    }

    fn render_task(&self, cancel: CancelFlag) -> std::result::Result<RenderTask, SessionError> {
        let original = self.original.clone().ok_or(SessionError::NoImage)?;
        let entry = self.history.current().ok_or(SessionError::NoImage)?.clone();
        Ok(RenderTask {
            pipeline: self.pipeline.clone(),
            target_width: self.pipeline.preview_width(&entry.crop),
            original,
            entry,
            cancel,
        })
    }

    fn issue_cancel_flag(&mut self) -> CancelFlag {
        let cancel = CancelFlag::new();
        if let Some(previous) = self.in_flight.replace(cancel.clone()) {
            previous.cancel();
        }
        cancel
    }

    fn cancel_in_flight(&mut self) {
        if let Some(previous) = self.in_flight.take() {
            previous.cancel();
        }
    }
}
