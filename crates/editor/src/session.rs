//! Editor session management.

use cutline_common::config::EditorDefaults;
use cutline_common::error::{CutlineError, CutlineResult};
use cutline_export_engine::executor::{CancelToken, ExportOutcome, ExportProgress};
use cutline_export_engine::plan::{plan_export_with, ExportPlan, PlanOptions};
use cutline_project_model::geometry::{
    preview_rect_to_normalized, time_from_x, Corner, CropRatio, NormalizedRect,
};
use cutline_project_model::log::OperationLog;
use cutline_project_model::operation::{
    AudioAction, Edit, EditError, FontWeight, MergeMode, Operation, OperationId, Rotation,
    StickerOverlay, TextOverlay,
};
use cutline_project_model::source::{MediaRef, VideoSource};

use crate::state::{EditMode, ExportState, PlaybackState, TimelineView, TrimBounds, TrimHandle};

/// Everything an export run needs, captured when it starts.
#[derive(Debug, Clone)]
pub struct ExportTicket {
    /// Plan built from a snapshot of the log; later edits do not affect it.
    pub plan: ExportPlan,
    /// Tripped by [`EditorSession::cancel_export`].
    pub cancel: CancelToken,
}

/// Editing session over one source clip.
///
/// Owns the operation log. All mutation goes through these methods.
#[derive(Debug)]
pub struct EditorSession {
    id: uuid::Uuid,
    source: VideoSource,
    settings: EditorDefaults,
    log: OperationLog,
    playback: PlaybackState,
    timeline: TimelineView,
    mode: EditMode,
    trim: TrimBounds,
    crop_preset: CropRatio,
    crop_rect: Option<NormalizedRect>,
    selected: Option<OperationId>,
    export: ExportState,
    export_cancel: Option<CancelToken>,
}

impl EditorSession {
    /// Start editing `source` with default settings.
    pub fn new(source: VideoSource) -> CutlineResult<Self> {
        Self::with_settings(source, EditorDefaults::default())
    }

    pub fn with_settings(source: VideoSource, settings: EditorDefaults) -> CutlineResult<Self> {
        Self::restore(source, OperationLog::new(), settings)
    }

    /// Resume editing over a previously committed log.
    ///
    /// Every operation must fit inside `source`.
    pub fn restore(
        source: VideoSource,
        log: OperationLog,
        settings: EditorDefaults,
    ) -> CutlineResult<Self> {
        source.validate().map_err(edit_error)?;
        for op in &log {
            op.edit.validate_within(source.duration_secs).map_err(edit_error)?;
        }

        let session = Self {
            id: uuid::Uuid::new_v4(),
            trim: TrimBounds {
                start: 0.0,
                end: source.duration_secs,
            },
            source,
            settings,
            log,
            playback: PlaybackState::default(),
            timeline: TimelineView::default(),
            mode: EditMode::None,
            crop_preset: CropRatio::default(),
            crop_rect: None,
            selected: None,
            export: ExportState::Idle,
            export_cancel: None,
        };
        tracing::info!(
            session = %session.id,
            source = %session.source.origin,
            duration_secs = session.source.duration_secs,
            operations = session.log.len(),
            "Editor session started"
        );
        Ok(session)
    }

    /// Discard all edits and working state, keeping the source and settings.
    pub fn reset(&mut self) {
        if let Some(cancel) = self.export_cancel.take() {
            cancel.cancel();
        }
        let previous = self.id;
        *self = Self {
            id: uuid::Uuid::new_v4(),
            source: self.source.clone(),
            settings: self.settings.clone(),
            log: OperationLog::new(),
            playback: PlaybackState::default(),
            timeline: TimelineView::default(),
            mode: EditMode::None,
            trim: TrimBounds {
                start: 0.0,
                end: self.source.duration_secs,
            },
            crop_preset: CropRatio::default(),
            crop_rect: None,
            selected: None,
            export: ExportState::Idle,
            export_cancel: None,
        };
        tracing::info!(previous = %previous, session = %self.id, "Editor session reset");
    }

    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn source(&self) -> &VideoSource {
        &self.source
    }

    pub fn settings(&self) -> &EditorDefaults {
        &self.settings
    }

    pub fn log(&self) -> &OperationLog {
        &self.log
    }

    pub fn operations(&self) -> &[Operation] {
        self.log.operations()
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    pub fn current_time(&self) -> f64 {
        self.playback.current_time
    }

    pub fn timeline(&self) -> TimelineView {
        self.timeline
    }

    pub fn trim_bounds(&self) -> TrimBounds {
        self.trim
    }

    pub fn crop_preset(&self) -> CropRatio {
        self.crop_preset
    }

    /// Working crop rectangle, present only while the crop tool is active.
    pub fn crop_rect(&self) -> Option<NormalizedRect> {
        self.crop_rect
    }

    pub fn selected(&self) -> Option<OperationId> {
        self.selected
    }

    pub fn export_state(&self) -> &ExportState {
        &self.export
    }

    /// Output duration after trim and speed.
    pub fn effective_duration(&self) -> f64 {
        self.log.effective_duration(self.source.duration_secs)
    }

    pub fn set_current_time(&mut self, t: f64) {
        if t.is_nan() {
            return;
        }
        self.playback.current_time = t.clamp(0.0, self.source.duration_secs);
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playback.playing = playing;
    }

    pub fn toggle_playback(&mut self) {
        self.playback.playing = !self.playback.playing;
    }

    pub fn set_seeking(&mut self, seeking: bool) {
        self.playback.seeking = seeking;
    }

    pub fn set_timeline_zoom(&mut self, zoom: f64) {
        if zoom.is_nan() {
            return;
        }
        let (min, max) = (self.settings.timeline_zoom_min, self.settings.timeline_zoom_max);
        self.timeline.zoom = zoom.clamp(min, max.max(min));
    }

    pub fn set_timeline_scroll_x(&mut self, x: f64) {
        if x.is_nan() {
            return;
        }
        self.timeline.scroll_x = x.max(0.0);
    }

    /// Switch tools.
    ///
    /// Entering trim resets the working range to the whole source, even when a
    /// trim is already committed. Entering crop seeds the working rectangle
    /// from the current preset; leaving crop discards it. The selection is
    /// always cleared.
    pub fn set_active_mode(&mut self, mode: EditMode) {
        let previous = self.mode;
        self.selected = None;

        if previous == EditMode::Crop && mode != EditMode::Crop {
            self.crop_rect = None;
        }
        match mode {
            EditMode::Trim => {
                self.trim = TrimBounds {
                    start: 0.0,
                    end: self.source.duration_secs,
                };
            }
            EditMode::Crop if previous != EditMode::Crop => {
                self.crop_rect = Some(self.fitted_crop(self.crop_preset));
            }
            _ => {}
        }

        self.mode = mode;
        tracing::debug!(from = ?previous, to = ?mode, "Edit mode changed");
    }

    /// Highlight an operation, or clear the highlight with `None`.
    pub fn select_operation(&mut self, id: Option<OperationId>) {
        self.selected = id.filter(|id| self.log.contains(*id));
    }

    /// Move the working start. The end never moves; the request is clamped
    /// so the range keeps its minimum span.
    pub fn set_trim_start(&mut self, t: f64) {
        if t.is_nan() {
            return;
        }
        let upper = (self.trim.end - self.min_trim_span()).max(0.0);
        self.trim.start = t.clamp(0.0, upper);
    }

    /// Move the working end. The start never moves.
    pub fn set_trim_end(&mut self, t: f64) {
        if t.is_nan() {
            return;
        }
        let duration = self.source.duration_secs;
        let lower = (self.trim.start + self.min_trim_span()).min(duration);
        self.trim.end = t.clamp(lower, duration);
    }

    /// Drag a trim handle to `x` pixels along a track `track_width` wide.
    pub fn drag_trim_handle(&mut self, handle: TrimHandle, x: f64, track_width: f64) {
        let t = time_from_x(x, track_width, self.source.duration_secs);
        match handle {
            TrimHandle::Start => self.set_trim_start(t),
            TrimHandle::End => self.set_trim_end(t),
        }
    }

    /// Commit the working range as a trim and leave the tool.
    pub fn apply_trim(&mut self) -> CutlineResult<OperationId> {
        let id = self.commit(Edit::Trim {
            start: self.trim.start,
            end: self.trim.end,
        })?;
        self.set_active_mode(EditMode::None);
        Ok(id)
    }

    fn min_trim_span(&self) -> f64 {
        self.settings
            .min_trim_span_secs
            .max(0.0)
            .min(self.source.duration_secs)
    }

    /// Choose an aspect preset. While cropping, the working rectangle is
    /// re-fitted to it.
    pub fn set_crop_preset(&mut self, ratio: CropRatio) {
        self.crop_preset = ratio;
        if self.mode == EditMode::Crop {
            self.crop_rect = Some(self.fitted_crop(ratio));
        }
    }

    pub fn set_crop_rect(&mut self, rect: NormalizedRect) {
        if self.mode != EditMode::Crop {
            tracing::debug!("Crop gesture ignored outside crop mode");
            return;
        }
        self.crop_rect = Some(rect);
    }

    /// Set the working rectangle from a rectangle drawn in preview pixels.
    pub fn set_crop_rect_from_preview(
        &mut self,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
        preview_width: f64,
        preview_height: f64,
    ) {
        let rect =
            preview_rect_to_normalized(left, top, width, height, preview_width, preview_height);
        self.set_crop_rect(rect);
    }

    /// Drag the working rectangle by a preview-pixel delta.
    pub fn move_crop_rect(&mut self, dx: f64, dy: f64, preview_width: f64, preview_height: f64) {
        let Some((du, dv)) = preview_delta(dx, dy, preview_width, preview_height) else {
            return;
        };
        if self.mode == EditMode::Crop {
            if let Some(rect) = self.crop_rect {
                self.crop_rect = Some(rect.translated(du, dv));
            }
        }
    }

    /// Drag one corner of the working rectangle by a preview-pixel delta.
    pub fn resize_crop_rect(
        &mut self,
        corner: Corner,
        dx: f64,
        dy: f64,
        preview_width: f64,
        preview_height: f64,
    ) {
        let Some((du, dv)) = preview_delta(dx, dy, preview_width, preview_height) else {
            return;
        };
        if self.mode == EditMode::Crop {
            if let Some(rect) = self.crop_rect {
                let min_size = self.settings.min_crop_size;
                self.crop_rect = Some(rect.resized(corner, du, dv, min_size));
            }
        }
    }

    /// Commit the working rectangle and leave the tool.
    ///
    /// Returns `Ok(None)` when there is no working rectangle.
    pub fn apply_crop(&mut self) -> CutlineResult<Option<OperationId>> {
        let Some(rect) = self.crop_rect else {
            return Ok(None);
        };
        let id = self.commit(Edit::crop(rect, self.crop_preset))?;
        self.set_active_mode(EditMode::None);
        Ok(Some(id))
    }

    fn fitted_crop(&self, ratio: CropRatio) -> NormalizedRect {
        ratio.fit(self.source.width as f64, self.source.height as f64)
    }

    /// Commit an edit to the log. Invalid edits, including ranges that end
    /// past the source, leave the log unchanged.
    pub fn commit(&mut self, edit: Edit) -> CutlineResult<OperationId> {
        edit.validate_within(self.source.duration_secs).map_err(edit_error)?;
        self.log.commit_edit(edit).map_err(edit_error)
    }

    pub fn add_rotation(&mut self, degrees: Rotation) -> CutlineResult<OperationId> {
        self.commit(Edit::Rotate { degrees })
    }

    pub fn add_flip(&mut self, horizontal: bool, vertical: bool) -> CutlineResult<OperationId> {
        self.commit(Edit::Flip {
            horizontal,
            vertical,
        })
    }

    /// Set the playback speed, replacing any earlier speed edit.
    pub fn set_speed(&mut self, multiplier: f64) -> CutlineResult<OperationId> {
        self.commit(Edit::Speed { multiplier })
    }

    pub fn add_audio_mute(&mut self) -> CutlineResult<OperationId> {
        self.commit(Edit::Audio {
            action: AudioAction::Mute,
            volume: None,
            replacement: None,
        })
    }

    pub fn set_audio_volume(&mut self, volume: f64) -> CutlineResult<OperationId> {
        self.commit(Edit::Audio {
            action: AudioAction::Volume,
            volume: Some(volume),
            replacement: None,
        })
    }

    pub fn replace_audio(&mut self, track: MediaRef) -> CutlineResult<OperationId> {
        self.commit(Edit::Audio {
            action: AudioAction::Replace,
            volume: None,
            replacement: Some(track),
        })
    }

    pub fn add_cut(&mut self, start: f64, end: f64) -> CutlineResult<OperationId> {
        self.commit(Edit::Cut { start, end })
    }

    pub fn add_merge(&mut self, mode: MergeMode, other: MediaRef) -> CutlineResult<OperationId> {
        self.commit(Edit::Merge {
            mode,
            source: other,
        })
    }

    /// Add text at a normalized position, visible for the whole clip.
    pub fn add_text_overlay(
        &mut self,
        content: impl Into<String>,
        x: f64,
        y: f64,
    ) -> CutlineResult<OperationId> {
        let weight = if self.settings.text_bold {
            FontWeight::Bold
        } else {
            FontWeight::Normal
        };
        self.commit(Edit::Text(TextOverlay {
            content: content.into(),
            x,
            y,
            font_size: self.settings.text_font_size,
            color: self.settings.text_color.clone(),
            weight,
            start_time: 0.0,
            end_time: self.source.duration_secs,
        }))
    }

    /// Add a sticker at a normalized position, visible for the whole clip.
    pub fn add_sticker(&mut self, image: MediaRef, x: f64, y: f64) -> CutlineResult<OperationId> {
        self.commit(Edit::Sticker(StickerOverlay {
            image,
            x,
            y,
            scale: self.settings.sticker_scale,
            rotation: 0.0,
            start_time: 0.0,
            end_time: self.source.duration_secs,
        }))
    }

    /// Replace the edit of an existing operation in place.
    pub fn update_operation(&mut self, id: OperationId, edit: Edit) -> CutlineResult<bool> {
        edit.validate_within(self.source.duration_secs).map_err(edit_error)?;
        self.log.update(id, edit).map_err(edit_error)
    }

    /// Remove an operation. Removing an absent id is a no-op.
    pub fn remove_operation(&mut self, id: OperationId) -> bool {
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.log.remove(id)
    }

    pub fn clear_operations(&mut self) {
        self.selected = None;
        self.log.clear();
    }

    /// Text and sticker overlays visible at the current time.
    pub fn visible_overlays(&self) -> Vec<&Operation> {
        self.visible_overlays_at(self.playback.current_time)
    }

    /// Text and sticker overlays whose window contains `time` (inclusive).
    pub fn visible_overlays_at(&self, time: f64) -> Vec<&Operation> {
        self.log.iter().filter(|op| op.is_visible_at(time)).collect()
    }

    /// Snapshot the log and plan an export with default options.
    pub fn begin_export(&mut self) -> CutlineResult<ExportTicket> {
        self.begin_export_with(&PlanOptions::default())
    }

    /// Snapshot the log, plan it, and move the export state to running.
    pub fn begin_export_with(&mut self, options: &PlanOptions) -> CutlineResult<ExportTicket> {
        if self.export.is_running() {
            return Err(CutlineError::invalid_state("An export is already running"));
        }

        let snapshot = self.log.clone();
        let plan = plan_export_with(&self.source, &snapshot, options);
        let cancel = CancelToken::new();

        self.export = ExportState::Running { progress: 0 };
        self.export_cancel = Some(cancel.clone());
        tracing::info!(session = %self.id, total_steps = plan.total_steps(), "Export started");

        Ok(ExportTicket { plan, cancel })
    }

    /// Apply a progress report from the executor. Ignored unless running;
    /// progress never goes backwards.
    pub fn record_export_progress(&mut self, progress: &ExportProgress) {
        if let ExportState::Running { progress: current } = &mut self.export {
            let next = progress.percent.min(100);
            if next > *current {
                *current = next;
            }
        }
    }

    /// Request cancellation of the running export.
    ///
    /// The executor stops at its next step boundary. Returns whether an
    /// export was running.
    pub fn cancel_export(&mut self) -> bool {
        if !self.export.is_running() {
            return false;
        }
        if let Some(cancel) = self.export_cancel.take() {
            cancel.cancel();
        }
        self.export = ExportState::Idle;
        tracing::info!(session = %self.id, "Export cancelled");
        true
    }

    /// Record how the export run ended.
    ///
    /// Only a running export is updated; once cancelled, a late completion
    /// never reports done.
    pub fn finish_export(&mut self, result: CutlineResult<ExportOutcome>) {
        if !self.export.is_running() {
            tracing::debug!(
                state = ?self.export,
                "Export result ignored; export no longer running"
            );
            return;
        }
        self.export_cancel = None;

        self.export = match result {
            Ok(outcome) => {
                let degraded = outcome.is_degraded();
                match outcome {
                    ExportOutcome::Completed { output, .. } => {
                        tracing::info!(
                            session = %self.id,
                            output = %output,
                            degraded,
                            "Export finished"
                        );
                        ExportState::Done { output, degraded }
                    }
                    ExportOutcome::Cancelled { steps_completed, .. } => {
                        tracing::info!(session = %self.id, steps_completed, "Export stopped early");
                        ExportState::Idle
                    }
                }
            }
            Err(e) => {
                tracing::error!(session = %self.id, error = %e, "Export failed");
                ExportState::Failed {
                    message: e.to_string(),
                }
            }
        };
    }

    /// Acknowledge a finished or failed export.
    pub fn dismiss_export(&mut self) {
        if matches!(self.export, ExportState::Done { .. } | ExportState::Failed { .. }) {
            self.export = ExportState::Idle;
        }
    }
}

fn edit_error(e: EditError) -> CutlineError {
    CutlineError::invalid_operation(e.to_string())
}

fn preview_delta(dx: f64, dy: f64, preview_width: f64, preview_height: f64) -> Option<(f64, f64)> {
    if preview_width <= 0.0 || preview_height <= 0.0 || !dx.is_finite() || !dy.is_finite() {
        return None;
    }
    Some((dx / preview_width, dy / preview_height))
}
