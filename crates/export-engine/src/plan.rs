//! Export planning.
//!
//! Planning is pure: it reads a snapshot of the operation log and the source
//! description and produces an ordered list of steps. No I/O happens here.

use serde::Serialize;

use cutline_common::config::ExportDefaults;
use cutline_project_model::geometry::{denormalize_rect, normalized_to_source, PixelPoint, Point2D};
use cutline_project_model::log::OperationLog;
use cutline_project_model::operation::{AudioAction, Edit, EditKind, MergeMode, OperationId};
use cutline_project_model::source::{MediaRef, VideoSource};
use cutline_project_model::time::secs_to_ms;

use crate::service::{FlipConfig, ProcessConfig, TextOverlayRequest, TimeRangeMs};

/// Planner tuning.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// Maximum characters of overlay text quoted in a step description.
    pub step_label_chars: usize,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self::from(&ExportDefaults::default())
    }
}

impl From<&ExportDefaults> for PlanOptions {
    fn from(defaults: &ExportDefaults) -> Self {
        Self {
            step_label_chars: defaults.step_label_chars,
        }
    }
}

/// What a step asks the processing service to do.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    /// All simple edits in one `process_video` pass.
    Process { config: ProcessConfig },
    TextOverlay {
        operation: OperationId,
        request: TextOverlayRequest,
    },
    Merge {
        operation: OperationId,
        mode: MergeMode,
        other: MediaRef,
    },
    /// Bookkeeping step; issues no service call.
    Finalize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedStep {
    pub description: String,
    #[serde(flatten)]
    pub action: StepAction,
}

/// A committed edit the service contract cannot express.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedEdit {
    pub operation: OperationId,
    pub kind: EditKind,
    pub reason: String,
}

/// A sticker overlay resolved to source pixels.
///
/// The service contract has no sticker call, so these are carried alongside
/// the plan rather than issued as steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StickerPlacement {
    pub operation: OperationId,
    pub image: MediaRef,
    pub position: PixelPoint,
    pub scale: f64,
    pub rotation: f64,
    pub start_ms: u64,
    pub end_ms: u64,
}

/// Ordered steps for one export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportPlan {
    source: MediaRef,
    steps: Vec<PlannedStep>,
    total_steps: usize,
    stickers: Vec<StickerPlacement>,
    skipped: Vec<SkippedEdit>,
}

impl ExportPlan {
    /// Media reference the first step reads from.
    pub fn source(&self) -> &MediaRef {
        &self.source
    }

    pub fn steps(&self) -> &[PlannedStep] {
        &self.steps
    }

    /// Step count fixed at planning time, used as the progress denominator.
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn stickers(&self) -> &[StickerPlacement] {
        &self.stickers
    }

    pub fn skipped(&self) -> &[SkippedEdit] {
        &self.skipped
    }
}

/// Plan an export with default options.
pub fn plan_export(source: &VideoSource, log: &OperationLog) -> ExportPlan {
    plan_export_with(source, log, &PlanOptions::default())
}

/// Plan an export.
///
/// Steps come in three buckets, each in commit order: one combined
/// `process_video` step for every simple edit, one step per text overlay,
/// one step per merge. A finalize step closes any non-empty plan.
pub fn plan_export_with(
    source: &VideoSource,
    log: &OperationLog,
    options: &PlanOptions,
) -> ExportPlan {
    if log.is_empty() {
        return ExportPlan {
            source: source.origin.clone(),
            steps: Vec::new(),
            total_steps: 0,
            stickers: Vec::new(),
            skipped: Vec::new(),
        };
    }

    let mut batch = SimpleBatch::default();
    let mut text_steps = Vec::new();
    let mut merge_steps = Vec::new();
    let mut stickers = Vec::new();
    let mut skipped = Vec::new();

    for op in log {
        match &op.edit {
            Edit::Trim { start, end } => {
                batch.present = true;
                batch.config.trim = Some(ms_range(*start, *end));
            }
            Edit::Cut { start, end } => {
                batch.present = true;
                batch.config.cuts.push(ms_range(*start, *end));
            }
            Edit::Crop { .. } => {
                batch.present = true;
                if let Some(rect) = op.edit.crop_rect() {
                    batch.config.crop = Some(denormalize_rect(rect, source.width, source.height));
                }
            }
            Edit::Rotate { degrees } => {
                batch.present = true;
                batch.rotation = (batch.rotation + degrees.degrees()) % 360;
            }
            Edit::Flip {
                horizontal,
                vertical,
            } => {
                batch.present = true;
                batch.flip_horizontal ^= *horizontal;
                batch.flip_vertical ^= *vertical;
            }
            Edit::Speed { multiplier } => {
                batch.present = true;
                batch.config.speed = Some(*multiplier);
            }
            Edit::Audio { action, volume, .. } => {
                batch.present = true;
                match action {
                    AudioAction::Mute => batch.config.mute_audio = Some(true),
                    AudioAction::Volume => batch.config.audio_volume = *volume,
                    AudioAction::Replace => {
                        tracing::warn!(
                            operation = %op.id,
                            "Audio replacement is not supported by the processing service; skipping"
                        );
                        skipped.push(SkippedEdit {
                            operation: op.id,
                            kind: EditKind::Audio,
                            reason: "audio replacement is not part of the processing contract"
                                .to_string(),
                        });
                    }
                }
            }
            Edit::Text(text) => {
                let position = normalized_to_source(
                    Point2D::new(text.x, text.y),
                    source.width,
                    source.height,
                );
                text_steps.push(PlannedStep {
                    description: format!(
                        "Adding text: \"{}\"",
                        truncate_label(&text.content, options.step_label_chars)
                    ),
                    action: StepAction::TextOverlay {
                        operation: op.id,
                        request: TextOverlayRequest {
                            text: text.content.clone(),
                            x: position.x,
                            y: position.y,
                            start_ms: secs_to_ms(text.start_time),
                            end_ms: secs_to_ms(text.end_time),
                        },
                    },
                });
            }
            Edit::Sticker(sticker) => {
                tracing::warn!(
                    operation = %op.id,
                    "Sticker overlays are not rendered by the processing service; skipping"
                );
                stickers.push(StickerPlacement {
                    operation: op.id,
                    image: sticker.image.clone(),
                    position: normalized_to_source(
                        Point2D::new(sticker.x, sticker.y),
                        source.width,
                        source.height,
                    ),
                    scale: sticker.scale,
                    rotation: sticker.rotation,
                    start_ms: secs_to_ms(sticker.start_time),
                    end_ms: secs_to_ms(sticker.end_time),
                });
                skipped.push(SkippedEdit {
                    operation: op.id,
                    kind: EditKind::Sticker,
                    reason: "sticker overlays are not part of the processing contract".to_string(),
                });
            }
            Edit::Merge { mode, source: other } => {
                merge_steps.push(PlannedStep {
                    description: format!("Merging videos: {}", mode.as_str()),
                    action: StepAction::Merge {
                        operation: op.id,
                        mode: *mode,
                        other: other.clone(),
                    },
                });
            }
        }
    }

    let mut steps = Vec::with_capacity(2 + text_steps.len() + merge_steps.len());
    if batch.present {
        steps.push(PlannedStep {
            description: "Processing video effects".to_string(),
            action: StepAction::Process {
                config: batch.finish(),
            },
        });
    }
    steps.extend(text_steps);
    steps.extend(merge_steps);
    steps.push(PlannedStep {
        description: "Finalizing".to_string(),
        action: StepAction::Finalize,
    });

    let total_steps = steps.len();
    tracing::info!(
        operations = log.len(),
        total_steps,
        stickers = stickers.len(),
        skipped = skipped.len(),
        "Export plan built"
    );

    ExportPlan {
        source: source.origin.clone(),
        steps,
        total_steps,
        stickers,
        skipped,
    }
}

/// Accumulator for edits folded into the single `process_video` step.
#[derive(Debug, Default)]
struct SimpleBatch {
    present: bool,
    config: ProcessConfig,
    rotation: u16,
    flip_horizontal: bool,
    flip_vertical: bool,
}

impl SimpleBatch {
    fn finish(mut self) -> ProcessConfig {
        if self.rotation != 0 {
            self.config.rotation = Some(self.rotation);
        }
        if self.flip_horizontal || self.flip_vertical {
            self.config.flip = Some(FlipConfig {
                horizontal: self.flip_horizontal,
                vertical: self.flip_vertical,
            });
        }
        self.config
    }
}

fn ms_range(start: f64, end: f64) -> TimeRangeMs {
    TimeRangeMs {
        start: secs_to_ms(start),
        end: secs_to_ms(end),
    }
}

fn truncate_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}
