//! Edit operations.
//!
//! An [`Operation`] is one committed edit intent plus its identity. The edit
//! itself is the closed sum type [`Edit`]; every consumer (planner, summary
//! chips, validation) matches on it exhaustively.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{CropRatio, NormalizedRect};
use crate::source::MediaRef;
use crate::time::format_time_short;

/// Slowest and fastest playback multipliers accepted by a speed edit.
pub const SPEED_RANGE: (f64, f64) = (0.25, 3.0);

/// Tolerance for rectangles touching the frame edge after float math.
const RECT_EPSILON: f64 = 1e-9;

/// Slack allowed when comparing edit times against the source duration.
const TIME_EPSILON: f64 = 1e-6;

/// Unique operation identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(uuid::Uuid);

impl OperationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Discriminant of [`Edit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    Trim,
    Cut,
    Crop,
    Rotate,
    Flip,
    Speed,
    Audio,
    Text,
    Sticker,
    Merge,
}

impl EditKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EditKind::Trim => "trim",
            EditKind::Cut => "cut",
            EditKind::Crop => "crop",
            EditKind::Rotate => "rotate",
            EditKind::Flip => "flip",
            EditKind::Speed => "speed",
            EditKind::Audio => "audio",
            EditKind::Text => "text",
            EditKind::Sticker => "sticker",
            EditKind::Merge => "merge",
        }
    }

    /// Kinds of which the log holds at most one; committing another replaces it.
    pub fn is_singleton(self) -> bool {
        matches!(self, EditKind::Trim | EditKind::Speed)
    }
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quarter-turn rotation. Serialized as degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(format!("rotation must be 90, 180 or 270 degrees, got {other}")),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(value: Rotation) -> Self {
        value.degrees()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioAction {
    Mute,
    Replace,
    Volume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeMode {
    Append,
    SideBySide,
    TopBottom,
}

impl MergeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            MergeMode::Append => "append",
            MergeMode::SideBySide => "side-by-side",
            MergeMode::TopBottom => "top-bottom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    Normal,
    #[default]
    Bold,
}

/// Timed text drawn over the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOverlay {
    pub content: String,
    /// Normalized anchor position.
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
    pub color: String,
    #[serde(default)]
    pub weight: FontWeight,
    /// Visibility window (seconds).
    pub start_time: f64,
    pub end_time: f64,
}

/// Timed image drawn over the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickerOverlay {
    pub image: MediaRef,
    /// Normalized anchor position.
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    /// Rotation in degrees.
    pub rotation: f64,
    pub start_time: f64,
    pub end_time: f64,
}

/// A single edit intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Edit {
    /// Keep only `[start, end]` seconds.
    Trim { start: f64, end: f64 },
    /// Remove `[start, end]` seconds.
    Cut { start: f64, end: f64 },
    /// Keep a normalized sub-rectangle of the frame.
    Crop {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        ratio: CropRatio,
    },
    Rotate { degrees: Rotation },
    Flip { horizontal: bool, vertical: bool },
    Speed { multiplier: f64 },
    Audio {
        action: AudioAction,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        volume: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        replacement: Option<MediaRef>,
    },
    Text(TextOverlay),
    Sticker(StickerOverlay),
    Merge { mode: MergeMode, source: MediaRef },
}

impl Edit {
    pub fn kind(&self) -> EditKind {
        match self {
            Edit::Trim { .. } => EditKind::Trim,
            Edit::Cut { .. } => EditKind::Cut,
            Edit::Crop { .. } => EditKind::Crop,
            Edit::Rotate { .. } => EditKind::Rotate,
            Edit::Flip { .. } => EditKind::Flip,
            Edit::Speed { .. } => EditKind::Speed,
            Edit::Audio { .. } => EditKind::Audio,
            Edit::Text(_) => EditKind::Text,
            Edit::Sticker(_) => EditKind::Sticker,
            Edit::Merge { .. } => EditKind::Merge,
        }
    }

    /// Build a crop edit from a normalized rectangle.
    pub fn crop(rect: NormalizedRect, ratio: CropRatio) -> Self {
        Edit::Crop {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            ratio,
        }
    }

    /// The normalized crop rectangle, if this is a crop.
    pub fn crop_rect(&self) -> Option<NormalizedRect> {
        match self {
            Edit::Crop {
                x,
                y,
                width,
                height,
                ..
            } => Some(NormalizedRect::new(*x, *y, *width, *height)),
            _ => None,
        }
    }

    /// Visibility window for overlays.
    pub fn overlay_window(&self) -> Option<(f64, f64)> {
        match self {
            Edit::Text(text) => Some((text.start_time, text.end_time)),
            Edit::Sticker(sticker) => Some((sticker.start_time, sticker.end_time)),
            _ => None,
        }
    }

    /// Check the edit's own bounds. Nothing here depends on the source clip.
    pub fn validate(&self) -> Result<(), EditError> {
        let kind = self.kind();
        let invalid = |reason: String| EditError::InvalidOperation { kind, reason };

        match self {
            Edit::Trim { start, end } | Edit::Cut { start, end } => {
                if !start.is_finite() || !end.is_finite() {
                    return Err(invalid("bounds must be finite".to_string()));
                }
                if *start < 0.0 {
                    return Err(invalid(format!("start must be >= 0, got {start}")));
                }
                if end <= start {
                    return Err(invalid(format!(
                        "end ({end}) must be greater than start ({start})"
                    )));
                }
            }
            Edit::Crop {
                x,
                y,
                width,
                height,
                ..
            } => {
                if width.is_nan() || height.is_nan() || *width <= 0.0 || *height <= 0.0 {
                    return Err(invalid(format!(
                        "width and height must be positive, got {width}x{height}"
                    )));
                }
                if !in_unit(*x) || !in_unit(*y) {
                    return Err(invalid(format!("origin ({x}, {y}) outside [0, 1]")));
                }
                if x + width > 1.0 + RECT_EPSILON || y + height > 1.0 + RECT_EPSILON {
                    return Err(invalid("rectangle extends past the frame".to_string()));
                }
            }
            Edit::Rotate { .. } | Edit::Flip { .. } => {}
            Edit::Speed { multiplier } => {
                let (min, max) = SPEED_RANGE;
                if !(min..=max).contains(multiplier) {
                    return Err(invalid(format!(
                        "multiplier must be within [{min}, {max}], got {multiplier}"
                    )));
                }
            }
            Edit::Audio {
                action,
                volume,
                replacement,
            } => {
                if let Some(v) = volume {
                    if !in_unit(*v) {
                        return Err(invalid(format!("volume must be within [0, 1], got {v}")));
                    }
                }
                match action {
                    AudioAction::Volume if volume.is_none() => {
                        return Err(invalid("volume action requires a volume".to_string()));
                    }
                    AudioAction::Replace if replacement.is_none() => {
                        return Err(invalid(
                            "replace action requires a replacement track".to_string(),
                        ));
                    }
                    _ => {}
                }
            }
            Edit::Text(text) => {
                if text.content.trim().is_empty() {
                    return Err(invalid("text content is empty".to_string()));
                }
                validate_overlay(text.x, text.y, text.start_time, text.end_time)
                    .map_err(invalid)?;
            }
            Edit::Sticker(sticker) => {
                if sticker.scale.is_nan() || sticker.scale <= 0.0 {
                    return Err(invalid(format!(
                        "scale must be positive, got {}",
                        sticker.scale
                    )));
                }
                validate_overlay(sticker.x, sticker.y, sticker.start_time, sticker.end_time)
                    .map_err(invalid)?;
            }
            Edit::Merge { .. } => {}
        }
        Ok(())
    }

    /// Check the edit against a source clip of `duration` seconds.
    ///
    /// Runs [`Edit::validate`] first, then rejects trim and cut ranges or
    /// overlay windows that end past the clip.
    pub fn validate_within(&self, duration: f64) -> Result<(), EditError> {
        self.validate()?;

        let end = match self {
            Edit::Trim { end, .. } | Edit::Cut { end, .. } => *end,
            _ => match self.overlay_window() {
                Some((_, end)) => end,
                None => return Ok(()),
            },
        };
        if end > duration + TIME_EPSILON {
            return Err(EditError::InvalidOperation {
                kind: self.kind(),
                reason: format!("end ({end}) is past the source duration ({duration})"),
            });
        }
        Ok(())
    }

    /// One-line label for the committed-operations summary.
    pub fn summary(&self) -> String {
        match self {
            Edit::Trim { start, end } => format!(
                "Trim {} - {}",
                format_time_short(*start),
                format_time_short(*end)
            ),
            Edit::Cut { start, end } => format!(
                "Cut {} - {}",
                format_time_short(*start),
                format_time_short(*end)
            ),
            Edit::Crop { ratio, .. } => format!("Crop {}", ratio.label()),
            Edit::Rotate { degrees } => format!("Rotate {}°", degrees.degrees()),
            Edit::Flip {
                horizontal,
                vertical,
            } => match (horizontal, vertical) {
                (true, true) => "Flip both".to_string(),
                (true, false) => "Flip horizontal".to_string(),
                (false, true) => "Flip vertical".to_string(),
                (false, false) => "Flip none".to_string(),
            },
            Edit::Speed { multiplier } => format!("Speed {multiplier}x"),
            Edit::Audio { action, volume, .. } => match action {
                AudioAction::Mute => "Mute audio".to_string(),
                AudioAction::Replace => "Replace audio".to_string(),
                AudioAction::Volume => {
                    format!("Volume {:.0}%", volume.unwrap_or(1.0) * 100.0)
                }
            },
            Edit::Text(text) => format!("Text \"{}\"", text.content),
            Edit::Sticker(_) => "Sticker".to_string(),
            Edit::Merge { mode, .. } => format!("Merge {}", mode.as_str()),
        }
    }
}

/// A committed edit together with its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    #[serde(flatten)]
    pub edit: Edit,
}

impl Operation {
    /// Wrap an edit with a freshly generated id.
    pub fn new(edit: Edit) -> Self {
        Self {
            id: OperationId::new(),
            edit,
        }
    }

    pub fn kind(&self) -> EditKind {
        self.edit.kind()
    }

    /// Whether this is an overlay visible at `time` (inclusive on both ends).
    pub fn is_visible_at(&self, time: f64) -> bool {
        self.edit
            .overlay_window()
            .is_some_and(|(start, end)| start <= time && time <= end)
    }
}

/// Errors raised when an edit or source is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error("Invalid {kind} operation: {reason}")]
    InvalidOperation { kind: EditKind, reason: String },

    #[error("Invalid video source: {reason}")]
    InvalidSource { reason: String },
}

fn in_unit(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

fn validate_overlay(x: f64, y: f64, start: f64, end: f64) -> Result<(), String> {
    if !in_unit(x) || !in_unit(y) {
        return Err(format!("position ({x}, {y}) outside [0, 1]"));
    }
    if start.is_nan() || end.is_nan() || start < 0.0 || end < start {
        return Err(format!("invalid visibility window [{start}, {end}]"));
    }
    Ok(())
}
