//! Working-state types owned by an editor session.

use serde::Serialize;

use cutline_project_model::source::MediaRef;

/// The active editing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    #[default]
    None,
    Trim,
    Cut,
    Crop,
    Rotate,
    Speed,
    Audio,
    Text,
    Sticker,
    Merge,
}

/// Export lifecycle as seen by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ExportState {
    #[default]
    Idle,
    Running {
        /// Percentage in `[0, 100]`, never decreasing within one run.
        progress: u8,
    },
    Done {
        output: MediaRef,
        /// A capability gap was hit; the output may not reflect every edit.
        degraded: bool,
    },
    Failed {
        message: String,
    },
}

impl ExportState {
    pub fn is_running(&self) -> bool {
        matches!(self, ExportState::Running { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimHandle {
    Start,
    End,
}

/// Uncommitted trim range, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrimBounds {
    pub start: f64,
    pub end: f64,
}

impl TrimBounds {
    pub fn span(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PlaybackState {
    /// Seconds, within `[0, duration]`.
    pub current_time: f64,
    pub playing: bool,
    /// A scrub gesture is in progress.
    pub seeking: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimelineView {
    pub zoom: f64,
    /// Horizontal scroll offset in track pixels.
    pub scroll_x: f64,
}

impl Default for TimelineView {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            scroll_x: 0.0,
        }
    }
}
