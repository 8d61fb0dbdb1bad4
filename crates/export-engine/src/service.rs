//! Contract with the external media processing service.
//!
//! The service decodes, transforms and encodes media. Every call takes a
//! media reference and returns a new one; the service is free to fail.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use cutline_project_model::geometry::PixelRect;
use cutline_project_model::source::MediaRef;

/// A `[start, end]` range in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRangeMs {
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlipConfig {
    pub horizontal: bool,
    pub vertical: bool,
}

/// Single static text burned in by `process_video`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayConfig {
    pub text: String,
    pub x: u32,
    pub y: u32,
}

/// Combined configuration for one `process_video` pass.
///
/// Every key is optional and independent; absent keys are omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<TimeRangeMs>,

    /// Regions to remove, in commit order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cuts: Vec<TimeRangeMs>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<PixelRect>,

    /// Clockwise rotation in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flip: Option<FlipConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mute_audio: Option<bool>,

    /// Output volume in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_volume: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<OverlayConfig>,
}

impl ProcessConfig {
    /// True when no key is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Arguments of an `add_text_overlay` call. Positions are source pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOverlayRequest {
    pub text: String,
    pub x: u32,
    pub y: u32,
    pub start_ms: u64,
    pub end_ms: u64,
}

/// Target of a `transcode` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscodeRequest {
    pub width: u32,
    pub height: u32,
    /// Target bitrate in bits per second; 0 lets the backend choose.
    pub bitrate: u32,
}

/// The media processing backend.
///
/// Calls are treated as non-interruptible: once issued, the executor awaits
/// them to completion.
#[async_trait]
pub trait ProcessingService: Send + Sync {
    /// Backend name, for diagnostics.
    fn name(&self) -> &str;

    /// Apply a set of independent transforms in a single pass.
    async fn process_video(
        &self,
        input: &MediaRef,
        config: &ProcessConfig,
    ) -> anyhow::Result<MediaRef>;

    /// Burn a timed text overlay into the video.
    async fn add_text_overlay(
        &self,
        input: &MediaRef,
        overlay: &TextOverlayRequest,
    ) -> anyhow::Result<MediaRef>;

    /// Place `other` to the right of `input`.
    async fn merge_side_by_side(&self, input: &MediaRef, other: &MediaRef)
        -> anyhow::Result<MediaRef>;

    /// Place `other` below `input`.
    async fn merge_top_bottom(&self, input: &MediaRef, other: &MediaRef)
        -> anyhow::Result<MediaRef>;

    /// Re-encode `input` at a new resolution and bitrate.
    async fn transcode(
        &self,
        input: &MediaRef,
        request: &TranscodeRequest,
    ) -> anyhow::Result<MediaRef>;

    /// Extract a still frame at `time_ms` as an image reference.
    async fn extract_frame(&self, input: &MediaRef, time_ms: u64) -> anyhow::Result<MediaRef>;
}
