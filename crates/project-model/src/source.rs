//! Source media description.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::operation::EditError;

/// Opaque handle to a piece of media (URI, content id, temp path...).
///
/// The processing service hands these out and accepts them back; Cutline
/// never interprets the string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(String);

impl MediaRef {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MediaRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Immutable description of the clip being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSource {
    /// Where the clip came from.
    pub origin: MediaRef,

    /// Duration in seconds.
    pub duration_secs: f64,

    /// Frame size in pixels.
    pub width: u32,
    pub height: u32,

    /// Rotation recorded in the container metadata (degrees).
    #[serde(default)]
    pub rotation_degrees: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u64>,
}

impl VideoSource {
    /// Describe a source clip. Duration must be finite and non-negative.
    pub fn new(
        origin: impl Into<MediaRef>,
        duration_secs: f64,
        width: u32,
        height: u32,
    ) -> Result<Self, EditError> {
        let source = Self {
            origin: origin.into(),
            duration_secs,
            width,
            height,
            rotation_degrees: 0,
            frame_rate: None,
            bitrate: None,
        };
        source.validate()?;
        Ok(source)
    }

    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.rotation_degrees = degrees;
        self
    }

    pub fn with_frame_rate(mut self, fps: f64) -> Self {
        self.frame_rate = Some(fps);
        self
    }

    pub fn with_bitrate(mut self, bitrate: u64) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    /// Check the invariants a deserialized source must satisfy.
    pub fn validate(&self) -> Result<(), EditError> {
        if !self.duration_secs.is_finite() || self.duration_secs < 0.0 {
            return Err(EditError::InvalidSource {
                reason: format!("duration must be >= 0, got {}", self.duration_secs),
            });
        }
        if self.width == 0 || self.height == 0 {
            return Err(EditError::InvalidSource {
                reason: format!("frame size must be non-zero, got {}x{}", self.width, self.height),
            });
        }
        Ok(())
    }
}
