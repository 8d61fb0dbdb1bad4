//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CutlineError, CutlineResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Interactive editing defaults.
    pub editor: EditorDefaults,

    /// Export pipeline defaults.
    pub export: ExportDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Defaults applied by the editor session to working state and new overlays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorDefaults {
    /// Minimum span between trim handles (seconds).
    pub min_trim_span_secs: f64,

    /// Minimum crop rectangle edge, as a fraction of the frame.
    pub min_crop_size: f64,

    /// Timeline zoom bounds.
    pub timeline_zoom_min: f64,
    pub timeline_zoom_max: f64,

    /// Text overlay font size in points.
    pub text_font_size: f64,

    /// Text overlay color as hex string.
    pub text_color: String,

    /// Whether new text overlays are bold.
    pub text_bold: bool,

    /// Initial scale for new stickers.
    pub sticker_scale: f64,
}

/// Export defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// Number of frames sampled for the timeline thumbnail strip.
    pub thumbnail_count: usize,

    /// Maximum characters of overlay text shown in a step label.
    pub step_label_chars: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "cutline=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for EditorDefaults {
    fn default() -> Self {
        Self {
            min_trim_span_secs: 0.1,
            min_crop_size: 0.05,
            timeline_zoom_min: 0.5,
            timeline_zoom_max: 3.0,
            text_font_size: 24.0,
            text_color: "#FFFFFF".to_string(),
            text_bold: true,
            sticker_scale: 1.0,
        }
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            thumbnail_count: 10,
            step_label_chars: 20,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path. Unlike [`AppConfig::load`], errors are returned.
    pub fn load_from(path: impl AsRef<Path>) -> CutlineResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CutlineError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| CutlineError::config(format!("{}: {e}", path.display())))
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("cutline").join("config.json")
}
