//! Error types shared across Cutline crates.

use std::path::PathBuf;

/// Top-level error type for Cutline operations.
#[derive(Debug, thiserror::Error)]
pub enum CutlineError {
    /// A malformed edit was rejected before it reached the operation log.
    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    /// The processing service failed while running an export step.
    #[error("Processing failed during '{step}': {source}")]
    ProcessingFailure {
        step: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using CutlineError.
pub type CutlineResult<T> = Result<T, CutlineError>;

impl CutlineError {
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: msg.into(),
        }
    }

    pub fn processing_failure(step: impl Into<String>, source: anyhow::Error) -> Self {
        Self::ProcessingFailure {
            step: step.into(),
            source,
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Description of the export step that failed, if this is a processing failure.
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            Self::ProcessingFailure { step, .. } => Some(step),
            _ => None,
        }
    }
}
