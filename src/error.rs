//! Error types for the monitoring core.
//!
//! Only [`MonitorError`] is meant to reach the user: it covers failures that
//! prevent a session from starting. Everything else is recovered locally by
//! the component that raised it and logged.

use std::path::PathBuf;

/// Fatal errors raised while starting or driving a monitoring session.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Acquisition failed: {message}")]
    Acquisition { message: String },

    #[error("Inference service unavailable: {message}")]
    InferenceUnavailable { message: String },

    #[error("Session is not running")]
    NotRunning,

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using MonitorError.
pub type MonitorResult<T> = Result<T, MonitorError>;

impl MonitorError {
    pub fn acquisition(msg: impl Into<String>) -> Self {
        Self::Acquisition {
            message: msg.into(),
        }
    }

    pub fn inference_unavailable(msg: impl Into<String>) -> Self {
        Self::InferenceUnavailable {
            message: msg.into(),
        }
    }
}

/// Best-effort capture failures. Logged and dropped, never propagated.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Media encoder unavailable")]
    EncoderUnavailable,

    #[error("Encoder failed: {message}")]
    Encoder { message: String },

    #[error("Clip buffer is empty")]
    EmptyBuffer,
}

/// Errors writing artifacts to their destination.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Could not create export directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Reasons a report cannot be produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    #[error("No data recorded for this session")]
    EmptySession,
}
