//! Error handling for Beatloop
//!
//! Every pipeline stage returns a typed error so callers can branch on the
//! failure kind instead of checking whether an output path exists.

use thiserror::Error;

/// Result type alias for Beatloop operations
pub type Result<T> = std::result::Result<T, BeatloopError>;

/// Main error type for Beatloop operations
#[derive(Error, Debug)]
pub enum BeatloopError {
    // Model Errors
    #[error("Model invocation failed: {reason}")]
    ModelInvocation {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Model unavailable: {reason}")]
    ModelUnavailable { reason: String },

    // Asset Errors
    #[error("Asset not found: {path}")]
    AssetNotFound { path: String },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Encoding Errors
    #[error("Encode failed: {reason}")]
    Encode { reason: String },

    #[error("Probe failed for {path}: {reason}")]
    Probe { path: String, reason: String },

    // Validation Errors
    #[error("Invalid setting '{param}': got {value}, expected {expected}")]
    InvalidSettings {
        param: String,
        value: String,
        expected: String,
    },

    #[error("Invalid prompt: {reason}")]
    InvalidPrompt { reason: String },

    #[error("Invalid pipeline transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Configuration error: {reason}")]
    Config { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BeatloopError {
    /// Shorthand for a model failure without an underlying source error
    pub fn model(reason: impl Into<String>) -> Self {
        BeatloopError::ModelInvocation {
            reason: reason.into(),
            source: None,
        }
    }

    /// Shorthand for an encode failure
    pub fn encode(reason: impl Into<String>) -> Self {
        BeatloopError::Encode {
            reason: reason.into(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            BeatloopError::ModelInvocation { .. } => "MODEL_INVOCATION_ERROR",
            BeatloopError::ModelUnavailable { .. } => "MODEL_UNAVAILABLE",
            BeatloopError::AssetNotFound { .. } => "ASSET_NOT_FOUND",
            BeatloopError::InvalidAudio { .. } => "INVALID_AUDIO",
            BeatloopError::Encode { .. } => "ENCODE_ERROR",
            BeatloopError::Probe { .. } => "PROBE_ERROR",
            BeatloopError::InvalidSettings { .. } => "INVALID_SETTINGS",
            BeatloopError::InvalidPrompt { .. } => "INVALID_PROMPT",
            BeatloopError::InvalidTransition { .. } => "INVALID_TRANSITION",
            BeatloopError::Config { .. } => "CONFIG_ERROR",
            BeatloopError::Io(_) => "IO_ERROR",
            BeatloopError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            BeatloopError::ModelInvocation { .. } => vec![
                "Try a shorter duration to reduce memory pressure",
                "Check the model server logs for the underlying failure",
            ],
            BeatloopError::ModelUnavailable { .. } => vec![
                "Start the model bridge server and check BEATLOOP_BRIDGE_URL",
                "Build with --features bridge, or run with --mock for a dry run",
            ],
            BeatloopError::AssetNotFound { .. } => vec![
                "Place the loop clip next to the executable",
                "Point BEATLOOP_LOOP_CLIP or --loop-clip at an existing video file",
            ],
            BeatloopError::Encode { .. } | BeatloopError::Probe { .. } => vec![
                "Check that ffmpeg and ffprobe are installed and on PATH",
                "Set BEATLOOP_FFMPEG / BEATLOOP_FFPROBE to explicit binaries",
            ],
            BeatloopError::InvalidSettings { .. } => vec![
                "Start from the genre defaults: beatloop defaults <genre>",
            ],
            BeatloopError::InvalidPrompt { .. } => vec![
                "Provide a non-empty prompt or omit it to use the genre default",
            ],
            _ => vec![],
        }
    }
}
