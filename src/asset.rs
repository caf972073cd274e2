//! Files produced by a request
//!
//! An `AudioAsset` is created by generation and consumed by the compositor,
//! which deletes the WAV once the video is written. A `VideoAsset` is the
//! final deliverable.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::wav_duration_secs;
use crate::error::{BeatloopError, Result};

/// Identifier carried by every file name and log span of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First 8 hex digits, used in file names
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted, normalized WAV file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAsset {
    pub path: PathBuf,
    pub request_id: RequestId,
    /// Genre slug the audio was generated for
    pub genre: String,
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub created_at: DateTime<Utc>,
}

impl AudioAsset {
    /// Describe an existing WAV file
    ///
    /// Used when compositing audio that was not produced in this process.
    ///
    /// # Errors
    /// * `AssetNotFound` - The file does not exist
    /// * `InvalidAudio` - The header cannot be parsed
    pub fn from_wav(path: &Path, request_id: RequestId, genre: impl Into<String>) -> Result<Self> {
        let duration_secs = wav_duration_secs(path)?;
        let spec = hound::WavReader::open(path)
            .map_err(|e| BeatloopError::InvalidAudio {
                reason: format!("Failed to open WAV file: {e}"),
                source: Some(Box::new(e)),
            })?
            .spec();

        Ok(Self {
            path: path.to_path_buf(),
            request_id,
            genre: genre.into(),
            duration_secs,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            created_at: Utc::now(),
        })
    }
}

/// The final muxed video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAsset {
    pub path: PathBuf,
    pub request_id: RequestId,
    /// Equals the source audio duration
    pub duration_secs: f64,
    pub frame_count: u64,
    pub fps: u32,
    /// Forward+reverse clip pairs concatenated before trimming
    pub palindrome_units: u32,
}
