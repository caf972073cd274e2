//! Application configuration
//!
//! Layered, lowest precedence first: built-in defaults, an optional JSON
//! file, `BEATLOOP_*` environment variables, then command-line flags (applied
//! by the CLI on the loaded value).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::NormalizationStrategy;
use crate::error::{BeatloopError, Result};
use crate::neural::{DEFAULT_BRIDGE_TIMEOUT_MS, DEFAULT_BRIDGE_URL};
use crate::video::FfmpegEncoder;

/// Loop clip file name looked up next to the executable
pub const DEFAULT_LOOP_CLIP: &str = "youtube_gif_new.mp4";

pub const ENV_OUTPUT_DIR: &str = "BEATLOOP_OUTPUT_DIR";
pub const ENV_LOOP_CLIP: &str = "BEATLOOP_LOOP_CLIP";
pub const ENV_FFMPEG: &str = "BEATLOOP_FFMPEG";
pub const ENV_FFPROBE: &str = "BEATLOOP_FFPROBE";
pub const ENV_BRIDGE_URL: &str = "BEATLOOP_BRIDGE_URL";
pub const ENV_BRIDGE_TIMEOUT_MS: &str = "BEATLOOP_BRIDGE_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where WAV and MP4 files are written
    pub output_dir: PathBuf,
    /// Background clip that gets ping-pong looped
    pub loop_clip: PathBuf,
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub fps: u32,
    /// x264 preset
    pub preset: String,
    pub encoder_threads: u32,
    pub normalization: NormalizationStrategy,
    pub bridge_url: String,
    pub bridge_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let loop_clip = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_LOOP_CLIP)))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOOP_CLIP));

        Self {
            output_dir: PathBuf::from("."),
            loop_clip,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            fps: 24,
            preset: "ultrafast".to_string(),
            encoder_threads: 4,
            normalization: NormalizationStrategy::Loudness,
            bridge_url: DEFAULT_BRIDGE_URL.to_string(),
            bridge_timeout_ms: DEFAULT_BRIDGE_TIMEOUT_MS,
        }
    }
}

impl AppConfig {
    /// Defaults, overlaid by `file` if given, overlaid by the environment
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BeatloopError::Config {
                reason: format!("config file not found: {}", path.display()),
            });
        }
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text).map_err(|e| BeatloopError::Config {
            reason: format!("{}: {e}", path.display()),
        })?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Apply `BEATLOOP_*` overrides from a variable lookup
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_LOOP_CLIP) {
            self.loop_clip = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_FFMPEG) {
            self.ffmpeg_path = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_FFPROBE) {
            self.ffprobe_path = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_BRIDGE_URL) {
            self.bridge_url = v;
        }
        if let Some(v) = get(ENV_BRIDGE_TIMEOUT_MS) {
            self.bridge_timeout_ms = v.trim().parse().map_err(|_| BeatloopError::Config {
                reason: format!("{ENV_BRIDGE_TIMEOUT_MS} must be an integer, got {v:?}"),
            })?;
        }
        Ok(())
    }

    /// Reject values that would only fail later, mid-request
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: &str| {
            Err(BeatloopError::Config {
                reason: reason.to_string(),
            })
        };
        if self.fps == 0 {
            return fail("fps must be positive");
        }
        if self.encoder_threads == 0 {
            return fail("encoder_threads must be positive");
        }
        if self.ffmpeg_path.as_os_str().is_empty() || self.ffprobe_path.as_os_str().is_empty() {
            return fail("ffmpeg_path and ffprobe_path must not be empty");
        }
        if self.preset.trim().is_empty() {
            return fail("preset must not be empty");
        }
        if self.bridge_timeout_ms == 0 {
            return fail("bridge_timeout_ms must be positive");
        }
        Ok(())
    }

    /// Encoder configured from this config
    pub fn encoder(&self) -> FfmpegEncoder {
        FfmpegEncoder {
            ffmpeg: self.ffmpeg_path.clone(),
            ffprobe: self.ffprobe_path.clone(),
            preset: self.preset.clone(),
            threads: self.encoder_threads,
        }
    }
}
