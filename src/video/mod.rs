//! Background video rendering
//!
//! Turns a generated WAV plus a short loop clip into an MP4 whose video
//! track ping-pongs the clip for exactly the length of the audio.

mod compositor;
mod ffmpeg;
mod plan;

use std::path::{Path, PathBuf};

pub use compositor::{video_path_for, Compositor};
pub use ffmpeg::{parse_probe_output, FfmpegEncoder};
pub use plan::LoopPlan;

use crate::error::Result;

/// Everything an encoder needs for one render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    pub clip: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
    pub plan: LoopPlan,
    pub fps: u32,
}

/// Media backend used by the compositor
pub trait VideoEncoder: Send + Sync {
    /// Duration of a media file in seconds
    ///
    /// # Errors
    /// * `Probe` - The file could not be inspected
    fn probe_duration(&self, path: &Path) -> Result<f64>;

    /// Render `job.output` from the clip and audio
    ///
    /// # Errors
    /// * `Encode` - The encoder failed or could not be launched
    fn render(&self, job: &RenderJob) -> Result<()>;

    fn name(&self) -> &str;
}
