//! ffmpeg / ffprobe backed encoder
//!
//! The whole loop (reverse, repeat, trim, mux) happens in one ffmpeg
//! invocation driven by a filter graph built from the `LoopPlan`.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::debug;

use super::{RenderJob, VideoEncoder};
use crate::error::{BeatloopError, Result};

/// Lines of ffmpeg stderr kept in error messages
const STDERR_TAIL_LINES: usize = 8;

/// Seconds with six decimals, truncated so the value never exceeds `secs`
fn secs_arg(secs: f64) -> String {
    format!("{:.6}", (secs * 1e6).floor() / 1e6)
}

/// Encoder settings
#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegEncoder {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    /// x264 preset
    pub preset: String,
    pub threads: u32,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            preset: "ultrafast".to_string(),
            threads: 4,
        }
    }
}

impl FfmpegEncoder {
    /// Filter graph turning input 0 into the looped, trimmed `[outv]` stream
    ///
    /// ```text
    /// [0:v] -> split -> fwd ---------------------\
    ///                -> reverse -> rev -> concat -> unit -> split n -> concat -> trim -> fps -> [outv]
    /// ```
    pub fn filter_graph(job: &RenderJob) -> String {
        let units = job.plan.units();
        let mut graph = String::from(
            "[0:v]split=2[fwd][rsrc];[rsrc]reverse[rev];[fwd][rev]concat=n=2:v=1:a=0[unit];",
        );

        let looped = if units == 1 {
            "unit".to_string()
        } else {
            let labels: String = (0..units).map(|i| format!("[u{i}]")).collect();
            graph.push_str(&format!("[unit]split={units}{labels};"));
            graph.push_str(&format!("{labels}concat=n={units}:v=1:a=0[looped];"));
            "looped".to_string()
        };

        graph.push_str(&format!(
            "[{looped}]trim=duration={},setpts=PTS-STARTPTS,fps={}[outv]",
            secs_arg(job.plan.output_secs()),
            job.fps
        ));
        graph
    }

    /// Full ffmpeg argument list for a render job
    pub fn render_args(&self, job: &RenderJob) -> Vec<String> {
        let duration = secs_arg(job.plan.output_secs());
        vec![
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            job.clip.display().to_string(),
            "-i".into(),
            job.audio.display().to_string(),
            "-filter_complex".into(),
            Self::filter_graph(job),
            "-map".into(),
            "[outv]".into(),
            "-map".into(),
            "1:a".into(),
            "-frames:v".into(),
            job.plan.frame_count(job.fps).to_string(),
            "-t".into(),
            duration,
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            self.preset.clone(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-c:a".into(),
            "aac".into(),
            "-threads".into(),
            self.threads.to_string(),
            job.output.display().to_string(),
        ]
    }

    fn probe_args(path: &Path) -> Vec<String> {
        vec![
            "-v".into(),
            "error".into(),
            "-show_entries".into(),
            "format=duration".into(),
            "-of".into(),
            "default=noprint_wrappers=1:nokey=1".into(),
            path.display().to_string(),
        ]
    }
}

/// Parse ffprobe's bare duration output
pub fn parse_probe_output(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}

fn stderr_tail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stderr.lines().collect();
    lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n")
}

impl VideoEncoder for FfmpegEncoder {
    fn probe_duration(&self, path: &Path) -> Result<f64> {
        let probe_err = |reason: String| BeatloopError::Probe {
            path: path.display().to_string(),
            reason,
        };

        let output = Command::new(&self.ffprobe)
            .args(Self::probe_args(path))
            .output()
            .map_err(|e| probe_err(format!("failed to launch {}: {e}", self.ffprobe.display())))?;

        if !output.status.success() {
            return Err(probe_err(format!("{}: {}", output.status, stderr_tail(&output))));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_probe_output(&stdout)
            .ok_or_else(|| probe_err(format!("no usable duration in {:?}", stdout.trim())))
    }

    fn render(&self, job: &RenderJob) -> Result<()> {
        let args = self.render_args(job);
        debug!(ffmpeg = %self.ffmpeg.display(), ?args, "running encoder");

        let output = Command::new(&self.ffmpeg).args(&args).output().map_err(|e| {
            BeatloopError::encode(format!("failed to launch {}: {e}", self.ffmpeg.display()))
        })?;

        if !output.status.success() {
            return Err(BeatloopError::encode(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr_tail(&output)
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}
