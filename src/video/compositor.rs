//! Loop compositor: audio asset in, video asset out

use std::path::{Path, PathBuf};

use tracing::{info, info_span, warn};

use super::{LoopPlan, RenderJob, VideoEncoder};
use crate::asset::{AudioAsset, RequestId, VideoAsset};
use crate::engine::io::remove_partial;
use crate::error::{BeatloopError, Result};

/// Output path for an audio file: `<stem>_with_video.mp4` next to it
pub fn video_path_for(audio: &Path) -> PathBuf {
    let stem = audio
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    audio.with_file_name(format!("{stem}_with_video.mp4"))
}

/// Path the encoder writes to before the result replaces `video`
fn scratch_path_for(video: &Path, request_id: &RequestId) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    video.with_file_name(format!("{stem}.{}.part.mp4", request_id.short()))
}

/// Stitches generated audio to a looping background clip
pub struct Compositor<E: VideoEncoder> {
    encoder: E,
    clip: PathBuf,
    fps: u32,
}

impl<E: VideoEncoder> Compositor<E> {
    pub fn new(encoder: E, clip: impl Into<PathBuf>, fps: u32) -> Self {
        Self {
            encoder,
            clip: clip.into(),
            fps,
        }
    }

    pub fn clip(&self) -> &Path {
        &self.clip
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Plan the loop for an audio asset without rendering
    ///
    /// # Errors
    /// * `AssetNotFound` - The loop clip is missing
    /// * `Probe` - The clip duration could not be read
    pub fn plan(&self, audio: &AudioAsset) -> Result<LoopPlan> {
        if !self.clip.exists() {
            return Err(BeatloopError::AssetNotFound {
                path: self.clip.display().to_string(),
            });
        }
        let clip_secs = self.encoder.probe_duration(&self.clip)?;
        LoopPlan::new(audio.duration_secs, clip_secs)
    }

    /// Render the video for an audio asset
    ///
    /// The encoder writes to a scratch file that is renamed over the final
    /// path only after it succeeds, so a failed render leaves any earlier
    /// video in place. On success the source WAV is deleted; failing to
    /// delete it is only logged. On failure the WAV is kept.
    ///
    /// # Errors
    /// * `AssetNotFound` - The loop clip or the audio file is missing
    /// * `Probe` - The clip duration could not be read
    /// * `Encode` - The encoder failed
    pub fn composite(&self, audio: &AudioAsset) -> Result<VideoAsset> {
        let span = info_span!("composite", request_id = %audio.request_id);
        let _guard = span.enter();

        let plan = self.plan(audio)?;
        if !audio.path.exists() {
            return Err(BeatloopError::AssetNotFound {
                path: audio.path.display().to_string(),
            });
        }

        let output = video_path_for(&audio.path);
        let job = RenderJob {
            clip: self.clip.clone(),
            audio: audio.path.clone(),
            output: scratch_path_for(&output, &audio.request_id),
            plan,
            fps: self.fps,
        };
        info!(
            encoder = self.encoder.name(),
            audio_secs = plan.output_secs(),
            clip_secs = plan.clip_secs(),
            units = plan.units(),
            output = %output.display(),
            "rendering video"
        );

        if let Err(e) = self.encoder.render(&job) {
            remove_partial(&job.output);
            return Err(e);
        }
        if !job.output.exists() {
            return Err(BeatloopError::encode(format!(
                "encoder reported success but {} is missing",
                job.output.display()
            )));
        }
        if let Err(e) = std::fs::rename(&job.output, &output) {
            remove_partial(&job.output);
            return Err(BeatloopError::encode(format!(
                "could not move render to {}: {e}",
                output.display()
            )));
        }

        if let Err(e) = std::fs::remove_file(&audio.path) {
            warn!(path = %audio.path.display(), error = %e, "failed to remove source audio");
        }

        Ok(VideoAsset {
            path: output,
            request_id: audio.request_id,
            duration_secs: plan.output_secs(),
            frame_count: plan.frame_count(self.fps),
            fps: self.fps,
            palindrome_units: plan.units(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::RequestId;
    use chrono::Utc;
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    /// Records jobs and writes a placeholder output file
    struct FakeEncoder {
        clip_secs: f64,
        fail: bool,
        jobs: Mutex<Vec<RenderJob>>,
    }

    impl FakeEncoder {
        fn new(clip_secs: f64) -> Self {
            Self {
                clip_secs,
                fail: false,
                jobs: Mutex::new(Vec::new()),
            }
        }
    }

    impl VideoEncoder for FakeEncoder {
        fn probe_duration(&self, _path: &Path) -> Result<f64> {
            Ok(self.clip_secs)
        }

        fn render(&self, job: &RenderJob) -> Result<()> {
            self.jobs.lock().unwrap().push(job.clone());
            std::fs::write(&job.output, b"partial")?;
            if self.fail {
                return Err(BeatloopError::encode("boom"));
            }
            Ok(())
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn setup(audio_secs: f64) -> (TempDir, PathBuf, AudioAsset) {
        let dir = tempdir().unwrap();
        let clip = dir.path().join("loop.mp4");
        std::fs::write(&clip, b"clip").unwrap();
        let wav = dir.path().join("house_1700000000_abcdef12.wav");
        std::fs::write(&wav, b"wav").unwrap();
        let asset = AudioAsset {
            path: wav,
            request_id: RequestId::new(),
            genre: "house".to_string(),
            duration_secs: audio_secs,
            sample_rate: 32000,
            channels: 1,
            created_at: Utc::now(),
        };
        (dir, clip, asset)
    }

    #[test]
    fn test_video_path_for() {
        assert_eq!(
            video_path_for(Path::new("/out/lofi_1_deadbeef.wav")),
            PathBuf::from("/out/lofi_1_deadbeef_with_video.mp4")
        );
    }

    #[test]
    fn test_composite_success_consumes_wav() {
        let (_dir, clip, audio) = setup(22.0);
        let compositor = Compositor::new(FakeEncoder::new(8.0), &clip, 24);

        let video = compositor.composite(&audio).unwrap();
        assert_eq!(video.palindrome_units, 2);
        assert_eq!(video.duration_secs, 22.0);
        assert_eq!(video.frame_count, 528);
        assert_eq!(video.request_id, audio.request_id);
        assert!(video.path.exists());
        assert!(!audio.path.exists());

        let jobs = compositor.encoder().jobs.lock().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].audio, audio.path);
    }

    #[test]
    fn test_short_audio_single_unit() {
        let (_dir, clip, audio) = setup(5.0);
        let video = Compositor::new(FakeEncoder::new(8.0), &clip, 24)
            .composite(&audio)
            .unwrap();
        assert_eq!(video.palindrome_units, 1);
        assert_eq!(video.duration_secs, 5.0);
    }

    #[test]
    fn test_missing_clip_fails_before_encoding() {
        let (dir, _clip, audio) = setup(22.0);
        let compositor = Compositor::new(FakeEncoder::new(8.0), dir.path().join("gone.mp4"), 24);

        let err = compositor.composite(&audio).unwrap_err();
        assert!(matches!(err, BeatloopError::AssetNotFound { .. }));
        assert!(compositor.encoder().jobs.lock().unwrap().is_empty());
        assert!(audio.path.exists());
    }

    #[test]
    fn test_encode_failure_keeps_wav_and_removes_partial() {
        let (_dir, clip, audio) = setup(22.0);
        let mut encoder = FakeEncoder::new(8.0);
        encoder.fail = true;
        let compositor = Compositor::new(encoder, &clip, 24);

        let err = compositor.composite(&audio).unwrap_err();
        assert_eq!(err.error_code(), "ENCODE_ERROR");
        assert!(audio.path.exists());
        assert!(!video_path_for(&audio.path).exists());
        let jobs = compositor.encoder().jobs.lock().unwrap();
        assert!(!jobs[0].output.exists());
    }

    #[test]
    fn test_encode_failure_keeps_earlier_video() {
        let (_dir, clip, audio) = setup(22.0);
        let earlier = video_path_for(&audio.path);
        std::fs::write(&earlier, b"earlier render").unwrap();

        let mut encoder = FakeEncoder::new(8.0);
        encoder.fail = true;
        let compositor = Compositor::new(encoder, &clip, 24);

        assert!(compositor.composite(&audio).is_err());
        assert_eq!(std::fs::read(&earlier).unwrap(), b"earlier render");
    }

    #[test]
    fn test_success_replaces_earlier_video() {
        let (_dir, clip, audio) = setup(5.0);
        let earlier = video_path_for(&audio.path);
        std::fs::write(&earlier, b"earlier render").unwrap();

        let compositor = Compositor::new(FakeEncoder::new(8.0), &clip, 24);
        let video = compositor.composite(&audio).unwrap();
        assert_eq!(video.path, earlier);
        assert_eq!(std::fs::read(&earlier).unwrap(), b"partial");

        let jobs = compositor.encoder().jobs.lock().unwrap();
        assert_ne!(jobs[0].output, earlier);
        assert!(!jobs[0].output.exists());
    }
}
