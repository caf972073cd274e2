//! Integration Tests
//!
//! End-to-end tests for the generate -> write -> composite pipeline, using
//! the mock model and an encoder that records jobs instead of running ffmpeg.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use beatloop::catalog::{self, GenerationSettings};
use beatloop::engine::{wav_duration_secs, NormalizationStrategy, Normalization};
use beatloop::neural::{MockMusicModel, MOCK_SAMPLE_RATE};
use beatloop::pipeline::{stage, Generator, Progress};
use beatloop::video::{Compositor, RenderJob, VideoEncoder};
use beatloop::{BeatloopError, Result};
use tempfile::tempdir;

/// Encoder double: fixed clip length, writes an empty MP4 per job
struct RecordingEncoder {
    clip_secs: f64,
    jobs: Mutex<Vec<RenderJob>>,
}

impl RecordingEncoder {
    fn new(clip_secs: f64) -> Self {
        Self {
            clip_secs,
            jobs: Mutex::new(Vec::new()),
        }
    }
}

impl VideoEncoder for RecordingEncoder {
    fn probe_duration(&self, _path: &Path) -> Result<f64> {
        Ok(self.clip_secs)
    }

    fn render(&self, job: &RenderJob) -> Result<()> {
        // The audio must still be on disk while rendering
        assert!(job.audio.exists());
        self.jobs.lock().unwrap().push(job.clone());
        std::fs::write(&job.output, b"")?;
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn settings(genre: &str, duration_secs: u32) -> GenerationSettings {
    GenerationSettings {
        duration_secs,
        ..catalog::settings_for(genre)
    }
}

fn clip_in(dir: &Path) -> PathBuf {
    let clip = dir.join("youtube_gif_new.mp4");
    std::fs::write(&clip, b"clip").unwrap();
    clip
}

// === Generation ===

#[test]
fn test_generated_wav_matches_requested_duration() {
    let dir = tempdir().unwrap();
    let mut generator = Generator::new(MockMusicModel::new(), dir.path());

    let asset = generator
        .generate(&catalog::default_prompt_for("House"), &settings("House", 12))
        .unwrap();

    assert!(asset.path.exists());
    assert_eq!(asset.sample_rate, MOCK_SAMPLE_RATE);
    let on_disk = wav_duration_secs(&asset.path).unwrap();
    assert!((on_disk - 12.0).abs() <= 1.0 / MOCK_SAMPLE_RATE as f64);
    assert!((asset.duration_secs - on_disk).abs() < 1e-9);
}

#[test]
fn test_each_strategy_writes_full_scale_safe_audio() {
    for strategy in [
        NormalizationStrategy::Clip,
        NormalizationStrategy::Peak,
        NormalizationStrategy::Rms,
        NormalizationStrategy::Loudness,
    ] {
        let dir = tempdir().unwrap();
        let mut generator = Generator::new(MockMusicModel::new().with_channels(2), dir.path())
            .with_normalization(Normalization::with_strategy(strategy));
        let asset = generator.generate("pads", &settings("Ambient", 10)).unwrap();

        let wave = beatloop::engine::read_waveform(&asset.path).unwrap();
        assert_eq!(wave.num_channels(), 2, "{strategy}");
        assert!(wave.peak() <= 1.0, "{strategy}");
        assert!(wave.peak() > 0.0, "{strategy}");
    }
}

#[test]
fn test_model_failure_writes_nothing() {
    let dir = tempdir().unwrap();
    let clip = clip_in(dir.path());
    let mut generator = Generator::new(MockMusicModel::failing("CUDA out of memory"), dir.path());
    let compositor = Compositor::new(RecordingEncoder::new(8.0), &clip, 24);

    let err = generator
        .generate_track("x", &settings("Trap", 10), &compositor, None)
        .unwrap_err();

    assert!(matches!(err, BeatloopError::ModelInvocation { .. }));
    let files: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(files, vec![std::ffi::OsString::from("youtube_gif_new.mp4")]);
}

// === Full Pipeline ===

#[test]
fn test_generate_track_end_to_end() {
    let dir = tempdir().unwrap();
    let clip = clip_in(dir.path());
    let mut generator = Generator::new(MockMusicModel::new(), dir.path());
    let compositor = Compositor::new(RecordingEncoder::new(8.0), &clip, 24);

    let seen = Mutex::new(Vec::new());
    let progress: Progress<'_> = &|value, _desc| seen.lock().unwrap().push(value);

    let video = generator
        .generate_track(
            &catalog::default_prompt_for("DnB"),
            &settings("DnB", 22),
            &compositor,
            Some(progress),
        )
        .unwrap();

    assert_eq!(video.palindrome_units, 2);
    assert_eq!(video.fps, 24);
    assert!((video.duration_secs - 22.0).abs() < 1e-6);
    assert!((video.frame_count as f64 / 24.0 - video.duration_secs).abs() < 1.0 / 24.0);

    let name = video.path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("dnb_"));
    assert!(name.ends_with("_with_video.mp4"));
    assert!(name.contains(&video.request_id.short()));

    // The WAV was consumed by the compositor
    let jobs = compositor.encoder().jobs.lock().unwrap();
    assert_eq!(jobs.len(), 1);
    assert!(!jobs[0].audio.exists());

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            stage::PREPARE,
            stage::GENERATE,
            stage::SAVE_AUDIO,
            stage::RENDER_VIDEO,
            stage::DONE
        ]
    );
}

#[test]
fn test_missing_clip_keeps_audio_and_reports_asset() {
    let dir = tempdir().unwrap();
    let mut generator = Generator::new(MockMusicModel::new(), dir.path());
    let compositor = Compositor::new(RecordingEncoder::new(8.0), dir.path().join("missing.mp4"), 24);

    let err = generator
        .generate_track("beat", &settings("Lo-Fi", 10), &compositor, None)
        .unwrap_err();

    assert_eq!(err.error_code(), "ASSET_NOT_FOUND");
    assert!(compositor.encoder().jobs.lock().unwrap().is_empty());
    let wavs = std::fs::read_dir(dir.path())
        .unwrap()
        .filter(|e| e.as_ref().unwrap().path().extension() == Some("wav".as_ref()))
        .count();
    assert_eq!(wavs, 1);
}

#[test]
fn test_two_requests_do_not_collide() {
    let dir = tempdir().unwrap();
    let mut generator = Generator::new(MockMusicModel::new(), dir.path());
    let a = generator.generate("one", &settings("Trance", 10)).unwrap();
    let b = generator.generate("one", &settings("Trance", 10)).unwrap();
    assert_ne!(a.path, b.path);
    assert_ne!(a.request_id, b.request_id);
    assert!(a.path.exists() && b.path.exists());
}
