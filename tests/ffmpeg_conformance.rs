//! External encoder conformance tests
//!
//! Runs the real ffmpeg encode path: a synthetic loop clip, generated WAVs,
//! and the compositor. The output MP4 is probed to check it matches the
//! audio length. Skipped when ffmpeg, ffprobe or libx264 are unavailable.

use std::path::{Path, PathBuf};
use std::process::Command;

use beatloop::asset::{AudioAsset, RequestId};
use beatloop::config::{ENV_FFMPEG, ENV_FFPROBE};
use beatloop::engine::{write_audio, Normalization, Waveform};
use beatloop::video::{Compositor, FfmpegEncoder, LoopPlan, VideoEncoder};

const FPS: u32 = 24;
const CLIP_SECS: u32 = 8;

fn find_bin(env: &str, default: &str) -> Option<String> {
    if let Ok(path) = std::env::var(env) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }

    let status = Command::new(default).arg("-version").output().ok()?.status;
    if status.success() {
        Some(default.to_string())
    } else {
        None
    }
}

fn find_encoder() -> Option<FfmpegEncoder> {
    let ffmpeg = find_bin(ENV_FFMPEG, "ffmpeg")?;
    let ffprobe = find_bin(ENV_FFPROBE, "ffprobe")?;

    let encoders = Command::new(&ffmpeg)
        .args(["-hide_banner", "-encoders"])
        .output()
        .ok()?;
    if !String::from_utf8_lossy(&encoders.stdout).contains("libx264") {
        return None;
    }

    Some(FfmpegEncoder {
        ffmpeg: PathBuf::from(ffmpeg),
        ffprobe: PathBuf::from(ffprobe),
        ..Default::default()
    })
}

fn synthesize_clip(encoder: &FfmpegEncoder, path: &Path) {
    let source = format!("testsrc=duration={CLIP_SECS}:size=160x120:rate={FPS}");
    let status = Command::new(&encoder.ffmpeg)
        .args(["-y", "-v", "error", "-f", "lavfi", "-i", &source])
        .args(["-c:v", "libx264", "-preset", "ultrafast", "-pix_fmt", "yuv420p"])
        .arg(path)
        .status()
        .expect("run ffmpeg");
    assert!(status.success(), "ffmpeg failed to synthesize {}", path.display());
}

fn video_frame_count(encoder: &FfmpegEncoder, path: &Path) -> u64 {
    let output = Command::new(&encoder.ffprobe)
        .args(["-v", "error", "-select_streams", "v:0", "-count_frames"])
        .args(["-show_entries", "stream=nb_read_frames"])
        .args(["-of", "default=noprint_wrappers=1:nokey=1"])
        .arg(path)
        .output()
        .expect("run ffprobe");
    assert!(output.status.success(), "ffprobe failed for {}", path.display());
    String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse()
        .expect("frame count")
}

fn audio_in(dir: &Path, name: &str, secs: f64) -> AudioAsset {
    let rate = 32000;
    let frames = (secs * rate as f64) as usize;
    let samples: Vec<f32> = (0..frames)
        .map(|i| 0.3 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / rate as f32).sin())
        .collect();
    let wave = Waveform::mono(samples, rate).unwrap();
    let path = write_audio(dir, name, &wave, &Normalization::default()).unwrap();
    AudioAsset::from_wav(&path, RequestId::new(), "house").unwrap()
}

#[test]
fn test_ffmpeg_render_matches_audio_duration() {
    let Some(encoder) = find_encoder() else {
        eprintln!("Skipping ffmpeg conformance test: ffmpeg, ffprobe or libx264 not found");
        return;
    };

    let temp = tempfile::tempdir().expect("tempdir");
    let clip = temp.path().join("loop.mp4");
    synthesize_clip(&encoder, &clip);

    let clip_secs = encoder.probe_duration(&clip).expect("probe clip");
    assert!((clip_secs - CLIP_SECS as f64).abs() < 1.0 / FPS as f64);

    let compositor = Compositor::new(encoder.clone(), &clip, FPS);
    for (name, secs, units) in [("short", 5.0, 1), ("long", 22.0, 2)] {
        let audio = audio_in(temp.path(), name, secs);
        let wav = audio.path.clone();

        let video = compositor.composite(&audio).expect("composite");
        assert_eq!(video.palindrome_units, units);
        assert!(video.path.exists());
        assert!(!wav.exists());

        let rendered = encoder.probe_duration(&video.path).expect("probe video");
        assert!(
            (rendered - secs).abs() < 1.0 / FPS as f64,
            "{name}: video is {rendered}s for {secs}s of audio"
        );

        let expected_frames = LoopPlan::new(secs, clip_secs).unwrap().frame_count(FPS);
        assert_eq!(video.frame_count, expected_frames);
        assert_eq!(video_frame_count(&encoder, &video.path), expected_frames);
    }
}

#[test]
fn test_ffmpeg_failure_leaves_no_scratch_files() {
    let Some(encoder) = find_encoder() else {
        eprintln!("Skipping ffmpeg conformance test: ffmpeg, ffprobe or libx264 not found");
        return;
    };

    let temp = tempfile::tempdir().expect("tempdir");
    let clip = temp.path().join("loop.mp4");
    std::fs::write(&clip, b"not a video").unwrap();
    let audio = audio_in(temp.path(), "broken", 5.0);

    let compositor = Compositor::new(encoder, &clip, FPS);
    let err = compositor.composite(&audio).unwrap_err();
    assert_eq!(err.error_code(), "PROBE_ERROR");
    assert!(audio.path.exists());

    let leftovers: Vec<_> = std::fs::read_dir(temp.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".part.mp4"))
        .collect();
    assert!(leftovers.is_empty());
}
