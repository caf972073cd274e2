//! WAV persistence for generated audio
//!
//! Generated waveforms are normalized once and written as 16-bit PCM.
//! Reading is supported for the compositor path, where an existing WAV is
//! handed to `beatloop composite`.

use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::{debug, warn};

use super::normalize::Normalization;
use super::waveform::Waveform;
use crate::error::{BeatloopError, Result};

/// Bit depth of every file we write
pub const OUTPUT_BIT_DEPTH: u16 = 16;

/// Normalize a waveform and write it to `<dir>/<basename>.wav`
///
/// The waveform is cloned before normalization so the caller's copy is left
/// untouched. If writing fails the partially written file is removed.
///
/// # Arguments
/// * `dir` - Output directory, created if missing
/// * `basename` - File stem, without extension
/// * `wave` - Audio to persist
/// * `normalization` - Level strategy applied before quantizing
///
/// # Returns
/// Path of the written file
///
/// # Errors
/// * `InvalidAudio` - Empty waveform or non-finite samples
/// * `Encode` - The WAV writer failed
/// * `Io` - The output directory could not be created
pub fn write_audio(
    dir: &Path,
    basename: &str,
    wave: &Waveform,
    normalization: &Normalization,
) -> Result<PathBuf> {
    if wave.is_empty() {
        return Err(BeatloopError::InvalidAudio {
            reason: "refusing to write an empty waveform".to_string(),
            source: None,
        });
    }
    if !wave.is_finite() {
        return Err(BeatloopError::InvalidAudio {
            reason: "waveform contains NaN or infinite samples".to_string(),
            source: None,
        });
    }

    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{basename}.wav"));

    let mut normalized = wave.clone();
    normalization.apply(&mut normalized);

    if let Err(e) = write_pcm16(&path, &normalized) {
        remove_partial(&path);
        return Err(e);
    }

    debug!(
        path = %path.display(),
        frames = normalized.num_frames(),
        channels = normalized.num_channels(),
        strategy = %normalization.strategy,
        "wrote audio"
    );
    Ok(path)
}

/// Read a WAV file into a waveform at its native sample rate
///
/// # Errors
/// * `AssetNotFound` - The file does not exist
/// * `InvalidAudio` - The file is not a readable WAV
pub fn read_waveform(path: &Path) -> Result<Waveform> {
    if !path.exists() {
        return Err(BeatloopError::AssetNotFound {
            path: path.display().to_string(),
        });
    }

    let mut reader = WavReader::open(path).map_err(|e| invalid_audio("Failed to open WAV file", e))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| invalid_audio("Failed to read float samples", e))?,
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| invalid_audio("Failed to read 16-bit samples", e))?,
        (SampleFormat::Int, bits @ (24 | 32)) => {
            let full_scale = (1u64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| invalid_audio("Failed to read integer samples", e))?
        }
        (_, bits) => {
            return Err(BeatloopError::InvalidAudio {
                reason: format!("unsupported {bits}-bit integer audio"),
                source: None,
            })
        }
    };

    Waveform::from_interleaved(&interleaved, spec.channels as usize, spec.sample_rate)
}

/// Duration of a WAV file from its header, without decoding samples
pub fn wav_duration_secs(path: &Path) -> Result<f64> {
    if !path.exists() {
        return Err(BeatloopError::AssetNotFound {
            path: path.display().to_string(),
        });
    }
    let reader = WavReader::open(path).map_err(|e| invalid_audio("Failed to open WAV file", e))?;
    let rate = reader.spec().sample_rate;
    // `duration()` counts frames, not interleaved samples
    Ok(reader.duration() as f64 / rate as f64)
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn write_pcm16(path: &Path, wave: &Waveform) -> Result<()> {
    let spec = WavSpec {
        channels: wave.num_channels() as u16,
        sample_rate: wave.sample_rate,
        bits_per_sample: OUTPUT_BIT_DEPTH,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(encode_error)?;
    for sample in wave.to_interleaved() {
        let scaled = (sample * 32767.0).round().clamp(-32768.0, 32767.0) as i16;
        writer.write_sample(scaled).map_err(encode_error)?;
    }
    writer.finalize().map_err(encode_error)
}

fn encode_error(e: hound::Error) -> BeatloopError {
    BeatloopError::encode(format!("WAV write failed: {e}"))
}

fn invalid_audio(context: &str, e: hound::Error) -> BeatloopError {
    BeatloopError::InvalidAudio {
        reason: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}

/// Best-effort removal of a file left behind by a failed write
pub(crate) fn remove_partial(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "failed to remove partial file");
    }
}
