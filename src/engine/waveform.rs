//! Waveform container
//!
//! Holds the raw output of a generation call: non-interleaved 32-bit float
//! samples per channel plus the sample rate the model produced them at.

use crate::error::{BeatloopError, Result};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

// ============================================================================
// Waveform
// ============================================================================

/// Generated audio, as returned by a music model
///
/// Outer Vec is channels, inner Vec is samples. All channels have the same
/// length.
///
/// # Example
/// ```
/// use beatloop::engine::Waveform;
///
/// let wave = Waveform::mono(vec![0.0; 32000], 32000).unwrap();
/// assert_eq!(wave.num_channels(), 1);
/// assert_eq!(wave.duration_secs(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl Waveform {
    /// Create a waveform from per-channel sample vectors
    ///
    /// # Errors
    /// * `InvalidAudio` - zero sample rate, no channels, or ragged channels
    pub fn new(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(BeatloopError::InvalidAudio {
                reason: "sample rate must be positive".to_string(),
                source: None,
            });
        }
        let Some(first) = samples.first() else {
            return Err(BeatloopError::InvalidAudio {
                reason: "waveform has no channels".to_string(),
                source: None,
            });
        };
        let len = first.len();
        if samples.iter().any(|ch| ch.len() != len) {
            return Err(BeatloopError::InvalidAudio {
                reason: "channels have different lengths".to_string(),
                source: None,
            });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a single-channel waveform
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::new(vec![samples], sample_rate)
    }

    /// Create a waveform from interleaved sample data
    pub fn from_interleaved(interleaved: &[f32], channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 || interleaved.len() % channels != 0 {
            return Err(BeatloopError::InvalidAudio {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    channels
                ),
                source: None,
            });
        }

        let frames = interleaved.len() / channels;
        let mut samples = vec![Vec::with_capacity(frames); channels];
        for frame in interleaved.chunks_exact(channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }
        Self::new(samples, sample_rate)
    }

    /// Convert to interleaved order (L, R, L, R, ... for stereo)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let channels = self.num_channels();
        let frames = self.num_frames();
        let mut interleaved = Vec::with_capacity(channels * frames);
        for i in 0..frames {
            for channel in &self.samples {
                interleaved.push(channel[i]);
            }
        }
        interleaved
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.samples.len()
    }

    /// Number of samples per channel
    #[inline]
    pub fn num_frames(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_frames() == 0
    }

    /// Duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }

    /// Check that every sample is finite (no NaN/Inf from the model)
    pub fn is_finite(&self) -> bool {
        self.samples.iter().flatten().all(|s| s.is_finite())
    }

    /// Peak absolute sample value (linear)
    pub fn peak(&self) -> f32 {
        self.samples
            .iter()
            .flatten()
            .map(|s| s.abs())
            .fold(0.0_f32, f32::max)
    }

    /// RMS over all channels (linear)
    pub fn rms(&self) -> f32 {
        let total = self.num_channels() * self.num_frames();
        if total == 0 {
            return 0.0;
        }
        let sum_squares: f64 = self
            .samples
            .iter()
            .flatten()
            .map(|&s| (s as f64) * (s as f64))
            .sum();
        (sum_squares / total as f64).sqrt() as f32
    }

    /// Multiply every sample by a linear gain
    pub fn scale(&mut self, gain: f32) {
        for channel in &mut self.samples {
            for sample in channel.iter_mut() {
                *sample *= gain;
            }
        }
    }

    /// Apply gain in decibels
    pub fn apply_gain_db(&mut self, gain_db: f32) {
        self.scale(db_to_linear(gain_db));
    }

    /// Apply a per-sample transfer function
    pub fn map_samples(&mut self, f: impl Fn(f32) -> f32) {
        for channel in &mut self.samples {
            for sample in channel.iter_mut() {
                *sample = f(*sample);
            }
        }
    }

    /// Clamp all samples to [-1.0, 1.0]
    pub fn clamp(&mut self) {
        self.map_samples(|s| s.clamp(-1.0, 1.0));
    }
}
