//! Output level normalization
//!
//! Strategies applied to a generated waveform right before it is written:
//! - `clip`: hard clamp to [-1, 1], no gain change
//! - `peak`: scale so the peak sits `peak_headroom_db` below full scale
//! - `rms`: scale so the RMS sits `rms_headroom_db` below full scale
//! - `loudness`: scale to `-loudness_headroom_db` LUFS (ITU-R BS.1770),
//!   optionally followed by a tanh soft compressor
//!
//! Every strategy ends with a clamp, since the file is written as PCM.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::waveform::{db_to_linear, Waveform};

// ============================================================================
// Constants
// ============================================================================

/// Default headroom below full scale for the peak strategy
const DEFAULT_PEAK_HEADROOM_DB: f32 = 1.0;

/// Default headroom below full scale for the rms strategy
const DEFAULT_RMS_HEADROOM_DB: f32 = 18.0;

/// Default loudness headroom, giving a -14 LUFS target
const DEFAULT_LOUDNESS_HEADROOM_DB: f32 = 14.0;

/// Below this energy the signal is treated as silence and left alone
const MIN_ENERGY: f32 = 2e-3;

/// Gating block length (400 ms) and hop (100 ms, 75% overlap)
const BLOCK_SECS: f64 = 0.4;
const HOP_SECS: f64 = 0.1;

/// Absolute gate in LUFS
const ABSOLUTE_GATE_LUFS: f64 = -70.0;

/// Relative gate offset in LU
const RELATIVE_GATE_LU: f64 = -10.0;

// ============================================================================
// Strategy
// ============================================================================

/// Normalization strategy applied before writing audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationStrategy {
    Clip,
    Peak,
    Rms,
    #[default]
    Loudness,
}

impl NormalizationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clip => "clip",
            Self::Peak => "peak",
            Self::Rms => "rms",
            Self::Loudness => "loudness",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "clip" => Some(Self::Clip),
            "peak" => Some(Self::Peak),
            "rms" => Some(Self::Rms),
            "loudness" => Some(Self::Loudness),
            _ => None,
        }
    }
}

impl std::fmt::Display for NormalizationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Strategy plus its tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Normalization {
    pub strategy: NormalizationStrategy,
    pub peak_headroom_db: f32,
    pub rms_headroom_db: f32,
    pub loudness_headroom_db: f32,
    /// Apply tanh soft compression after loudness gain
    pub loudness_compressor: bool,
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            strategy: NormalizationStrategy::Loudness,
            peak_headroom_db: DEFAULT_PEAK_HEADROOM_DB,
            rms_headroom_db: DEFAULT_RMS_HEADROOM_DB,
            loudness_headroom_db: DEFAULT_LOUDNESS_HEADROOM_DB,
            loudness_compressor: true,
        }
    }
}

impl Normalization {
    /// Use a strategy with default tuning
    pub fn with_strategy(strategy: NormalizationStrategy) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    /// Normalize the waveform in place
    pub fn apply(&self, wave: &mut Waveform) {
        match self.strategy {
            NormalizationStrategy::Clip => {}
            NormalizationStrategy::Peak => {
                let peak = wave.peak();
                if peak > 0.0 {
                    wave.scale(db_to_linear(-self.peak_headroom_db) / peak);
                }
            }
            NormalizationStrategy::Rms => {
                let rms = wave.rms();
                if rms > 0.0 {
                    wave.scale(db_to_linear(-self.rms_headroom_db) / rms);
                }
            }
            NormalizationStrategy::Loudness => self.normalize_loudness(wave),
        }

        let clipped = wave.samples.iter().flatten().filter(|s| s.abs() > 1.0).count();
        if clipped > 0 {
            debug!(clipped, strategy = %self.strategy, "clamping samples above full scale");
        }
        wave.clamp();
    }

    fn normalize_loudness(&self, wave: &mut Waveform) {
        if wave.rms() < MIN_ENERGY {
            debug!("signal below energy floor, skipping loudness normalization");
            return;
        }
        let input_lufs = integrated_loudness(wave);
        if !input_lufs.is_finite() {
            return;
        }
        let delta_db = -(self.loudness_headroom_db as f64) - input_lufs;
        debug!(input_lufs, delta_db, "applying loudness gain");
        wave.apply_gain_db(delta_db as f32);

        if self.loudness_compressor {
            wave.map_samples(f32::tanh);
        }
    }
}

// ============================================================================
// BS.1770 loudness measurement
// ============================================================================

/// Direct form I biquad section
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    fn run(&self, input: &[f64]) -> Vec<f64> {
        let (mut x1, mut x2, mut y1, mut y2) = (0.0, 0.0, 0.0, 0.0);
        input
            .iter()
            .map(|&x| {
                let y = self.b0 * x + self.b1 * x1 + self.b2 * x2 - self.a1 * y1 - self.a2 * y2;
                x2 = x1;
                x1 = x;
                y2 = y1;
                y1 = y;
                y
            })
            .collect()
    }
}

/// Stage 1 of the K-weighting: high shelf modelling the head
fn shelf_filter(sample_rate: f64) -> Biquad {
    let (gain_db, q, fc) = (3.999_843_853_973_347, 0.707_175_236_955_419_6, 1_681.974_450_955_533);
    let a = 10f64.powf(gain_db / 40.0);
    let w0 = 2.0 * std::f64::consts::PI * fc / sample_rate;
    let alpha = w0.sin() / (2.0 * q);
    let cos = w0.cos();
    let sqrt_a = a.sqrt();

    let a0 = (a + 1.0) - (a - 1.0) * cos + 2.0 * sqrt_a * alpha;
    Biquad {
        b0: a * ((a + 1.0) + (a - 1.0) * cos + 2.0 * sqrt_a * alpha) / a0,
        b1: -2.0 * a * ((a - 1.0) + (a + 1.0) * cos) / a0,
        b2: a * ((a + 1.0) + (a - 1.0) * cos - 2.0 * sqrt_a * alpha) / a0,
        a1: 2.0 * ((a - 1.0) - (a + 1.0) * cos) / a0,
        a2: ((a + 1.0) - (a - 1.0) * cos - 2.0 * sqrt_a * alpha) / a0,
    }
}

/// Stage 2 of the K-weighting: RLB high pass
fn highpass_filter(sample_rate: f64) -> Biquad {
    let (q, fc) = (0.500_327_037_323_877_3, 38.135_470_876_024_44);
    let w0 = 2.0 * std::f64::consts::PI * fc / sample_rate;
    let alpha = w0.sin() / (2.0 * q);
    let cos = w0.cos();

    let a0 = 1.0 + alpha;
    Biquad {
        b0: (1.0 + cos) / 2.0 / a0,
        b1: -(1.0 + cos) / a0,
        b2: (1.0 + cos) / 2.0 / a0,
        a1: -2.0 * cos / a0,
        a2: (1.0 - alpha) / a0,
    }
}

fn block_loudness(power: f64) -> f64 {
    if power <= 0.0 {
        f64::NEG_INFINITY
    } else {
        -0.691 + 10.0 * power.log10()
    }
}

/// Measure gated integrated loudness in LUFS
///
/// Mono and stereo channels all carry weight 1.0. Returns -inf for silence
/// or when every block falls under the absolute gate.
pub fn integrated_loudness(wave: &Waveform) -> f64 {
    let rate = wave.sample_rate as f64;
    let frames = wave.num_frames();
    if frames == 0 {
        return f64::NEG_INFINITY;
    }

    let shelf = shelf_filter(rate);
    let highpass = highpass_filter(rate);
    let weighted: Vec<Vec<f64>> = wave
        .samples
        .iter()
        .map(|ch| {
            let input: Vec<f64> = ch.iter().map(|&s| s as f64).collect();
            highpass.run(&shelf.run(&input))
        })
        .collect();

    let block_len = ((BLOCK_SECS * rate).round() as usize).min(frames).max(1);
    let hop = ((HOP_SECS * rate).round() as usize).max(1);

    // Summed per-channel mean square for each gating block
    let mut blocks = Vec::new();
    let mut start = 0;
    while start + block_len <= frames {
        let power: f64 = weighted
            .iter()
            .map(|ch| ch[start..start + block_len].iter().map(|s| s * s).sum::<f64>() / block_len as f64)
            .sum();
        blocks.push(power);
        start += hop;
    }

    let above_absolute: Vec<f64> = blocks
        .into_iter()
        .filter(|&p| block_loudness(p) > ABSOLUTE_GATE_LUFS)
        .collect();
    if above_absolute.is_empty() {
        return f64::NEG_INFINITY;
    }

    let mean = above_absolute.iter().sum::<f64>() / above_absolute.len() as f64;
    let relative_gate = block_loudness(mean) + RELATIVE_GATE_LU;

    let gated: Vec<f64> = above_absolute
        .into_iter()
        .filter(|&p| block_loudness(p) > relative_gate)
        .collect();
    if gated.is_empty() {
        return f64::NEG_INFINITY;
    }

    block_loudness(gated.iter().sum::<f64>() / gated.len() as f64)
}
