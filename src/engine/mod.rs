//! Audio engine
//!
//! In-memory waveform handling and WAV persistence:
//! - `Waveform` container returned by music models
//! - Output normalization (clip / peak / rms / loudness)
//! - 16-bit PCM WAV writing and reading

pub mod io;
pub mod normalize;
pub mod waveform;

pub use io::{read_waveform, wav_duration_secs, write_audio};
pub use normalize::{integrated_loudness, Normalization, NormalizationStrategy};
pub use waveform::{db_to_linear, linear_to_db, Waveform};
