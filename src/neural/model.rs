//! Music model trait and core types
//!
//! Defines the boundary to the generative model. The model itself is opaque:
//! it takes sampling parameters and text prompts and returns one waveform
//! per prompt at its native sample rate.

use serde::{Deserialize, Serialize};

use crate::catalog::GenerationSettings;
use crate::engine::Waveform;
use crate::error::Result;

/// Output rate of the MusicGen model family
pub const MUSICGEN_SAMPLE_RATE: u32 = 32000;

/// Sampling parameters set on the model before a generate call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Requested audio length in seconds
    #[serde(rename = "duration")]
    pub duration_secs: f32,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub cfg_coef: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            duration_secs: 30.0,
            temperature: 1.0,
            top_k: 250,
            top_p: 0.0,
            cfg_coef: 3.0,
        }
    }
}

impl From<&GenerationSettings> for GenerationParams {
    fn from(settings: &GenerationSettings) -> Self {
        Self {
            duration_secs: settings.duration_secs as f32,
            temperature: settings.temperature,
            top_k: settings.top_k,
            top_p: settings.top_p,
            cfg_coef: settings.cfg_coef,
        }
    }
}

/// Information about a music model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier (e.g., "musicgen-bridge", "mock")
    pub id: String,

    /// Human-readable name
    pub name: String,

    pub version: String,

    pub description: String,

    /// Known limitations
    pub limitations: Vec<String>,
}

/// Trait that all music models must implement
pub trait MusicModel: Send + Sync {
    /// Get model information
    fn info(&self) -> &ModelInfo;

    /// Native output sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Configure sampling for subsequent `generate` calls
    fn set_generation_params(&mut self, params: GenerationParams) -> Result<()>;

    /// Generate one waveform per prompt
    ///
    /// # Errors
    /// * `ModelInvocation` - The model failed (out of memory, bad output)
    /// * `ModelUnavailable` - The model cannot be reached at all
    fn generate(&self, prompts: &[String]) -> Result<Vec<Waveform>>;

    /// Check if the model is ready to use
    fn is_available(&self) -> bool {
        true
    }

    /// Get model ID (convenience method)
    fn id(&self) -> &str {
        &self.info().id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::settings_for;

    #[test]
    fn test_params_from_settings() {
        let settings = settings_for("Ambient");
        let params = GenerationParams::from(&settings);
        assert_eq!(params.duration_secs, 30.0);
        assert_eq!(params.temperature, 0.25);
        assert_eq!(params.top_k, 45);
        assert_eq!(params.top_p, 0.75);
        assert_eq!(params.cfg_coef, 5.5);
    }

    #[test]
    fn test_params_wire_format() {
        let json = serde_json::to_value(GenerationParams::default()).unwrap();
        assert_eq!(json["duration"], 30.0);
        assert!(json.get("duration_secs").is_none());
    }
}
