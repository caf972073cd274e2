//! Mock music model for testing
//!
//! Produces deterministic synthesized audio instead of calling a real model,
//! so the whole pipeline can run without a GPU or a model server. The tone
//! pitch is derived from the prompt text, so different prompts give
//! different (but repeatable) output.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::model::{GenerationParams, ModelInfo, MusicModel, MUSICGEN_SAMPLE_RATE};
use crate::engine::Waveform;
use crate::error::{BeatloopError, Result};

/// The mock imitates MusicGen output
pub const MOCK_SAMPLE_RATE: u32 = MUSICGEN_SAMPLE_RATE;

/// Mock text-to-music model
pub struct MockMusicModel {
    info: ModelInfo,
    sample_rate: u32,
    channels: usize,
    params: Option<GenerationParams>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockMusicModel {
    pub fn new() -> Self {
        Self {
            info: ModelInfo {
                id: "mock".to_string(),
                name: "Mock Music Model".to_string(),
                version: "1.0-mock".to_string(),
                description: "Deterministic tone generator standing in for a text-to-music model"
                    .to_string(),
                limitations: vec!["Ignores everything in the prompt except its bytes".to_string()],
            },
            sample_rate: MOCK_SAMPLE_RATE,
            channels: 1,
            params: None,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// A model whose `generate` always fails with the given reason
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::new()
        }
    }

    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels.max(1);
        self
    }

    /// Parameters from the most recent `set_generation_params`
    pub fn params(&self) -> Option<&GenerationParams> {
        self.params.as_ref()
    }

    /// Number of `generate` calls so far
    pub fn generate_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn synthesize(&self, prompt: &str, params: &GenerationParams) -> Result<Waveform> {
        let frames = (params.duration_secs as f64 * self.sample_rate as f64).round() as usize;

        // Stable pitch per prompt: 110..440 Hz
        let seed = prompt.bytes().fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
        let freq = 110.0 + (seed % 330) as f32;
        let rate = self.sample_rate as f32;

        // Simple plucked envelope retriggered every half second
        let beat = (rate * 0.5).max(1.0) as usize;
        let channel: Vec<f32> = (0..frames)
            .map(|i| {
                let t = i as f32 / rate;
                let env = (-((i % beat) as f32 / rate) * 6.0).exp();
                0.4 * env * (2.0 * std::f32::consts::PI * freq * t).sin()
            })
            .collect();

        Waveform::new(vec![channel; self.channels], self.sample_rate)
    }
}

impl Default for MockMusicModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MusicModel for MockMusicModel {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn set_generation_params(&mut self, params: GenerationParams) -> Result<()> {
        self.params = Some(params);
        Ok(())
    }

    fn generate(&self, prompts: &[String]) -> Result<Vec<Waveform>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = &self.failure {
            return Err(BeatloopError::model(reason.clone()));
        }

        let params = self.params.unwrap_or_default();
        prompts
            .iter()
            .map(|prompt| self.synthesize(prompt, &params))
            .collect()
    }
}
