//! Track generation pipeline
//!
//! Ties the catalog settings, the music model, WAV persistence and the
//! compositor together. One request at a time; every call gets its own
//! request id, which appears in the output file names and the log span.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, info_span, warn};

use super::naming::output_stem;
use super::state::{PipelineState, RequestTracker};
use crate::asset::{AudioAsset, RequestId, VideoAsset};
use crate::catalog::{missing_prompt_markers, GenerationSettings};
use crate::engine::{write_audio, Normalization};
use crate::error::{BeatloopError, Result};
use crate::neural::{GenerationParams, MusicModel};
use crate::video::{Compositor, VideoEncoder};

/// Progress callback: fraction in `[0, 1]` and a short stage description
pub type Progress<'a> = &'a dyn Fn(f32, &str);

/// Stage checkpoints reported through `Progress`
pub mod stage {
    pub const PREPARE: f32 = 0.1;
    pub const GENERATE: f32 = 0.3;
    pub const SAVE_AUDIO: f32 = 0.6;
    pub const RENDER_VIDEO: f32 = 0.8;
    pub const DONE: f32 = 1.0;
}

fn report(progress: Option<Progress<'_>>, value: f32, desc: &str) {
    if let Some(callback) = progress {
        callback(value, desc);
    }
}

/// Generates tracks with a music model and writes them to an output dir
pub struct Generator<M: MusicModel> {
    model: M,
    output_dir: PathBuf,
    normalization: Normalization,
}

impl<M: MusicModel> Generator<M> {
    pub fn new(model: M, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            model,
            output_dir: output_dir.into(),
            normalization: Normalization::default(),
        }
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Generate audio for a prompt and write it as a WAV
    ///
    /// The prompt is linted for the structural markers; a prompt missing
    /// them is logged but still generated.
    ///
    /// # Errors
    /// * `InvalidPrompt` - The prompt is empty
    /// * `InvalidSettings` - A setting is out of range
    /// * `ModelInvocation` / `ModelUnavailable` - The model failed
    /// * `Encode` - The WAV could not be written
    pub fn generate(&mut self, prompt: &str, settings: &GenerationSettings) -> Result<AudioAsset> {
        self.generate_for(RequestId::new(), prompt, settings, None)
    }

    /// Generate audio and render the looping video for it
    ///
    /// Progress is reported at 0.1 (prepare), 0.3 (generate), 0.6 (save
    /// audio), 0.8 (render video) and 1.0 (done). The intermediate WAV is
    /// consumed by the compositor on success.
    pub fn generate_track<E: VideoEncoder>(
        &mut self,
        prompt: &str,
        settings: &GenerationSettings,
        compositor: &Compositor<E>,
        progress: Option<Progress<'_>>,
    ) -> Result<VideoAsset> {
        let request_id = RequestId::new();
        let span = info_span!("track", request_id = %request_id, genre = %settings.genre);
        let _guard = span.enter();

        let mut tracker = RequestTracker::new();
        tracker.transition(PipelineState::Generating)?;

        let audio = match self.generate_for(request_id, prompt, settings, progress) {
            Ok(audio) => audio,
            Err(e) => {
                tracker.fail(&e)?;
                warn!(error = %e, code = e.error_code(), "generation failed");
                return Err(e);
            }
        };

        tracker.transition(PipelineState::Encoding)?;
        report(progress, stage::RENDER_VIDEO, "rendering video");

        let video = match compositor.composite(&audio) {
            Ok(video) => video,
            Err(e) => {
                tracker.fail(&e)?;
                warn!(error = %e, code = e.error_code(), "video rendering failed");
                return Err(e);
            }
        };

        tracker.transition(PipelineState::Done)?;
        report(progress, stage::DONE, "done");
        info!(path = %video.path.display(), secs = video.duration_secs, "track ready");
        Ok(video)
    }

    fn generate_for(
        &mut self,
        request_id: RequestId,
        prompt: &str,
        settings: &GenerationSettings,
        progress: Option<Progress<'_>>,
    ) -> Result<AudioAsset> {
        let span = info_span!("generate", request_id = %request_id, genre = %settings.genre);
        let _guard = span.enter();

        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(BeatloopError::InvalidPrompt {
                reason: "prompt is empty".to_string(),
            });
        }
        settings.validate()?;

        let missing = missing_prompt_markers(prompt);
        if !missing.is_empty() {
            warn!(?missing, "prompt lacks structure markers; output may not loop cleanly");
        }

        report(progress, stage::PREPARE, "preparing model");
        self.model
            .set_generation_params(GenerationParams::from(settings))?;

        report(progress, stage::GENERATE, "generating music");
        info!(
            model = self.model.id(),
            duration_secs = settings.duration_secs,
            "generating"
        );
        let wave = self
            .model
            .generate(&[prompt.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| BeatloopError::model("model returned no audio"))?;

        if wave.sample_rate != self.model.sample_rate() {
            warn!(
                expected = self.model.sample_rate(),
                actual = wave.sample_rate,
                "model output sample rate differs from advertised rate"
            );
        }

        report(progress, stage::SAVE_AUDIO, "saving audio");
        let created_at = Utc::now();
        let stem = output_stem(&settings.genre, created_at, &request_id);
        let path = write_audio(&self.output_dir, &stem, &wave, &self.normalization)?;

        info!(path = %path.display(), secs = wave.duration_secs(), "audio written");
        Ok(AudioAsset {
            path,
            request_id,
            genre: settings.genre.clone(),
            duration_secs: wave.duration_secs(),
            sample_rate: wave.sample_rate,
            channels: wave.num_channels() as u16,
            created_at,
        })
    }
}
