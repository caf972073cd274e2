//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use tracing::{info, warn};

use crate::asset::{AudioAsset, RequestId};
use crate::catalog::{self, missing_prompt_markers, Genre, GenreCatalog, SettingsOverrides};
use crate::config::AppConfig;
use crate::engine::Normalization;
use crate::error::{BeatloopError, Result};
use crate::neural::{BridgeModel, MockMusicModel, MusicModel, MUSICGEN_SAMPLE_RATE};
use crate::pipeline::{Generator, Progress};
use crate::video::Compositor;

/// List every genre with its template settings.
pub fn list_genres() -> Result<()> {
    let catalog = GenreCatalog::global();
    println!(
        "{:<12} {:<12} {:>4} {:>5} {:>5} {:>5} {:>5} {:>4}",
        "GENRE", "SLUG", "BPM", "SECS", "TEMP", "TOPK", "TOPP", "CFG"
    );
    for entry in catalog.entries() {
        let s = &entry.settings;
        println!(
            "{:<12} {:<12} {:>4} {:>5} {:>5.2} {:>5} {:>5.2} {:>4.1}",
            entry.genre.display_name(),
            entry.genre.slug(),
            s.bpm,
            s.duration_secs,
            s.temperature,
            s.top_k,
            s.top_p,
            s.cfg_coef
        );
    }
    println!("catalog version {}", catalog.version);
    Ok(())
}

/// Print settings and default prompt for a genre as JSON.
pub fn show_defaults(genre: &str) -> Result<()> {
    let parsed: Genre = genre.parse()?;
    let value = serde_json::json!({
        "genre": parsed.display_name(),
        "catalog_version": catalog::CATALOG_VERSION,
        "settings": catalog::settings_for(genre),
        "prompt": catalog::default_prompt_for(genre),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Lint a prompt; fails when structure markers are missing.
pub fn check_prompt(prompt: &str) -> Result<()> {
    let missing = missing_prompt_markers(prompt);
    if missing.is_empty() {
        println!("ok: prompt contains all structure markers");
        return Ok(());
    }
    for marker in &missing {
        println!("missing: \"{marker}\"");
    }
    Err(BeatloopError::InvalidPrompt {
        reason: format!("missing structure markers: {}", missing.join(", ")),
    })
}

/// Options for the generate command
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub genre: String,
    pub prompt: Option<String>,
    pub overrides: SettingsOverrides,
    pub mock: bool,
}

/// Run the full pipeline and print the video path.
pub fn generate(config: &AppConfig, options: &GenerateOptions) -> Result<()> {
    if Genre::parse(&options.genre).is_none() {
        warn!(genre = %options.genre, "unknown genre, using City Pop settings");
    }
    let settings = catalog::settings_for(&options.genre).with_overrides(&options.overrides);
    let prompt = options
        .prompt
        .clone()
        .unwrap_or_else(|| catalog::default_prompt_for(&options.genre));

    if options.mock {
        run_generate(config, MockMusicModel::new(), &prompt, &settings)
    } else {
        let model = BridgeModel::new(
            config.bridge_url.clone(),
            config.bridge_timeout_ms,
            MUSICGEN_SAMPLE_RATE,
        );
        if !model.is_available() {
            return Err(BeatloopError::ModelUnavailable {
                reason: format!("no model bridge answering at {}", model.bridge_url()),
            });
        }
        run_generate(config, model, &prompt, &settings)
    }
}

fn run_generate<M: MusicModel>(
    config: &AppConfig,
    model: M,
    prompt: &str,
    settings: &catalog::GenerationSettings,
) -> Result<()> {
    info!(model = model.id(), genre = %settings.genre, "starting generation");

    let mut generator = Generator::new(model, &config.output_dir)
        .with_normalization(Normalization::with_strategy(config.normalization));
    let compositor = Compositor::new(config.encoder(), &config.loop_clip, config.fps);

    let progress: Progress<'_> = &|value, desc| eprintln!("[{:>3.0}%] {desc}", value * 100.0);
    let video = generator.generate_track(prompt, settings, &compositor, Some(progress))?;

    println!("{}", video.path.display());
    Ok(())
}

/// Render the looping video for an existing WAV and print its path.
pub fn composite(config: &AppConfig, audio: &Path, genre: &str) -> Result<()> {
    let asset = AudioAsset::from_wav(audio, RequestId::new(), genre)?;
    let compositor = Compositor::new(config.encoder(), &config.loop_clip, config.fps);
    let video = compositor.composite(&asset)?;
    println!("{}", video.path.display());
    Ok(())
}
