//! CLI Module
//!
//! Command-line front end for beatloop.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::error::Result;

/// Beatloop - genre-driven music generation with a looping video track
#[derive(Parser, Debug)]
#[command(name = "beatloop")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for generated audio and video
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Background clip to loop under the audio
    #[arg(long, global = true)]
    pub loop_clip: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Load configuration and apply the global flags on top
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(clip) = &self.loop_clip {
            config.loop_clip = clip.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List genres and their default settings
    #[command(name = "genres")]
    Genres,

    /// Print a genre's settings and default prompt as JSON
    #[command(name = "defaults")]
    Defaults {
        /// Genre name, e.g. "Lo-Fi" or "future_bass"
        genre: String,
    },

    /// Check a prompt for the intro/outro structure markers
    #[command(name = "check-prompt")]
    CheckPrompt {
        prompt: String,
    },

    /// Generate a track and render its video
    #[command(name = "generate")]
    Generate {
        #[arg(short, long, default_value = "City Pop")]
        genre: String,

        /// Text prompt; defaults to the genre's example prompt
        #[arg(short, long)]
        prompt: Option<String>,

        /// Length in seconds (10-120)
        #[arg(short, long)]
        duration: Option<u32>,

        #[arg(long)]
        bpm: Option<u32>,

        #[arg(long)]
        temperature: Option<f32>,

        #[arg(long)]
        top_k: Option<u32>,

        #[arg(long)]
        top_p: Option<f32>,

        #[arg(long)]
        cfg_coef: Option<f32>,

        /// Use the built-in tone generator instead of the model bridge
        #[arg(long)]
        mock: bool,
    },

    /// Render the looping video for an existing WAV
    #[command(name = "composite")]
    Composite {
        #[arg(short, long)]
        audio: PathBuf,

        /// Genre label recorded for the asset
        #[arg(short, long, default_value = "unknown")]
        genre: String,
    },
}
