//! Beatloop - genre-driven music generation with a looping video track
//!
//! A thin orchestration layer around a pretrained text-to-music model and
//! ffmpeg:
//! 1. Pick sampling settings and an example prompt from the genre catalog
//! 2. Ask the model for a waveform and write it as a loudness-normalized WAV
//! 3. Ping-pong loop a short background clip for exactly the audio length
//!    and mux both into an MP4
//!
//! # Example
//! ```no_run
//! use beatloop::catalog;
//! use beatloop::neural::MockMusicModel;
//! use beatloop::pipeline::Generator;
//! use beatloop::video::{Compositor, FfmpegEncoder};
//!
//! let settings = catalog::settings_for("Lo-Fi");
//! let prompt = catalog::default_prompt_for("Lo-Fi");
//! let mut generator = Generator::new(MockMusicModel::new(), "out");
//! let compositor = Compositor::new(FfmpegEncoder::default(), "youtube_gif_new.mp4", 24);
//! let video = generator.generate_track(&prompt, &settings, &compositor, None)?;
//! println!("{}", video.path.display());
//! # Ok::<(), beatloop::BeatloopError>(())
//! ```

pub mod asset;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod neural;
pub mod pipeline;
pub mod video;

pub use asset::{AudioAsset, RequestId, VideoAsset};
pub use config::AppConfig;
pub use error::{BeatloopError, Result};
