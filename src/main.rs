//! Beatloop CLI
//!
//! Command-line front end for track generation and video rendering.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use beatloop::catalog::SettingsOverrides;
use beatloop::cli::commands::{self, GenerateOptions};
use beatloop::cli::{Cli, Commands};
use beatloop::BeatloopError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

/// RUST_LOG wins; otherwise `info`, or `debug` with -v
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    debug!("beatloop v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Genres => commands::list_genres()?,
        Commands::Defaults { ref genre } => commands::show_defaults(genre)?,
        Commands::CheckPrompt { ref prompt } => commands::check_prompt(prompt)?,
        Commands::Generate {
            ref genre,
            ref prompt,
            duration,
            bpm,
            temperature,
            top_k,
            top_p,
            cfg_coef,
            mock,
        } => {
            let config = cli.load_config().context("failed to load configuration")?;
            let options = GenerateOptions {
                genre: genre.clone(),
                prompt: prompt.clone(),
                overrides: SettingsOverrides {
                    duration_secs: duration,
                    bpm,
                    temperature,
                    top_k,
                    top_p,
                    cfg_coef,
                },
                mock,
            };
            commands::generate(&config, &options)?
        }
        Commands::Composite {
            ref audio,
            ref genre,
        } => {
            let config = cli.load_config().context("failed to load configuration")?;
            commands::composite(&config, audio, genre)
                .with_context(|| format!("failed to composite {}", audio.display()))?
        }
    }
    Ok(())
}

fn report(err: &anyhow::Error) {
    eprintln!("error: {err:#}");
    if let Some(e) = err.downcast_ref::<BeatloopError>() {
        eprintln!("code: {}", e.error_code());
        for hint in e.recovery_suggestions() {
            eprintln!("  hint: {hint}");
        }
    }
}
