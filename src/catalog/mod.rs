//! Genre parameter and prompt catalog
//!
//! A single immutable registry, built on first use and shared for the life
//! of the process. Lookups by name never fail: unknown genres fall back to
//! City Pop settings and an empty default prompt.

mod genre;
mod prompts;
mod settings;

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::Serialize;

pub use genre::Genre;
pub use prompts::{missing_prompt_markers, validate_prompt, REQUIRED_PROMPT_MARKERS};
pub use settings::{GenerationSettings, SettingsOverrides, BPM_RANGE, DURATION_RANGE};

/// Bumped whenever a template or prompt changes
pub const CATALOG_VERSION: &str = "1.0.0";

/// Genre used when a lookup name is not recognised
pub const FALLBACK_GENRE: Genre = Genre::CityPop;

/// One catalog row
#[derive(Debug, Clone, Serialize)]
pub struct GenreEntry {
    pub genre: Genre,
    pub settings: GenerationSettings,
    pub prompts: &'static [&'static str],
}

/// Versioned registry of genre templates
#[derive(Debug, Serialize)]
pub struct GenreCatalog {
    pub version: &'static str,
    entries: BTreeMap<Genre, GenreEntry>,
}

impl GenreCatalog {
    fn build() -> Self {
        let entries = Genre::ALL
            .into_iter()
            .map(|genre| {
                let entry = GenreEntry {
                    genre,
                    settings: GenerationSettings::template(genre),
                    prompts: prompts::examples_for(genre),
                };
                (genre, entry)
            })
            .collect();
        Self {
            version: CATALOG_VERSION,
            entries,
        }
    }

    /// The process-wide catalog
    pub fn global() -> &'static GenreCatalog {
        static CATALOG: OnceLock<GenreCatalog> = OnceLock::new();
        CATALOG.get_or_init(GenreCatalog::build)
    }

    pub fn entry(&self, genre: Genre) -> &GenreEntry {
        // Built from Genre::ALL, so every key is present
        &self.entries[&genre]
    }

    pub fn entries(&self) -> impl Iterator<Item = &GenreEntry> {
        self.entries.values()
    }

    /// Settings for a genre name; unknown names get City Pop settings
    pub fn settings_for(&self, name: &str) -> GenerationSettings {
        let genre = Genre::parse(name).unwrap_or_else(|| {
            tracing::debug!(name, fallback = %FALLBACK_GENRE, "unknown genre, using fallback settings");
            FALLBACK_GENRE
        });
        self.entry(genre).settings.clone()
    }

    /// First example prompt for a genre name, or "" when unknown
    pub fn default_prompt_for(&self, name: &str) -> String {
        Genre::parse(name)
            .and_then(|g| self.entry(g).prompts.first())
            .map(|p| p.to_string())
            .unwrap_or_default()
    }

    pub fn prompts_for(&self, genre: Genre) -> &'static [&'static str] {
        self.entry(genre).prompts
    }
}

/// Settings for a genre name from the global catalog
pub fn settings_for(name: &str) -> GenerationSettings {
    GenreCatalog::global().settings_for(name)
}

/// Default prompt for a genre name from the global catalog
pub fn default_prompt_for(name: &str) -> String {
    GenreCatalog::global().default_prompt_for(name)
}

/// All example prompts for a genre
pub fn prompts_for(genre: Genre) -> &'static [&'static str] {
    GenreCatalog::global().prompts_for(genre)
}
