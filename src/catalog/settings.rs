//! Generation settings and their per-genre templates

use serde::{Deserialize, Serialize};

use super::genre::Genre;
use crate::error::{BeatloopError, Result};

/// Accepted duration range in seconds
pub const DURATION_RANGE: (u32, u32) = (10, 120);
/// Accepted tempo range
pub const BPM_RANGE: (u32, u32) = (60, 200);
/// Upper bound for top-k
pub const MAX_TOP_K: u32 = 100;
/// Upper bound for classifier-free guidance
pub const MAX_CFG_COEF: f32 = 10.0;

/// Parameters for one generation call
///
/// Values are copied out of the catalog, so editing one never affects the
/// genre template it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Tempo hint; informational, the model is steered by the prompt
    pub bpm: u32,
    #[serde(rename = "duration")]
    pub duration_secs: u32,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub cfg_coef: f32,
    /// Genre slug, used in output file names
    pub genre: String,
}

impl GenerationSettings {
    pub(crate) fn template(genre: Genre) -> Self {
        let (bpm, temperature, top_k, top_p, cfg_coef) = match genre {
            Genre::CityPop => (82, 0.3, 50, 0.8, 5.0),
            Genre::LoFi => (75, 0.3, 50, 0.8, 5.0),
            Genre::FutureBass => (150, 0.4, 60, 0.9, 4.0),
            Genre::House => (128, 0.35, 55, 0.85, 4.5),
            Genre::Trap => (140, 0.45, 65, 0.9, 4.0),
            Genre::Ambient => (70, 0.25, 45, 0.75, 5.5),
            Genre::DnB => (174, 0.4, 60, 0.85, 4.5),
            Genre::Trance => (138, 0.35, 55, 0.85, 4.5),
        };
        Self {
            bpm,
            duration_secs: 30,
            temperature,
            top_k,
            top_p,
            cfg_coef,
            genre: genre.slug().to_string(),
        }
    }

    /// Apply user overrides on top of these settings
    pub fn with_overrides(mut self, overrides: &SettingsOverrides) -> Self {
        if let Some(v) = overrides.duration_secs {
            self.duration_secs = v;
        }
        if let Some(v) = overrides.bpm {
            self.bpm = v;
        }
        if let Some(v) = overrides.temperature {
            self.temperature = v;
        }
        if let Some(v) = overrides.top_k {
            self.top_k = v;
        }
        if let Some(v) = overrides.top_p {
            self.top_p = v;
        }
        if let Some(v) = overrides.cfg_coef {
            self.cfg_coef = v;
        }
        self
    }

    /// Check every field against its accepted range
    ///
    /// # Errors
    /// * `InvalidSettings` - naming the first offending field
    pub fn validate(&self) -> Result<()> {
        let (min_d, max_d) = DURATION_RANGE;
        if !(min_d..=max_d).contains(&self.duration_secs) {
            return Err(invalid("duration", self.duration_secs, format!("{min_d}..={max_d} seconds")));
        }
        let (min_bpm, max_bpm) = BPM_RANGE;
        if !(min_bpm..=max_bpm).contains(&self.bpm) {
            return Err(invalid("bpm", self.bpm, format!("{min_bpm}..={max_bpm}")));
        }
        if !(self.temperature > 0.0 && self.temperature <= 1.0) {
            return Err(invalid("temperature", self.temperature, "(0, 1]"));
        }
        if !(1..=MAX_TOP_K).contains(&self.top_k) {
            return Err(invalid("top_k", self.top_k, format!("1..={MAX_TOP_K}")));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(invalid("top_p", self.top_p, "(0, 1]"));
        }
        if !(self.cfg_coef > 0.0 && self.cfg_coef <= MAX_CFG_COEF) {
            return Err(invalid("cfg_coef", self.cfg_coef, format!("(0, {MAX_CFG_COEF}]")));
        }
        if self.genre.trim().is_empty() {
            return Err(invalid("genre", "\"\"", "a genre identifier"));
        }
        Ok(())
    }
}

fn invalid(param: &str, value: impl ToString, expected: impl Into<String>) -> BeatloopError {
    BeatloopError::InvalidSettings {
        param: param.to_string(),
        value: value.to_string(),
        expected: expected.into(),
    }
}

/// Optional per-request overrides of a genre template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsOverrides {
    pub duration_secs: Option<u32>,
    pub bpm: Option<u32>,
    pub temperature: Option<f32>,
    pub top_k: Option<u32>,
    pub top_p: Option<f32>,
    pub cfg_coef: Option<f32>,
}

impl SettingsOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_templates_validate() {
        for genre in Genre::ALL {
            let settings = GenerationSettings::template(genre);
            settings.validate().unwrap();
            assert_eq!(settings.genre, genre.slug());
            assert_eq!(settings.duration_secs, 30);
        }
    }

    #[test]
    fn test_overrides_apply_only_given_fields() {
        let base = GenerationSettings::template(Genre::House);
        let overrides = SettingsOverrides {
            duration_secs: Some(60),
            top_p: Some(0.95),
            ..Default::default()
        };
        let out = base.clone().with_overrides(&overrides);
        assert_eq!(out.duration_secs, 60);
        assert_eq!(out.top_p, 0.95);
        assert_eq!(out.bpm, base.bpm);
        assert_eq!(out.cfg_coef, base.cfg_coef);
        assert!(SettingsOverrides::default().is_empty());
        assert!(!overrides.is_empty());
    }

    #[test]
    fn test_validate_reports_field() {
        let mut settings = GenerationSettings::template(Genre::Trap);
        settings.temperature = 0.0;
        match settings.validate() {
            Err(BeatloopError::InvalidSettings { param, .. }) => assert_eq!(param, "temperature"),
            other => panic!("expected InvalidSettings, got {other:?}"),
        }

        let mut settings = GenerationSettings::template(Genre::Trap);
        settings.duration_secs = 5;
        assert!(settings.validate().is_err());

        let mut settings = GenerationSettings::template(Genre::Trap);
        settings.top_k = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_serializes_with_duration_key() {
        let json = serde_json::to_value(GenerationSettings::template(Genre::LoFi)).unwrap();
        assert_eq!(json["duration"], 30);
        assert_eq!(json["genre"], "lofi");
        assert_eq!(json["bpm"], 75);
    }
}
