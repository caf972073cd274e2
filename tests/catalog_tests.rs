//! Catalog Tests
//!
//! Lookups through the public API: totality, fallback and the prompt lint.

use beatloop::catalog::{
    default_prompt_for, missing_prompt_markers, prompts_for, settings_for, validate_prompt, Genre,
    GenreCatalog, CATALOG_VERSION,
};
use pretty_assertions::assert_eq;
use test_case::test_case;

#[test_case("City Pop", 82, 0.3, 50, 0.8, 5.0)]
#[test_case("Lo-Fi", 75, 0.3, 50, 0.8, 5.0)]
#[test_case("Future Bass", 150, 0.4, 60, 0.9, 4.0)]
#[test_case("House", 128, 0.35, 55, 0.85, 4.5)]
#[test_case("Trap", 140, 0.45, 65, 0.9, 4.0)]
#[test_case("Ambient", 70, 0.25, 45, 0.75, 5.5)]
#[test_case("DnB", 174, 0.4, 60, 0.85, 4.5)]
#[test_case("Trance", 138, 0.35, 55, 0.85, 4.5)]
fn test_genre_templates(name: &str, bpm: u32, temperature: f32, top_k: u32, top_p: f32, cfg: f32) {
    let s = settings_for(name);
    assert_eq!(s.bpm, bpm);
    assert_eq!(s.duration_secs, 30);
    assert_eq!(s.temperature, temperature);
    assert_eq!(s.top_k, top_k);
    assert_eq!(s.top_p, top_p);
    assert_eq!(s.cfg_coef, cfg);
}

#[test]
fn test_every_genre_has_valid_settings_and_prompt() {
    for genre in Genre::ALL {
        let settings = settings_for(genre.display_name());
        settings.validate().unwrap();
        let prompt = default_prompt_for(genre.display_name());
        assert!(!prompt.is_empty());
        assert!(validate_prompt(&prompt), "{genre}");
    }
}

#[test]
fn test_unknown_names() {
    assert_eq!(settings_for("Future Funk"), settings_for("City Pop"));
    assert_eq!(default_prompt_for("Future Funk"), "");
}

#[test]
fn test_slug_lookup_matches_display_lookup() {
    assert_eq!(settings_for("future_bass"), settings_for("Future Bass"));
    assert_eq!(default_prompt_for("lofi"), default_prompt_for("Lo-Fi"));
}

#[test]
fn test_prompt_lint_reports_missing_markers() {
    let prompt = prompts_for(Genre::Trance)[0].replace("outro 8 bars", "outro");
    assert!(!validate_prompt(&prompt));
    assert_eq!(missing_prompt_markers(&prompt), vec!["outro 8 bars"]);
}

#[test]
fn test_catalog_serializes_with_version() {
    let json = serde_json::to_value(GenreCatalog::global()).unwrap();
    assert_eq!(json["version"], CATALOG_VERSION);
}
