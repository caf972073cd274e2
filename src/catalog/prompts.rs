//! Example prompts and the structural prompt lint
//!
//! Every example prompt asks the model for an 8-bar intro and outro so that
//! generated tracks can be beat-matched. `validate_prompt` checks a free-form
//! prompt for the same markers. The check is advisory only.

use super::genre::Genre;

/// Phrases a well-structured prompt contains (compared lowercase)
pub const REQUIRED_PROMPT_MARKERS: [&str; 3] = [
    "intro 8 bars",
    "outro 8 bars",
    "essential structure requirements",
];

const CITY_POP: &[&str] = &[
    "japanese city pop with clear song structure and consistent rhythm, \
     warm electric piano rhodes, funky bass guitar, clean electric guitars, \
     vintage drum machines maintaining steady beat throughout, \
     essential structure requirements: \
     intro 8 bars with distinctive atmospheric opening keeping minimal drums for beat recognition, \
     clear transition into main sections with multiples of 8 bars, \
     verses and choruses maintaining steady groove and clear progression, \
     distinct outro 8 bars with recognizable ending phrase keeping minimal drums",
    "modern city pop with precise structural arrangement and steady rhythm, \
     bright brass section, groovy bass lines, clean chorus guitar, \
     continuous drum pattern for beat tracking, \
     essential structure requirements: \
     intro 8 bars with characteristic opening theme and minimal but clear beat, \
     structured sections in multiples of 8 bars with clear progression, \
     verses and choruses with distinct melodic themes, \
     recognizable outro 8 bars with clear ending maintaining minimal rhythm, \
     additional elements: \
     vintage synthesizers, analog warmth, summer night vibes, \
     crystal clear production, sophisticated chord progressions, \
     all transitions must be well-defined and beat-matched, \
     ensure consistent tempo throughout for mixing purposes",
    "jazz influenced city pop with defined arrangement and steady groove, \
     smooth saxophone, complex chord progressions, fusion guitar solos, \
     consistent rhythm section maintaining clear beat, \
     essential structure requirements: \
     intro 8 bars with jazz fusion style keeping minimal but present drums, \
     main sections structured in multiples of 8 bars, \
     verses and choruses with jazz harmony development, \
     distinctive outro 8 bars with jazz ending maintaining rhythm, \
     additional elements: \
     warm analog synthesizers, elegant strings, \
     polished production style with clear mix, \
     ensure all section changes are clearly marked, \
     maintain steady tempo and groove for beat recognition",
];

const LO_FI: &[&str] = &["lo-fi hip hop with structured arrangement, \
     warm vinyl crackles, mellow piano, smooth jazz samples, \
     steady boom bap drums, deep bass, \
     essential structure requirements: \
     intro 8 bars with characteristic lo-fi atmosphere and minimal drums, \
     main sections in 8 bar multiples with relaxed progression, \
     clear verse and chorus segments, \
     outro 8 bars with gentle fade maintaining beat"];

const FUTURE_BASS: &[&str] = &["future bass with modern production and clear arrangement, \
     heavy sidechained synths, powerful supersaws, crisp drums, \
     deep sub bass, bright leads, \
     essential structure requirements: \
     intro 8 bars with building energy and minimal percussion, \
     main sections in 8 bar multiples with dynamic progression, \
     intense drops with clear rhythmic structure, \
     outro 8 bars with distinctive ending maintaining energy"];

const HOUSE: &[&str] = &["house music with classic four-on-the-floor rhythm, \
     punchy kicks, crisp hi-hats, driving percussion, \
     uplifting chord progressions, groovy basslines, \
     essential structure requirements: \
     intro 8 bars with building drums and minimal elements, \
     main sections in 8 bar multiples with steady progression, \
     clear breakdown and build-up segments, \
     outro 8 bars with rhythmic fade maintaining groove"];

const TRAP: &[&str] = &["trap music with heavy 808s and clear structure, \
     rolling hi-hats, punchy snares, deep sub bass, \
     atmospheric pads, dark melodies, \
     essential structure requirements: \
     intro 8 bars with minimal drums and atmosphere, \
     main sections in 8 bar multiples with strong 808 patterns, \
     clear hook sections with full percussion, \
     outro 8 bars with distinctive trap ending"];

const AMBIENT: &[&str] = &["ambient music with clear structural progression, \
     ethereal pads, subtle textures, gentle percussion, \
     atmospheric soundscapes, minimal beats, \
     essential structure requirements: \
     intro 8 bars with subtle rhythm and atmospheric elements, \
     main sections in 8 bar multiples with gentle evolution, \
     clear textural development, \
     outro 8 bars with soft fade maintaining minimal beat"];

const DNB: &[&str] = &["drum and bass with precise breakbeat patterns, \
     heavy reese bass, sharp drums, energetic rhythm, \
     atmospheric pads, rolling percussion, \
     essential structure requirements: \
     intro 8 bars with building breaks and minimal elements, \
     main sections in 8 bar multiples with full dnb rhythm, \
     clear drop sections with intense breaks, \
     outro 8 bars with distinctive dnb ending"];

const TRANCE: &[&str] = &["trance music with euphoric progression, \
     driving bassline, uplifting leads, energetic arps, \
     powerful kicks, crisp percussion, \
     essential structure requirements: \
     intro 8 bars with building energy and minimal beats, \
     main sections in 8 bar multiples with clear progression, \
     emotional breakdown and build-up sections, \
     outro 8 bars with characteristic trance ending"];

/// Example prompts for a genre; the first one is the default
pub fn examples_for(genre: Genre) -> &'static [&'static str] {
    match genre {
        Genre::CityPop => CITY_POP,
        Genre::LoFi => LO_FI,
        Genre::FutureBass => FUTURE_BASS,
        Genre::House => HOUSE,
        Genre::Trap => TRAP,
        Genre::Ambient => AMBIENT,
        Genre::DnB => DNB,
        Genre::Trance => TRANCE,
    }
}

/// Markers absent from the prompt, in `REQUIRED_PROMPT_MARKERS` order
pub fn missing_prompt_markers(prompt: &str) -> Vec<&'static str> {
    let lower = prompt.to_lowercase();
    REQUIRED_PROMPT_MARKERS
        .into_iter()
        .filter(|marker| !lower.contains(marker))
        .collect()
}

/// True iff the prompt contains every structural marker, case-insensitively
pub fn validate_prompt(prompt: &str) -> bool {
    missing_prompt_markers(prompt).is_empty()
}
