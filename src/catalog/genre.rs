//! The closed set of supported genres

use serde::{Deserialize, Serialize};

/// Supported genres
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Genre {
    CityPop,
    LoFi,
    FutureBass,
    House,
    Trap,
    Ambient,
    DnB,
    Trance,
}

impl Genre {
    /// All genres in catalog order
    pub const ALL: [Genre; 8] = [
        Genre::CityPop,
        Genre::LoFi,
        Genre::FutureBass,
        Genre::House,
        Genre::Trap,
        Genre::Ambient,
        Genre::DnB,
        Genre::Trance,
    ];

    /// Name shown to users ("Lo-Fi")
    pub fn display_name(&self) -> &'static str {
        match self {
            Genre::CityPop => "City Pop",
            Genre::LoFi => "Lo-Fi",
            Genre::FutureBass => "Future Bass",
            Genre::House => "House",
            Genre::Trap => "Trap",
            Genre::Ambient => "Ambient",
            Genre::DnB => "DnB",
            Genre::Trance => "Trance",
        }
    }

    /// Identifier used in settings and file names ("lofi")
    pub fn slug(&self) -> &'static str {
        match self {
            Genre::CityPop => "city_pop",
            Genre::LoFi => "lofi",
            Genre::FutureBass => "future_bass",
            Genre::House => "house",
            Genre::Trap => "trap",
            Genre::Ambient => "ambient",
            Genre::DnB => "dnb",
            Genre::Trance => "trance",
        }
    }

    /// Parse a display name or slug, case-insensitively
    ///
    /// Separators (space, `-`, `_`) are ignored, so "Lo-Fi", "lofi",
    /// "future bass" and "FUTURE_BASS" all resolve.
    pub fn parse(name: &str) -> Option<Genre> {
        let key: String = name
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();

        Genre::ALL.into_iter().find(|g| g.slug().replace('_', "") == key)
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Genre {
    type Err = crate::error::BeatloopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::parse(s).ok_or_else(|| crate::error::BeatloopError::InvalidSettings {
            param: "genre".to_string(),
            value: s.to_string(),
            expected: Genre::ALL
                .iter()
                .map(|g| g.display_name())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}
