use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Spoken languages the voice endpoint accepts. The set is closed; the wire
/// code is what goes into the `language` form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ig")]
    Igbo,
    #[serde(rename = "yo")]
    Yoruba,
    #[serde(rename = "ha")]
    Hausa,
}

pub const ALL_LANGUAGES: [Language; 4] = [
    Language::English,
    Language::Igbo,
    Language::Yoruba,
    Language::Hausa,
];

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Igbo => "ig",
            Language::Yoruba => "yo",
            Language::Hausa => "ha",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::English
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown language code: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "en" => Ok(Language::English),
            "ig" => Ok(Language::Igbo),
            "yo" => Ok(Language::Yoruba),
            "ha" => Ok(Language::Hausa),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}
