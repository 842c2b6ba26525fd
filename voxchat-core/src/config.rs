use serde::{Deserialize, Serialize};

use crate::language::Language;

pub const DEFAULT_BASE_URL: &str = "https://remostart-farmlingua-voice-system.hf.space";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub base_url: String,
    pub language: Language,
    pub microphone_device: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            language: Language::default(),
            microphone_device: None,
        }
    }
}
