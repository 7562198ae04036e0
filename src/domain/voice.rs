//! Speech-synthesis voice descriptors.

use serde::{Deserialize, Serialize};

/// A voice offered by the platform speech engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Engine-specific voice name (e.g. "Microsoft Sabina - Spanish (Mexico)")
    pub name: String,

    /// BCP 47 language tag (e.g. "es-MX")
    pub lang: String,

    /// Localized name, when the engine reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
            local_name: None,
        }
    }

    /// Whether this voice's tag equals `locale` (case and separator insensitive)
    pub fn matches_locale(&self, locale: &str) -> bool {
        normalize_tag(&self.lang) == normalize_tag(locale)
    }

    /// Whether this voice's primary language subtag equals `language`
    pub fn matches_language(&self, language: &str) -> bool {
        let tag = normalize_tag(&self.lang);
        let primary = tag.split('-').next().unwrap_or_default();
        primary == normalize_tag(language)
    }
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().replace('_', "-").to_ascii_lowercase()
}
