//! Display and language settings kept next to the session in local storage.
//! Plain strings, no versioning; unknown values read back as defaults.

use crate::errors::Result;
use crate::storage::local_storage::SharedStorage;

const THEME_KEY: &str = "theme";
const FONT_SIZE_KEY: &str = "fontSize";
const FONT_STYLE_KEY: &str = "fontStyle";
const CHAT_HISTORY_KEY: &str = "chatHistory";
const LANGUAGE_KEY: &str = "preferredLanguage";

const DEFAULT_FONT_SIZE: &str = "medium";
const DEFAULT_FONT_STYLE: &str = "default";
const DEFAULT_LANGUAGE: &str = "English";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Preferences {
    storage: SharedStorage,
}

impl Preferences {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    pub fn theme(&self) -> Theme {
        match self.storage.lock().get(THEME_KEY).as_deref() {
            Some("Dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.storage.lock().set(THEME_KEY, theme.as_str())
    }

    pub fn font_size(&self) -> String {
        self.read_or(FONT_SIZE_KEY, DEFAULT_FONT_SIZE)
    }

    pub fn set_font_size(&self, size: &str) -> Result<()> {
        self.storage.lock().set(FONT_SIZE_KEY, size)
    }

    pub fn font_style(&self) -> String {
        self.read_or(FONT_STYLE_KEY, DEFAULT_FONT_STYLE)
    }

    pub fn set_font_style(&self, style: &str) -> Result<()> {
        self.storage.lock().set(FONT_STYLE_KEY, style)
    }

    /// Whether chat sessions are kept in history (on unless explicitly switched off).
    pub fn chat_history_enabled(&self) -> bool {
        self.storage.lock().get(CHAT_HISTORY_KEY).as_deref() != Some("off")
    }

    pub fn set_chat_history_enabled(&self, enabled: bool) -> Result<()> {
        self.storage.lock().set(CHAT_HISTORY_KEY, if enabled { "on" } else { "off" })
    }

    pub fn preferred_language(&self) -> String {
        self.read_or(LANGUAGE_KEY, DEFAULT_LANGUAGE)
    }

    pub fn set_preferred_language(&self, language: &str) -> Result<()> {
        self.storage.lock().set(LANGUAGE_KEY, language)
    }

    fn read_or(&self, key: &str, default: &str) -> String {
        self.storage
            .lock()
            .get(key)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let dir = TempDir::new().unwrap();
        let prefs = Preferences::new(SharedStorage::open(dir.path()).unwrap());
        assert_eq!(prefs.theme(), Theme::Light);
        assert_eq!(prefs.font_size(), "medium");
        assert_eq!(prefs.font_style(), "default");
        assert!(prefs.chat_history_enabled());
        assert_eq!(prefs.preferred_language(), "English");
    }

    #[test]
    fn test_settings_persist() {
        let dir = TempDir::new().unwrap();
        {
            let prefs = Preferences::new(SharedStorage::open(dir.path()).unwrap());
            prefs.set_theme(Theme::Dark).unwrap();
            prefs.set_chat_history_enabled(false).unwrap();
            prefs.set_preferred_language("Hindi").unwrap();
        }
        let prefs = Preferences::new(SharedStorage::open(dir.path()).unwrap());
        assert_eq!(prefs.theme(), Theme::Dark);
        assert!(!prefs.chat_history_enabled());
        assert_eq!(prefs.preferred_language(), "Hindi");
    }

    #[test]
    fn test_unknown_theme_reads_as_light() {
        let dir = TempDir::new().unwrap();
        let storage = SharedStorage::open(dir.path()).unwrap();
        storage.lock().set(THEME_KEY, "Sepia").unwrap();
        assert_eq!(Preferences::new(storage).theme(), Theme::Light);
    }
}
