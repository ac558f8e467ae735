//! # Settings store
//!
//! Generation parameters the user can edit: the base system prompt, custom
//! instructions, sampling temperature, token limit and a handful of toggles.
//!
//! [`SettingsStore`] persists them as one JSON blob under
//! [`SETTINGS_KEY`](crate::storage::SETTINGS_KEY). Loading never fails: a
//! missing, unparsable, or out-of-range blob is logged and replaced by
//! [`Settings::default`].
//!
//! ```rust
//! use chat_relay::settings::{Settings, SettingsStore};
//! use chat_relay::storage::MemoryStorage;
//!
//! let mut store = SettingsStore::new(MemoryStorage::new());
//! assert_eq!(store.load(), Settings::default());
//!
//! let mut settings = store.load();
//! settings.temperature = 1.2;
//! store.save(&settings).unwrap();
//! assert_eq!(store.load().temperature, 1.2);
//! ```

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::storage::{SETTINGS_KEY, Storage, StorageError};

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Be concise, friendly, and informative.";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 4000;

/// Accepted sampling temperatures.
pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.0..=2.0;

/// Accepted values when editing the token limit.
pub const MAX_TOKENS_RANGE: RangeInclusive<u32> = 100..=16000;

/// A named system prompt the user can switch to in one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptPreset {
    pub name: &'static str,
    pub prompt: &'static str,
}

pub const PRESETS: &[PromptPreset] = &[
    PromptPreset {
        name: "Creative Writer",
        prompt: "You are a creative writing assistant. Help users craft compelling stories, poems, and creative content. Be imaginative and inspiring.",
    },
    PromptPreset {
        name: "Code Expert",
        prompt: "You are an expert programmer. Help users write, debug, and optimize code. Explain concepts clearly and provide working examples.",
    },
    PromptPreset {
        name: "Document Helper",
        prompt: "You are a document assistant. Help users write, edit, and improve documents. Focus on clarity, grammar, and effective communication.",
    },
    PromptPreset {
        name: "Quick Assistant",
        prompt: "You are a fast, efficient assistant. Provide brief, direct answers. Skip unnecessary explanations unless asked for more detail.",
    },
];

/// Look up a preset by name, ignoring ASCII case.
pub fn find_preset(name: &str) -> Option<&'static PromptPreset> {
    PRESETS
        .iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(name.trim()))
}

/// User-editable generation parameters.
///
/// Field names serialize in camelCase to stay compatible with the stored blob
/// and the proxy's request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub system_prompt: String,
    pub custom_instructions: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub enable_code_execution: bool,
    pub enable_file_editing: bool,
    pub memory_enabled: bool,
    pub use_snake_case: bool,
    pub no_comments: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            custom_instructions: String::new(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            enable_code_execution: true,
            enable_file_editing: true,
            memory_enabled: true,
            use_snake_case: true,
            no_comments: true,
        }
    }
}

/// Why an edited settings value was refused.
#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("temperature {0} is outside 0.0..=2.0")]
    Temperature(f64),

    #[error("max tokens {0} is outside 100..=16000")]
    MaxTokens(u32),

    #[error("unknown preset {0:?}")]
    UnknownPreset(String),
}

impl Settings {
    /// Check the ranges the settings editor allows.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !TEMPERATURE_RANGE.contains(&self.temperature) {
            return Err(SettingsError::Temperature(self.temperature));
        }
        if !MAX_TOKENS_RANGE.contains(&self.max_tokens) {
            return Err(SettingsError::MaxTokens(self.max_tokens));
        }
        Ok(())
    }

    /// Replace the system prompt with the named preset's. Nothing else changes.
    pub fn apply_preset(&mut self, name: &str) -> Result<(), SettingsError> {
        let preset =
            find_preset(name).ok_or_else(|| SettingsError::UnknownPreset(name.to_string()))?;
        self.system_prompt = preset.prompt.to_string();
        Ok(())
    }

    /// Parse a stored blob. `None` means the blob cannot be trusted.
    fn from_stored(raw: &str) -> Option<Self> {
        let settings: Settings = match serde_json::from_str(raw) {
            Ok(settings) => settings,
            Err(err) => {
                warn!("Discarding stored settings: {}", err);
                return None;
            }
        };

        if !TEMPERATURE_RANGE.contains(&settings.temperature) {
            warn!(
                "Discarding stored settings: temperature {} out of range",
                settings.temperature
            );
            return None;
        }

        Some(settings)
    }
}

/// Loads and saves [`Settings`] through a [`Storage`] port.
pub struct SettingsStore<S: Storage> {
    storage: S,
}

impl<S: Storage> SettingsStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Read the persisted settings, falling back to defaults on any problem.
    pub fn load(&mut self) -> Settings {
        match self.storage.get(SETTINGS_KEY) {
            Ok(Some(raw)) => Settings::from_stored(&raw).unwrap_or_default(),
            Ok(None) => Settings::default(),
            Err(err) => {
                warn!("Failed to load settings: {}", err);
                Settings::default()
            }
        }
    }

    /// Persist the full settings object, overwriting what was stored.
    pub fn save(&mut self, settings: &Settings) -> Result<(), StorageError> {
        let raw = serde_json::to_string(settings)?;
        self.storage.set(SETTINGS_KEY, &raw)
    }

    /// Restore and persist the defaults.
    pub fn reset(&mut self) -> Result<Settings, StorageError> {
        let settings = Settings::default();
        self.save(&settings)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store_with(raw: &str) -> SettingsStore<MemoryStorage> {
        let mut storage = MemoryStorage::new();
        storage.set(SETTINGS_KEY, raw).unwrap();
        SettingsStore::new(storage)
    }

    #[test]
    fn test_defaults_when_missing() {
        let mut store = SettingsStore::new(MemoryStorage::new());
        let settings = store.load();
        assert_eq!(settings.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(settings.temperature, 0.7);
        assert_eq!(settings.max_tokens, 4000);
        assert!(settings.enable_code_execution);
        assert!(settings.enable_file_editing);
        assert!(settings.memory_enabled);
        assert!(settings.use_snake_case);
        assert!(settings.no_comments);
        assert!(settings.custom_instructions.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = SettingsStore::new(MemoryStorage::new());
        let settings = Settings {
            system_prompt: "Be terse.".into(),
            custom_instructions: "I write Rust.".into(),
            temperature: 0.2,
            max_tokens: 800,
            enable_code_execution: false,
            enable_file_editing: true,
            memory_enabled: false,
            use_snake_case: false,
            no_comments: true,
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn test_malformed_blob_falls_back_to_defaults() {
        assert_eq!(store_with("{not json").load(), Settings::default());
    }

    #[test]
    fn test_wrong_types_fall_back_to_defaults() {
        let mut store = store_with(r#"{"temperature":"hot","maxTokens":100}"#);
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_out_of_range_temperature_falls_back_to_defaults() {
        let mut store = store_with(r#"{"temperature":5.0}"#);
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_partial_blob_fills_missing_fields() {
        let mut store = store_with(r#"{"systemPrompt":"Hi","noComments":false}"#);
        let settings = store.load();
        assert_eq!(settings.system_prompt, "Hi");
        assert!(!settings.no_comments);
        assert_eq!(settings.max_tokens, DEFAULT_MAX_TOKENS);
        assert!(settings.use_snake_case);
    }

    #[test]
    fn test_reset_overwrites_saved_settings() {
        let mut store = store_with(r#"{"systemPrompt":"custom"}"#);
        let settings = store.reset().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_validate_ranges() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.temperature = 2.5;
        assert_eq!(settings.validate(), Err(SettingsError::Temperature(2.5)));

        settings.temperature = 1.0;
        settings.max_tokens = 50;
        assert_eq!(settings.validate(), Err(SettingsError::MaxTokens(50)));
    }

    #[test]
    fn test_preset_prompts() {
        let expected = [
            (
                "Creative Writer",
                "You are a creative writing assistant. Help users craft compelling stories, poems, and creative content. Be imaginative and inspiring.",
            ),
            (
                "Code Expert",
                "You are an expert programmer. Help users write, debug, and optimize code. Explain concepts clearly and provide working examples.",
            ),
            (
                "Document Helper",
                "You are a document assistant. Help users write, edit, and improve documents. Focus on clarity, grammar, and effective communication.",
            ),
            (
                "Quick Assistant",
                "You are a fast, efficient assistant. Provide brief, direct answers. Skip unnecessary explanations unless asked for more detail.",
            ),
        ];

        assert_eq!(PRESETS.len(), expected.len());
        for (name, prompt) in expected {
            let mut settings = Settings::default();
            settings.apply_preset(name).unwrap();
            assert_eq!(settings.system_prompt, prompt);
        }
    }

    #[test]
    fn test_apply_preset_only_touches_system_prompt() {
        let mut settings = Settings {
            custom_instructions: "I write Rust.".into(),
            temperature: 1.4,
            max_tokens: 900,
            enable_code_execution: false,
            memory_enabled: false,
            no_comments: false,
            ..Settings::default()
        };
        let before = settings.clone();

        settings.apply_preset("code expert").unwrap();

        assert_eq!(settings.system_prompt, PRESETS[1].prompt);
        assert_eq!(
            Settings {
                system_prompt: before.system_prompt.clone(),
                ..settings
            },
            before
        );
    }

    #[test]
    fn test_unknown_preset_is_rejected() {
        let mut settings = Settings::default();
        assert_eq!(
            settings.apply_preset("Pirate"),
            Err(SettingsError::UnknownPreset("Pirate".into()))
        );
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_preset_persists_through_store() {
        let mut store = store_with(r#"{"temperature":1.3}"#);
        let mut settings = store.load();
        settings.apply_preset("Quick Assistant").unwrap();
        store.save(&settings).unwrap();

        let reloaded = store.load();
        assert_eq!(reloaded.system_prompt, PRESETS[3].prompt);
        assert_eq!(reloaded.temperature, 1.3);
    }
}
