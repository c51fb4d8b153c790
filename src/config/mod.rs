//! Settings for promptbox
//!
//! Supports configuration via:
//! 1. Settings file (~/.config/promptbox/config.toml)
//! 2. Environment variables (OPENAI_API_KEY, OPENAI_MODEL, OPENAI_BASE_URL)
//! 3. CLI arguments (override file/env settings)

use crate::history::PromptHistory;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Unknown setting: {0}")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// User preferences and prompt history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Chat-completion settings
    pub chat: ChatSettings,

    /// Voice turn settings
    pub voice: VoiceSettings,

    /// Terminal appearance
    pub ui: UiSettings,

    /// Previously submitted prompts
    pub history: PromptHistory,

    /// Values taken from the environment; never written back to the file
    #[serde(skip)]
    pub overrides: EnvOverrides,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// Chat-completion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Model name
    pub model: String,

    /// API key (can also use OPENAI_API_KEY env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    pub base_url: String,

    /// Temperature for typed prompts
    pub temperature: f32,

    /// Sent as a leading system message when not blank
    pub system_prompt: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 1.0,
            system_prompt: String::new(),
        }
    }
}

/// Voice turn settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    /// The `voice` command refuses to run while this is false
    pub enabled: bool,
    pub transcription_model: String,
    /// Temperature for answers to transcribed speech
    pub temperature: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            transcription_model: "whisper-1".to_string(),
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub dark_mode: bool,
}

impl Settings {
    /// Get default settings file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("promptbox")
            .join("config.toml")
    }

    /// Load settings from default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path())
    }

    /// Load settings from a specific path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default().with_env_overrides());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;

        Ok(settings.with_env_overrides())
    }

    /// Apply environment variable overrides
    pub fn with_env_overrides(mut self) -> Self {
        self.overrides = EnvOverrides {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            model: std::env::var("OPENAI_MODEL").ok(),
            base_url: std::env::var("OPENAI_BASE_URL").ok(),
        };
        self
    }

    /// Save settings to default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::default_path())
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key().is_none() {
            return Err(ConfigError::MissingRequired(
                "chat.api_key (or OPENAI_API_KEY)".to_string(),
            ));
        }

        if self.base_url().trim().is_empty() {
            return Err(ConfigError::MissingRequired("chat.base_url".to_string()));
        }

        if self.model().trim().is_empty() {
            return Err(ConfigError::MissingRequired("chat.model".to_string()));
        }

        for (key, temperature) in [
            ("chat.temperature", self.chat.temperature),
            ("voice.temperature", self.voice.temperature),
        ] {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: temperature.to_string(),
                });
            }
        }

        Ok(())
    }

    /// API key from the environment or the file, ignoring blank values
    pub fn api_key(&self) -> Option<String> {
        self.overrides
            .api_key
            .clone()
            .or_else(|| self.chat.api_key.clone())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn model(&self) -> &str {
        self.overrides.model.as_deref().unwrap_or(&self.chat.model)
    }

    pub fn base_url(&self) -> &str {
        self.overrides
            .base_url
            .as_deref()
            .unwrap_or(&self.chat.base_url)
    }

    pub fn chat_endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url().trim_end_matches('/'))
    }

    /// Set a value by dotted `section.field` key
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "chat.model" => self.chat.model = value.to_string(),
            "chat.api_key" => self.chat.api_key = Some(value.to_string()),
            "chat.base_url" => self.chat.base_url = value.to_string(),
            "chat.temperature" => self.chat.temperature = value.parse().map_err(|_| invalid())?,
            "chat.system_prompt" => self.chat.system_prompt = value.to_string(),
            "voice.enabled" => self.voice.enabled = value.parse().map_err(|_| invalid())?,
            "voice.transcription_model" => self.voice.transcription_model = value.to_string(),
            "voice.temperature" => self.voice.temperature = value.parse().map_err(|_| invalid())?,
            "ui.dark_mode" => self.ui.dark_mode = value.parse().map_err(|_| invalid())?,
            "history.max_entries" => {
                self.history.max_entries = value.parse().map_err(|_| invalid())?
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }

        Ok(())
    }

    /// Copy with the API key masked, for display
    pub fn masked(&self) -> Self {
        let mut display = self.clone();
        if display.chat.api_key.is_some() {
            display.chat.api_key = Some("***".to_string());
        }
        if display.overrides.api_key.is_some() {
            display.overrides.api_key = Some("***".to_string());
        }
        display
    }
}

/// Builder for creating Settings programmatically
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
        }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.settings.chat.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.settings.chat.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.settings.chat.base_url = url.into();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.settings.chat.temperature = temperature;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.settings.chat.system_prompt = prompt.into();
        self
    }

    pub fn voice_enabled(mut self, enabled: bool) -> Self {
        self.settings.voice.enabled = enabled;
        self
    }

    pub fn dark_mode(mut self, dark_mode: bool) -> Self {
        self.settings.ui.dark_mode = dark_mode;
        self
    }

    pub fn build(self) -> Settings {
        self.settings
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
