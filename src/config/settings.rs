//! Application settings and configuration management

use crate::gemini::{GeminiClient, GeminiError, DEFAULT_BASE_URL, DEFAULT_SPEECH_MODEL, DEFAULT_TEXT_MODEL, DEFAULT_VOICE};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// Application settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Gemini API key
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL of the Gemini REST API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Model generating the teaching and reflection replies
    #[serde(default = "default_text_model")]
    pub text_model: String,
    /// Model synthesizing the narration
    #[serde(default = "default_speech_model")]
    pub speech_model: String,
    /// Prebuilt voice used for narration
    #[serde(default = "default_voice_name")]
    pub voice_name: String,
    /// ALSA device for playback, or `none` for silence
    #[serde(default = "default_audio_device")]
    pub audio_device: String,
    /// Overrides the location of the daily cache file
    #[serde(default)]
    pub cache_path: Option<String>,
}

fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_text_model() -> String {
    DEFAULT_TEXT_MODEL.to_string()
}

fn default_speech_model() -> String {
    DEFAULT_SPEECH_MODEL.to_string()
}

fn default_voice_name() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_audio_device() -> String {
    "default".to_string()
}

/// Error types for configuration operations
#[derive(Debug)]
pub enum ConfigError {
    IoError(io::Error),
    ParseError(String),
    ValidationError(String),
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<GeminiError> for ConfigError {
    fn from(err: GeminiError) -> Self {
        ConfigError::ValidationError(err.to_string())
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "I/O error: {}", e),
            ConfigError::ParseError(s) => write!(f, "Parse error: {}", s),
            ConfigError::ValidationError(s) => write!(f, "Validation error: {}", s),
        }
    }
}

impl Error for ConfigError {}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_key: None,
            api_base_url: default_api_base_url(),
            text_model: default_text_model(),
            speech_model: default_speech_model(),
            voice_name: default_voice_name(),
            audio_device: default_audio_device(),
            cache_path: None,
        }
    }
}

impl Settings {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(&self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("dharma-daily").join("config.json")
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.api_key {
            Some(key) if !key.trim().is_empty() => {}
            _ => {
                return Err(ConfigError::ValidationError(
                    "A Gemini API key must be provided (--api-key or GEMINI_API_KEY)".to_string(),
                ))
            }
        }

        Url::parse(&self.api_base_url)
            .map_err(|e| ConfigError::ValidationError(format!("Invalid API base URL '{}': {}", self.api_base_url, e)))?;

        for (name, value) in [
            ("Text model", &self.text_model),
            ("Speech model", &self.speech_model),
            ("Voice name", &self.voice_name),
            ("Audio device", &self.audio_device),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!("{} cannot be empty", name)));
            }
        }

        Ok(())
    }

    /// Builds a Gemini client from validated settings.
    pub fn gemini_client(&self) -> Result<GeminiClient, ConfigError> {
        let api_key = self.api_key.as_deref().unwrap_or_default();
        let client = GeminiClient::new(api_key)?
            .with_base_url(&self.api_base_url)?
            .with_text_model(&self.text_model)
            .with_speech_model(&self.speech_model)
            .with_voice(&self.voice_name);
        Ok(client)
    }

    /// Location of the daily cache file.
    pub fn cache_file(&self) -> PathBuf {
        match &self.cache_path {
            Some(path) => PathBuf::from(path),
            None => crate::wisdom::WisdomCache::default_path(),
        }
    }
}
