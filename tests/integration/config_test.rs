//! Integration tests for configuration management
//!
//! These tests verify that the configuration system works correctly
//! across module boundaries.

use dharma_daily::config::Settings;
use dharma_daily::gemini::GenerativeContentService;
use std::error::Error;
use tempfile::tempdir;

#[cfg(test)]
mod config_integration_tests {
    use super::*;
    use crate::test_utils::{serve_responses, text_response};

    /// Test complete configuration workflow
    #[test]
    fn test_config_lifecycle() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let config_path = dir.path().join("config.json");

        let mut settings = Settings::default();
        settings.api_key = Some("integration-test-api-key".to_string());
        settings.audio_device = "hw:1,0".to_string();
        settings.cache_path = Some(dir.path().join("wisdom.json").to_string_lossy().to_string());

        settings.validate()?;
        settings.save(&config_path)?;

        let loaded = Settings::load(&config_path)?;
        assert_eq!(loaded.api_key.as_deref(), Some("integration-test-api-key"));
        assert_eq!(loaded.audio_device, "hw:1,0");
        assert_eq!(loaded.cache_file(), dir.path().join("wisdom.json"));

        let mut updated = loaded;
        updated.voice_name = "Puck".to_string();
        updated.save(&config_path)?;

        let reloaded = Settings::load(&config_path)?;
        assert_eq!(reloaded.voice_name, "Puck");
        assert_eq!(reloaded.speech_model, "gemini-2.5-flash-preview-tts");

        Ok(())
    }

    /// Settings feed the client that talks to the configured endpoint.
    #[tokio::test]
    async fn test_settings_drive_client() -> Result<(), Box<dyn Error>> {
        let (base_url, server) = serve_responses(vec![(200, text_response("Breathe."))]).await?;
        let settings = Settings {
            api_key: Some("from-config".to_string()),
            api_base_url: base_url,
            text_model: "custom-text".to_string(),
            ..Settings::default()
        };
        settings.validate()?;

        let client = settings.gemini_client()?;
        let echo = client.generate_reflective_echo("Anicca", "Everything changes").await?;
        assert_eq!(echo, "Breathe.");

        let requests = server.await?;
        assert_eq!(requests[0].path, "/v1beta/models/custom-text:generateContent");
        assert_eq!(requests[0].api_key.as_deref(), Some("from-config"));
        Ok(())
    }
}
