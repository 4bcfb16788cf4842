//! Integration tests for the Gemini client
//!
//! These tests run the client against a local HTTP server speaking the
//! `generateContent` wire format.

use dharma_daily::gemini::{GeminiClient, GeminiError, GenerativeContentService};
use dharma_daily::wisdom::handle_reflect;
use std::error::Error;

#[cfg(test)]
mod gemini_integration_tests {
    use super::*;
    use crate::test_utils::{audio_response, sample_record, serve_responses, text_response, THREE_FRAME_PAYLOAD};

    fn client_for(base_url: &str) -> GeminiClient {
        GeminiClient::new("test-key").unwrap().with_base_url(base_url).unwrap()
    }

    #[tokio::test]
    async fn test_generate_wisdom_request_and_parse() -> Result<(), Box<dyn Error>> {
        let record_json = serde_json::to_string(&sample_record("Anicca"))?;
        let (base_url, server) = serve_responses(vec![(200, text_response(&record_json))]).await?;

        let record = client_for(&base_url).generate_wisdom(&["Metta".to_string()]).await?;
        assert_eq!(record, sample_record("Anicca"));

        let requests = server.await?;
        let request = &requests[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/v1beta/models/gemini-3-flash-preview:generateContent");
        assert_eq!(request.api_key.as_deref(), Some("test-key"));

        let config = &request.body["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert!((config["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(config["responseSchema"]["type"], "OBJECT");
        let prompt = request.body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("Please avoid these previously generated terms: Metta."));
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_speech_request_and_payload() -> Result<(), Box<dyn Error>> {
        let (base_url, server) = serve_responses(vec![(200, audio_response(THREE_FRAME_PAYLOAD))]).await?;

        let payload = client_for(&base_url).generate_speech("The concept is Metta.").await?;
        assert_eq!(payload, THREE_FRAME_PAYLOAD);

        let requests = server.await?;
        let request = &requests[0];
        assert_eq!(request.path, "/v1beta/models/gemini-2.5-flash-preview-tts:generateContent");
        let config = &request.body["generationConfig"];
        assert_eq!(config["responseModalities"][0], "AUDIO");
        assert_eq!(config["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"], "Kore");
        let prompt = request.body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert_eq!(
            prompt,
            "Speak slowly and serenely like a calm, soothing meditation teacher: The concept is Metta."
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_speech_without_audio_is_empty_response() -> Result<(), Box<dyn Error>> {
        let (base_url, _server) = serve_responses(vec![(200, text_response("I cannot speak."))]).await?;

        let result = client_for(&base_url).generate_speech("Hello").await;
        assert!(matches!(result, Err(GeminiError::EmptyResponse(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_wisdom_is_invalid_response() -> Result<(), Box<dyn Error>> {
        let (base_url, _server) = serve_responses(vec![(200, text_response("{\"term\": 42}"))]).await?;

        let result = client_for(&base_url).generate_wisdom(&[]).await;
        assert!(matches!(result, Err(GeminiError::InvalidResponse(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_api_error_carries_status_and_message() -> Result<(), Box<dyn Error>> {
        let body = r#"{"error":{"code":503,"message":"The model is overloaded.","status":"UNAVAILABLE"}}"#;
        let (base_url, _server) = serve_responses(vec![(503, body.to_string())]).await?;

        match client_for(&base_url).generate_wisdom(&[]).await {
            Err(GeminiError::Api { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "The model is overloaded.");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_reflection_through_client() -> Result<(), Box<dyn Error>> {
        let (base_url, _server) = serve_responses(vec![
            (200, text_response("  Your patience is a gift.\n")),
            (500, "{}".to_string()),
        ])
        .await?;
        let client = client_for(&base_url);

        let echo = handle_reflect(&client, "Khanti", "I waited calmly today").await;
        assert_eq!(echo.as_deref(), Some("Your patience is a gift."));

        let echo = handle_reflect(&client, "Khanti", "Again").await;
        assert_eq!(echo.as_deref(), Some("Your path is unique and valid. May you find clarity."));
        Ok(())
    }
}
