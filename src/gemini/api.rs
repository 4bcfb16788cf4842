//! Gemini REST client implementing the generative content contract

use crate::gemini::models::{ApiErrorBody, GenerateContentRequest, GenerateContentResponse, GenerationConfig, SpeechConfig};
use crate::gemini::prompts;
use crate::wisdom::WisdomRecord;
use async_trait::async_trait;
use reqwest::{Client, Error as ReqwestError, Response};
use std::error::Error;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, instrument, trace, warn};
use url::Url;

const LOG_TARGET: &str = "dharma_daily::gemini::api";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_VOICE: &str = "Kore";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Contract for the external service generating teachings, echoes and speech.
#[async_trait]
pub trait GenerativeContentService: Send + Sync {
    /// Generates a new teaching, avoiding the given terms.
    async fn generate_wisdom(&self, exclude_terms: &[String]) -> Result<WisdomRecord, GeminiError>;

    /// Generates a one-sentence reply (under 20 words) to a user's reflection.
    async fn generate_reflective_echo(&self, concept: &str, reflection: &str) -> Result<String, GeminiError>;

    /// Synthesizes speech for `script`, returning the base64 audio payload.
    async fn generate_speech(&self, script: &str) -> Result<String, GeminiError>;
}

/// Error types for Gemini API operations
#[derive(Debug)]
pub enum GeminiError {
    Network(ReqwestError),
    Api { status: u16, message: String },
    EmptyResponse(String),
    InvalidResponse(String),
    InvalidUrl(String),
    MissingApiKey,
}

impl fmt::Display for GeminiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeminiError::Network(e) => write!(f, "Network error: {}", e),
            GeminiError::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            GeminiError::EmptyResponse(what) => write!(f, "Empty response: {}", what),
            GeminiError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            GeminiError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            GeminiError::MissingApiKey => write!(f, "No API key configured"),
        }
    }
}

impl Error for GeminiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GeminiError::Network(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ReqwestError> for GeminiError {
    fn from(err: ReqwestError) -> Self {
        GeminiError::Network(err)
    }
}

impl From<url::ParseError> for GeminiError {
    fn from(err: url::ParseError) -> Self {
        GeminiError::InvalidUrl(err.to_string())
    }
}

/// Client for the Gemini `generateContent` endpoint
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: Url,
    api_key: String,
    text_model: String,
    speech_model: String,
    voice_name: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url.as_str())
            .field("text_model", &self.text_model)
            .field("speech_model", &self.speech_model)
            .field("voice_name", &self.voice_name)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a new client against the public Gemini endpoint.
    pub fn new(api_key: &str) -> Result<Self, GeminiError> {
        if api_key.trim().is_empty() {
            return Err(GeminiError::MissingApiKey);
        }

        let client = match Client::builder().timeout(REQUEST_TIMEOUT).build() {
            Ok(client) => client,
            Err(e) => {
                warn!(target: LOG_TARGET, "Error creating HTTP client with timeout: {:?}. Falling back to default.", e);
                Client::new()
            }
        };

        Ok(GeminiClient {
            client,
            base_url: Url::parse(DEFAULT_BASE_URL)?,
            api_key: api_key.trim().to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            speech_model: DEFAULT_SPEECH_MODEL.to_string(),
            voice_name: DEFAULT_VOICE.to_string(),
        })
    }

    /// Point the client at a different API host (e.g. a proxy).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, GeminiError> {
        self.base_url = Url::parse(base_url.trim_end_matches('/'))?;
        Ok(self)
    }

    pub fn with_text_model(mut self, model: &str) -> Self {
        self.text_model = model.to_string();
        self
    }

    pub fn with_speech_model(mut self, model: &str) -> Self {
        self.speech_model = model.to_string();
        self
    }

    pub fn with_voice(mut self, voice_name: &str) -> Self {
        self.voice_name = voice_name.to_string();
        self
    }

    pub fn text_model(&self) -> &str {
        &self.text_model
    }

    pub fn speech_model(&self) -> &str {
        &self.speech_model
    }

    pub fn voice_name(&self) -> &str {
        &self.voice_name
    }

    /// Full `generateContent` URL for a model.
    pub fn endpoint_url(&self, model: &str) -> Result<Url, GeminiError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}/v1beta/models/{}:generateContent", base, model))?)
    }

    /// Sends a request and deserializes the response.
    #[instrument(skip(self, request), fields(model = %model))]
    async fn generate_content(&self, model: &str, request: &GenerateContentRequest) -> Result<GenerateContentResponse, GeminiError> {
        let url = self.endpoint_url(model)?;
        debug!(target: LOG_TARGET, "Sending generateContent request to: {}", url);

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Handles response status checking and JSON deserialization.
    async fn handle_response(response: Response) -> Result<GenerateContentResponse, GeminiError> {
        let status = response.status();
        trace!(target: LOG_TARGET, "Response status: {}", status);
        let response_text = response.text().await?;

        if status.is_success() {
            trace!(target: LOG_TARGET, "Response text length: {} bytes", response_text.len());
            serde_json::from_str::<GenerateContentResponse>(&response_text).map_err(|e| {
                error!(target: LOG_TARGET, "JSON parsing error: {}", e);
                GeminiError::InvalidResponse(format!("Failed to parse JSON response: {}", e))
            })
        } else {
            error!(target: LOG_TARGET, "Request failed. Status: {}, Body: {}", status, response_text);
            Err(api_error(status.as_u16(), &response_text))
        }
    }
}

/// Builds an API error, preferring the message from a structured error body.
pub(crate) fn api_error(status: u16, body: &str) -> GeminiError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                "no error body".to_string()
            } else {
                body.trim().to_string()
            }
        });
    GeminiError::Api { status, message }
}

/// Parses the structured teaching out of a text response.
pub(crate) fn parse_wisdom(response: &GenerateContentResponse) -> Result<WisdomRecord, GeminiError> {
    let text = response
        .text()
        .ok_or_else(|| GeminiError::EmptyResponse("No content generated".to_string()))?;
    serde_json::from_str::<WisdomRecord>(text.trim())
        .map_err(|e| GeminiError::InvalidResponse(format!("Malformed teaching JSON: {}", e)))
}

/// Extracts the base64 audio payload out of a speech response.
pub(crate) fn extract_audio(response: &GenerateContentResponse) -> Result<String, GeminiError> {
    response
        .inline_data()
        .map(|inline| {
            trace!(target: LOG_TARGET, "Inline audio mime type: {:?}", inline.mime_type);
            inline.data.clone()
        })
        .ok_or_else(|| GeminiError::EmptyResponse("No audio content generated".to_string()))
}

#[async_trait]
impl GenerativeContentService for GeminiClient {
    #[instrument(skip(self))]
    async fn generate_wisdom(&self, exclude_terms: &[String]) -> Result<WisdomRecord, GeminiError> {
        info!(target: LOG_TARGET, "Generating a new teaching.");
        let request = GenerateContentRequest::user_text(
            prompts::wisdom_prompt(exclude_terms),
            GenerationConfig {
                temperature: Some(prompts::WISDOM_TEMPERATURE),
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(prompts::wisdom_schema()),
                ..Default::default()
            },
        );
        let response = self.generate_content(&self.text_model, &request).await?;
        let record = parse_wisdom(&response).map_err(|e| {
            error!(target: LOG_TARGET, "Error generating wisdom: {}", e);
            e
        })?;
        info!(target: LOG_TARGET, term = %record.term, "Teaching generated.");
        Ok(record)
    }

    #[instrument(skip(self, reflection))]
    async fn generate_reflective_echo(&self, concept: &str, reflection: &str) -> Result<String, GeminiError> {
        let request = GenerateContentRequest::user_text(
            prompts::reflective_echo_prompt(concept, reflection),
            GenerationConfig {
                temperature: Some(prompts::ECHO_TEMPERATURE),
                ..Default::default()
            },
        );
        let response = self.generate_content(&self.text_model, &request).await?;
        Ok(response.text().unwrap_or_default())
    }

    #[instrument(skip(self, script), fields(script_len = script.len()))]
    async fn generate_speech(&self, script: &str) -> Result<String, GeminiError> {
        info!(target: LOG_TARGET, "Requesting speech synthesis with voice {}.", self.voice_name);
        let request = GenerateContentRequest::user_text(
            prompts::speech_prompt(script),
            GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig::prebuilt(&self.voice_name)),
                ..Default::default()
            },
        );
        let response = self.generate_content(&self.speech_model, &request).await?;
        extract_audio(&response).map_err(|e| {
            error!(target: LOG_TARGET, "Error generating audio: {}", e);
            e
        })
    }
}
