use std::error::Error;

use crate::gemini::GeminiError;

/// Error types for the audio acquisition and playback pipeline.
///
/// Every variant carries owned text so the error is `Clone`: one in-flight
/// acquisition result is handed to every caller waiting on it.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// The transport-encoded payload was not valid base64.
    DecodeError(String),
    /// The speech synthesis collaborator failed or returned nothing.
    SynthesisError(String),
    AlsaError(String),
    InvalidState(String),
    InitializationError(String),
    ResamplingError(String),
    TaskJoinError(String),
    /// Audio was requested before any content was known.
    NoContent,
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::DecodeError(e) => write!(f, "Decode error: {}", e),
            AudioError::SynthesisError(e) => write!(f, "Synthesis error: {}", e),
            AudioError::AlsaError(e) => write!(f, "ALSA error: {}", e),
            AudioError::InvalidState(s) => write!(f, "Invalid state: {}", s),
            AudioError::InitializationError(e) => write!(f, "Initialization error: {}", e),
            AudioError::ResamplingError(e) => write!(f, "Resampling error: {}", e),
            AudioError::TaskJoinError(e) => write!(f, "Async task join error: {}", e),
            AudioError::NoContent => write!(f, "No content available for narration"),
        }
    }
}

impl Error for AudioError {}

// --- From Implementations for AudioError ---

impl From<alsa::Error> for AudioError {
    fn from(e: alsa::Error) -> Self {
        AudioError::AlsaError(e.to_string())
    }
}

impl From<base64::DecodeError> for AudioError {
    fn from(e: base64::DecodeError) -> Self {
        AudioError::DecodeError(e.to_string())
    }
}

impl From<GeminiError> for AudioError {
    fn from(e: GeminiError) -> Self {
        AudioError::SynthesisError(e.to_string())
    }
}

impl From<tokio::task::JoinError> for AudioError {
    fn from(e: tokio::task::JoinError) -> Self {
        AudioError::TaskJoinError(e.to_string())
    }
}
