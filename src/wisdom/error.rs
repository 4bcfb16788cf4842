use crate::gemini::GeminiError;
use std::error::Error;
use std::io;

/// Error types for loading and caching the daily teaching
#[derive(Debug)]
pub enum WisdomError {
    IoError(io::Error),
    ParseError(String),
    GenerationError(GeminiError),
}

impl From<io::Error> for WisdomError {
    fn from(err: io::Error) -> Self {
        WisdomError::IoError(err)
    }
}

impl From<serde_json::Error> for WisdomError {
    fn from(err: serde_json::Error) -> Self {
        WisdomError::ParseError(err.to_string())
    }
}

impl From<GeminiError> for WisdomError {
    fn from(err: GeminiError) -> Self {
        WisdomError::GenerationError(err)
    }
}

impl std::fmt::Display for WisdomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WisdomError::IoError(e) => write!(f, "I/O error: {}", e),
            WisdomError::ParseError(s) => write!(f, "Parse error: {}", s),
            WisdomError::GenerationError(e) => write!(f, "Generation error: {}", e),
        }
    }
}

impl Error for WisdomError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WisdomError::IoError(e) => Some(e),
            WisdomError::GenerationError(e) => Some(e),
            WisdomError::ParseError(_) => None,
        }
    }
}
