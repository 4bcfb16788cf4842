//! Shared fixtures for unit tests

use crate::gemini::{GeminiError, GenerativeContentService};
use crate::wisdom::WisdomRecord;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Semaphore;

/// Base64 of the samples -32768, 0, 32767.
pub const THREE_FRAME_PAYLOAD: &str = "AIAAAP9/";
/// Base64 of two silent samples.
pub const TWO_FRAME_PAYLOAD: &str = "AAAAAA==";

pub fn sample_record(term: &str) -> WisdomRecord {
    WisdomRecord {
        term: term.to_string(),
        original_term: format!("{} (original)", term),
        language: "Pali".to_string(),
        translation: "Loving-kindness".to_string(),
        definition: "Benevolent goodwill toward all beings".to_string(),
        wisdom: "Love that does not cling".to_string(),
        application: "Wish a stranger well".to_string(),
        reflection_prompt: "Whom do you find hard to love?".to_string(),
        affirmation: "I am a source of loving-kindness".to_string(),
    }
}

/// Scripted stand-in for the generative service that counts its calls.
pub struct MockContentService {
    pub wisdom_calls: AtomicUsize,
    pub echo_calls: AtomicUsize,
    pub speech_calls: AtomicUsize,
    pub fail_wisdom: AtomicBool,
    pub fail_echo: AtomicBool,
    pub fail_speech: AtomicBool,
    pub echo_reply: Mutex<String>,
    pub last_exclude: Mutex<Vec<String>>,
    pub last_script: Mutex<Option<String>>,
    terms: Mutex<Vec<String>>,
    speech_payloads: Mutex<Vec<(String, String)>>,
    speech_gate: Option<Semaphore>,
}

impl MockContentService {
    pub fn new() -> Self {
        Self {
            wisdom_calls: AtomicUsize::new(0),
            echo_calls: AtomicUsize::new(0),
            speech_calls: AtomicUsize::new(0),
            fail_wisdom: AtomicBool::new(false),
            fail_echo: AtomicBool::new(false),
            fail_speech: AtomicBool::new(false),
            echo_reply: Mutex::new("Your kindness is already blooming.".to_string()),
            last_exclude: Mutex::new(Vec::new()),
            last_script: Mutex::new(None),
            terms: Mutex::new(vec!["Metta".to_string()]),
            speech_payloads: Mutex::new(Vec::new()),
            speech_gate: None,
        }
    }

    /// Speech requests block until `release_speech` grants them.
    pub fn gated() -> Self {
        Self {
            speech_gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    pub fn release_speech(&self, requests: usize) {
        if let Some(gate) = &self.speech_gate {
            gate.add_permits(requests);
        }
    }

    /// Terms handed out by successive `generate_wisdom` calls; the last repeats.
    pub fn with_terms(self, terms: &[&str]) -> Self {
        *self.terms.lock().unwrap() = terms.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Scripts containing `needle` are answered with `payload`.
    pub fn with_speech_payload(self, needle: &str, payload: &str) -> Self {
        self.speech_payloads
            .lock()
            .unwrap()
            .push((needle.to_string(), payload.to_string()));
        self
    }

    pub fn speech_count(&self) -> usize {
        self.speech_calls.load(Ordering::SeqCst)
    }

    pub fn wisdom_count(&self) -> usize {
        self.wisdom_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeContentService for MockContentService {
    async fn generate_wisdom(&self, exclude_terms: &[String]) -> Result<WisdomRecord, GeminiError> {
        let call = self.wisdom_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_exclude.lock().unwrap() = exclude_terms.to_vec();
        if self.fail_wisdom.load(Ordering::SeqCst) {
            return Err(GeminiError::EmptyResponse("No content generated".to_string()));
        }
        let terms = self.terms.lock().unwrap();
        let term = terms.get(call).or_else(|| terms.last()).cloned().unwrap_or_default();
        Ok(sample_record(&term))
    }

    async fn generate_reflective_echo(&self, _concept: &str, _reflection: &str) -> Result<String, GeminiError> {
        self.echo_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_echo.load(Ordering::SeqCst) {
            return Err(GeminiError::Api {
                status: 500,
                message: "internal".to_string(),
            });
        }
        Ok(self.echo_reply.lock().unwrap().clone())
    }

    async fn generate_speech(&self, script: &str) -> Result<String, GeminiError> {
        self.speech_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_script.lock().unwrap() = Some(script.to_string());
        if let Some(gate) = &self.speech_gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if self.fail_speech.load(Ordering::SeqCst) {
            return Err(GeminiError::EmptyResponse("No audio content generated".to_string()));
        }
        let payload = self
            .speech_payloads
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| script.contains(needle.as_str()))
            .map(|(_, payload)| payload.clone())
            .unwrap_or_else(|| THREE_FRAME_PAYLOAD.to_string());
        Ok(payload)
    }
}
