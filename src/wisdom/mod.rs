//! The daily teaching: its data model, same-day cache and loading

pub mod cache;
pub mod error;
pub mod loader;
pub mod reflection;
pub mod script;

use serde::{Deserialize, Serialize};

pub use cache::{today, WisdomCache};
pub use error::WisdomError;
pub use loader::{ContentLoader, LoadingState};
pub use reflection::handle_reflect;
pub use script::{share_text, speech_script};

/// A single Buddhist concept with its explanation and practice.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WisdomRecord {
    /// The concept in the English alphabet, e.g. "Metta".
    pub term: String,
    /// Original script or standard romanization.
    pub original_term: String,
    /// Origin language, e.g. "Pali" or "Sanskrit".
    pub language: String,
    pub translation: String,
    pub definition: String,
    pub wisdom: String,
    pub application: String,
    pub reflection_prompt: String,
    /// A short "I am" statement.
    pub affirmation: String,
}

/// The single persisted record: today's teaching and the day it was fetched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CachedWisdom {
    pub date: String,
    pub data: WisdomRecord,
}
