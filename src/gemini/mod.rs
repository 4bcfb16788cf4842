//! Gemini client module for generating teachings, reflections and speech

pub mod api;
pub mod models;
pub mod prompts;

pub use api::*;
