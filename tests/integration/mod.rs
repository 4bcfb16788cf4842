//! Integration tests module
//!
//! This module organizes all integration tests for the dharma-daily application.

pub mod audio_test;
pub mod config_test;
pub mod gemini_client_test;
pub mod session_test;
