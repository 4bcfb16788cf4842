//! Configuration loading and validation

pub mod settings;

pub use settings::{ConfigError, Settings};
