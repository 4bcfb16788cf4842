//! dharma-daily library core functionality

pub mod app;
pub mod audio;
pub mod config;
pub mod gemini;
pub mod speech;
pub mod ui;
pub mod wisdom;

#[cfg(test)]
mod test_support;

/// Initialize the application directories
pub fn init_app_dirs() -> std::io::Result<()> {
    let default_path = config::Settings::default_path();
    if let Some(config_dir) = default_path.parent() {
        if !config_dir.exists() {
            std::fs::create_dir_all(config_dir)?;
        }
    }
    Ok(())
}
