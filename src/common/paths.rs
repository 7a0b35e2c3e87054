//! Platform configuration paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/reqchain/`
//! - macOS: `~/Library/Application Support/reqchain/`
//! - Windows: `%APPDATA%\reqchain\`

use std::io;
use std::path::PathBuf;

/// Directory name used for the config location
const APP_NAME: &str = "reqchain";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Ensure a report output directory exists, creating parents as needed
pub fn ensure_result_dir(path: &std::path::Path) -> io::Result<PathBuf> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(path.to_path_buf())
}
