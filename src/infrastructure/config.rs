//! Configuration file management.
//!
//! Handles loading and saving TOML configuration files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AppConfig, AppError, Result};

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# Maintenance Receipt Generator Configuration
# Auto-generated - edit as needed

[organization]
name = "RAHIM ARCADE"
address = ["SC-24, Block-H, North Nazimabad", "Karachi, Pakistan"]
contact = "0333-2232354"
# Name drawn on the signature line
signatory = "Usman"

[currency]
prefix = "Rs."
# "western" (1,234,567) or "south_asian" (12,34,567)
grouping = "western"

[export]
# Capture scale for PDF export and shared images
pdf_scale = 3
share_scale = 2
# Directory for exported PDFs (optional, defaults to the working directory)
# output_dir = "/home/me/receipts"

[share]
# Directory acting as the share target (optional). Without it, sharing
# prints a messaging link and the image has to be attached manually.
# outbox_dir = "/home/me/outbox"
fallback_url = "https://wa.me/?text="
"#;

/// Get the path to the default configuration file.
#[must_use]
pub fn config_file_path() -> PathBuf {
    AppConfig::default_data_dir().join("config.toml")
}

/// Load configuration from `path`, or from the default location.
/// A missing default file yields the built-in defaults.
///
/// # Errors
/// Returns error if the file exists but cannot be read or parsed, or if an
/// explicitly given path does not exist.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = path {
        return load_config_from_file(path);
    }

    let config_path = config_file_path();
    if config_path.exists() {
        load_config_from_file(&config_path)
    } else {
        tracing::debug!("No config file, using defaults");
        Ok(AppConfig::default())
    }
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if file cannot be read or parsed.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file: {}", path.display()), e))?;

    let config = toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("Failed to parse config file: {e}"),
    })?;
    tracing::debug!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Save configuration to file.
///
/// # Errors
/// Returns error if file cannot be written.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| AppError::Config {
        message: format!("Failed to serialize config: {e}"),
    })?;

    fs::write(path, content)
        .map_err(|e| AppError::io(format!("Failed to write config file: {}", path.display()), e))?;

    tracing::info!(path = %path.display(), "Configuration saved");

    Ok(())
}

/// Create the commented default configuration file if it doesn't exist.
/// Returns whether a file was created.
///
/// # Errors
/// Returns error if file cannot be created.
pub fn ensure_config_exists(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    fs::write(path, DEFAULT_CONFIG)
        .map_err(|e| AppError::io("Failed to create default config", e))?;

    tracing::info!(path = %path.display(), "Created default configuration");
    Ok(true)
}
