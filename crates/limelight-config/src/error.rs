//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file doesn't exist at the expected location
    #[error("Config file not found: {}\n\nHint: Create a limelight.config.json file or pass an explicit path", .0.display())]
    NotFound(PathBuf),

    /// Config file failed to load or merge
    #[error("Failed to load configuration: {0}\n\nHint: Check limelight.config.json syntax and field types")]
    Load(#[from] figment::Error),

    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        field: String,
        value: String,
        hint: String,
    },

    /// I/O error while reading config
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using `ConfigError` as the default error type.
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
