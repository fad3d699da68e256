//! Settings validation.

use crate::error::{ConfigError, Result};
use crate::settings::Settings;

impl Settings {
    /// Reject settings no handler can serve correctly.
    pub fn validate(&self) -> Result<()> {
        if self.include_paths.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "include_paths".into(),
                value: "[]".into(),
                hint: "At least one include path is required, e.g. [\"lib\"]".into(),
            });
        }

        for path in &self.include_paths {
            if path.starts_with('/') || path.contains("..") || path.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "include_paths".into(),
                    value: path.clone(),
                    hint: "Include paths are top-level directory names relative to root".into(),
                });
            }
        }

        if self.file_extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "file_extensions".into(),
                value: "[]".into(),
                hint: "At least one file extension is required, e.g. [\"js\"]".into(),
            });
        }

        if self.cache_query_string.is_some() && self.cache_max_age == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "cache_max_age".into(),
                value: "0".into(),
                hint: "A cache query string needs a positive max-age".into(),
            });
        }

        Ok(())
    }
}
