//! Layered settings loading.

use crate::error::{ConfigError, Result};
use crate::settings::Settings;
use figment::{
    providers::{Env, Format as _, Json, Serialized},
    Figment,
};
use std::path::Path;

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "limelight.config.json";

impl Settings {
    /// Load settings from layered sources.
    /// Priority: environment variables > config file > defaults.
    ///
    /// An explicit `config_path` must exist; the default config file is
    /// optional.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            figment = figment.merge(Json::file(path));
        } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
            figment = figment.merge(Json::file(DEFAULT_CONFIG_FILE));
        }

        // LIMELIGHT_ROOT, LIMELIGHT_RUNTIME_DIR, LIMELIGHT_CACHE_MAX_AGE, ...
        figment = figment.merge(Env::prefixed("LIMELIGHT_"));

        let settings: Settings = figment.extract()?;
        settings.validate()?;

        tracing::debug!(root = %settings.root.display(), "loaded settings");

        Ok(settings)
    }
}
