//! Limelight configuration.
//!
//! Settings for the asset pipeline middleware: include paths, file
//! extensions, cache policy, and the runtime directory. Loaded from layered
//! sources (defaults, `limelight.config.json`, `LIMELIGHT_`-prefixed
//! environment variables) and validated before use.

mod error;
mod loading;
mod settings;
mod validation;

pub use error::{ConfigError, Result};
pub use loading::DEFAULT_CONFIG_FILE;
pub use settings::Settings;
