//! Asset pipeline settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Settings recognized by the middleware and resolution engine.
///
/// All fields have defaults so an empty config is a working config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Working directory root; request paths resolve beneath it.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Top-level directories eligible for on-demand compilation.
    #[serde(default = "default_include_paths")]
    pub include_paths: BTreeSet<String>,

    /// File extensions served by the compiled-asset handler. Sourcemap
    /// variants (`<ext>.map`) are accepted implicitly.
    #[serde(default = "default_file_extensions")]
    pub file_extensions: BTreeSet<String>,

    /// Cache-busting query-string key. `None` disables client caching.
    #[serde(default)]
    pub cache_query_string: Option<String>,

    /// Max-age in seconds for the `Cache-Control` header. Only emitted when
    /// `cache_query_string` is also set.
    #[serde(default = "default_cache_max_age")]
    pub cache_max_age: Option<u64>,

    /// Directory holding the runtime-internal modules.
    #[serde(default = "default_runtime_dir")]
    pub runtime_dir: PathBuf,

    /// Whether rendering collects side-loaded assets.
    #[serde(default = "default_side_load")]
    pub side_load: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: default_root(),
            include_paths: default_include_paths(),
            file_extensions: default_file_extensions(),
            cache_query_string: None,
            cache_max_age: default_cache_max_age(),
            runtime_dir: default_runtime_dir(),
            side_load: default_side_load(),
        }
    }
}

impl Settings {
    /// Whether responses should carry a `Cache-Control` header.
    pub fn cache_enabled(&self) -> bool {
        self.cache_query_string.is_some() && self.cache_max_age.is_some()
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_include_paths() -> BTreeSet<String> {
    ["app", "config", "lib", "node_modules"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_file_extensions() -> BTreeSet<String> {
    ["js", "mjs", "jsx", "css"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_cache_max_age() -> Option<u64> {
    // 30 days
    Some(2_592_000)
}

fn default_runtime_dir() -> PathBuf {
    PathBuf::from("limelight-runtime")
}

fn default_side_load() -> bool {
    true
}
