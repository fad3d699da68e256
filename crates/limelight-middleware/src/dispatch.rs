//! Request classification.
//!
//! Maps an inbound path + method to the handler that should serve it. Only
//! GET/HEAD are eligible; everything else falls through to the host's own
//! routing. Sourcemap requests (`foo.js.map`) classify the same as their
//! source (`foo.js`); the handler strips the suffix before locating the
//! file.

use axum::http::Method;
use limelight_config::Settings;
use std::path::Path;
use std::sync::Arc;

/// The handler chosen for one request. No state is shared between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerType {
    /// Percent-encoded remote URL, compiled through the URL proxy.
    UrlProxy,
    /// Local source file, compiled on demand.
    Esbuild,
    /// Not ours; fall through to the host framework.
    None,
}

impl HandlerType {
    /// Value for the `X-Limelight-Middleware` response header.
    pub fn middleware_name(self) -> Option<&'static str> {
        match self {
            HandlerType::UrlProxy => Some("url"),
            HandlerType::Esbuild => Some("esbuild"),
            HandlerType::None => None,
        }
    }
}

/// Classifies requests against the configured include paths and extensions.
#[derive(Debug, Clone)]
pub struct RequestDispatcher {
    settings: Arc<Settings>,
}

impl RequestDispatcher {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Choose a handler for the request. Rules, in order: encoded remote URL
    /// → UrlProxy; include-path match → Esbuild; otherwise None.
    pub fn classify(&self, path: &str, method: &Method) -> HandlerType {
        if method != Method::GET && method != Method::HEAD {
            return HandlerType::None;
        }

        if self.matches_encoded_url(path) {
            return HandlerType::UrlProxy;
        }

        if self.matches_include_path(path) {
            return HandlerType::Esbuild;
        }

        HandlerType::None
    }

    /// `/https%3A%2F%2F...` (or http) with a recognized asset extension.
    fn matches_encoded_url(&self, path: &str) -> bool {
        let encoded = path.starts_with("/https%3A%2F%2F") || path.starts_with("/http%3A%2F%2F");

        encoded && self.has_recognized_extension(path)
    }

    /// Path beneath one of the configured include roots, with a recognized
    /// extension. Roots may be nested (`app/views`).
    fn matches_include_path(&self, path: &str) -> bool {
        if !self.has_recognized_extension(path) {
            return false;
        }

        let trimmed = path.trim_start_matches('/');

        self.settings.include_paths.iter().any(|root| {
            trimmed
                .strip_prefix(root.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .is_some_and(|rest| !rest.is_empty())
        })
    }

    /// Extension check with `.map` handled transparently.
    fn has_recognized_extension(&self, path: &str) -> bool {
        let source = strip_map_suffix(path);

        Path::new(source)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.settings.file_extensions.contains(ext))
    }
}

/// Strip a trailing `.map`, turning a sourcemap request into its source path.
pub(crate) fn strip_map_suffix(path: &str) -> &str {
    path.strip_suffix(".map").unwrap_or(path)
}
