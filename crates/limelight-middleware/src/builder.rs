//! On-demand asset building.
//!
//! The builder turns a classified request into an HTTP response: it checks
//! the target is a readable regular file, invokes the compiler with the
//! resolution engine installed as its resolve hook, and converts the result
//! into response bytes with content-type and cache headers. Compile failures
//! become typed errors; a missing file is a decline, not an error.

use crate::dispatch::{strip_map_suffix, HandlerType};
use crate::error::{MiddlewareError, Result};
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use limelight_config::Settings;
use limelight_core::{
    CompileOptions, Compiler, EngineOptions, ImportMap, ResolutionEngine, SourceMapMode,
};
use path_clean::PathClean;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Response header identifying which handler served the request.
pub const MIDDLEWARE_HEADER: &str = "X-Limelight-Middleware";

/// Response header pointing at the request's sourcemap.
pub const SOURCE_MAP_HEADER: &str = "SourceMap";

/// Builds compiled-asset responses for one configured pipeline.
///
/// The builder itself is stateless across requests; every request gets a
/// fresh engine and compile invocation.
pub struct AssetBuilder {
    settings: Arc<Settings>,
    compiler: Arc<dyn Compiler>,
    import_map: Option<ImportMap>,
}

impl AssetBuilder {
    pub fn new(
        settings: Arc<Settings>,
        compiler: Arc<dyn Compiler>,
        import_map: Option<ImportMap>,
    ) -> Self {
        Self {
            settings,
            compiler,
            import_map,
        }
    }

    /// Attempt to serve the request. `Ok(None)` declines (file missing or
    /// unreadable), passing the request to downstream routing.
    pub async fn attempt(&self, path: &str, handler: HandlerType) -> Result<Option<Response>> {
        let started = Instant::now();

        let response = match handler {
            HandlerType::Esbuild => self.build_file(path).await?,
            HandlerType::UrlProxy => Some(self.build_url(path).await?),
            HandlerType::None => None,
        };

        if let Some(name) = handler.middleware_name() {
            if response.is_some() {
                tracing::info!(
                    path,
                    handler = name,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "built asset"
                );
            }
        }

        Ok(response)
    }

    /// Compile a local source file beneath the working directory.
    async fn build_file(&self, request_path: &str) -> Result<Option<Response>> {
        let is_map = request_path.ends_with(".map");
        let source_path = strip_map_suffix(request_path);

        let Some(relative) = clean_request_path(source_path)? else {
            return Ok(None);
        };

        if !readable_regular_file(&self.settings.root.join(&relative)) {
            return Ok(None);
        }

        let sourcemap = if is_map {
            SourceMapMode::External
        } else {
            SourceMapMode::Linked
        };

        let output = self.compile(request_path, &relative, sourcemap).await?;

        let body = if is_map {
            output.source_map.unwrap_or_default()
        } else {
            output.code
        };

        Ok(Some(self.respond(request_path, HandlerType::Esbuild, body)))
    }

    /// Compile a percent-encoded remote URL through the proxy handler.
    async fn build_url(&self, request_path: &str) -> Result<Response> {
        let is_map = request_path.ends_with(".map");
        let source_path = strip_map_suffix(request_path);

        let url = urlencoding::decode(source_path.trim_start_matches('/'))
            .map_err(|_| MiddlewareError::InvalidPath(request_path.to_string()))?
            .into_owned();

        let sourcemap = if is_map {
            SourceMapMode::External
        } else {
            SourceMapMode::None
        };

        let output = self.compile(request_path, Path::new(&url), sourcemap).await?;

        let body = if is_map {
            output.source_map.unwrap_or_default()
        } else {
            output.code
        };

        Ok(self.respond(request_path, HandlerType::UrlProxy, body))
    }

    /// One compile invocation with a fresh resolution engine bound as the
    /// resolve hook. Non-empty diagnostics become a typed compile error.
    async fn compile(
        &self,
        request_path: &str,
        entry: &Path,
        sourcemap: SourceMapMode,
    ) -> Result<limelight_core::CompileOutput> {
        let options = CompileOptions {
            root: self.settings.root.clone(),
            runtime_dir: self.settings.runtime_dir.clone(),
            import_map: self.import_map.clone(),
            sourcemap,
            ..Default::default()
        };

        let engine = ResolutionEngine::new(
            EngineOptions {
                root: self.settings.root.clone(),
                runtime_dir: self.settings.runtime_dir.clone(),
                import_map: self.import_map.clone(),
            },
            Arc::clone(&self.compiler),
        );

        let output = self.compiler.compile(entry, &options, &engine).await;

        if output.failed() {
            let detail = output
                .errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n");

            return Err(MiddlewareError::Compile {
                file: request_path.to_string(),
                detail,
            });
        }

        Ok(output)
    }

    /// Assemble the response: content-type from the request extension,
    /// sourcemap pointer, handler header, and advisory cache headers when
    /// the cache policy is fully configured.
    fn respond(&self, request_path: &str, handler: HandlerType, body: Vec<u8>) -> Response {
        let mut builder = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type(request_path))
            .header(SOURCE_MAP_HEADER, format!("{request_path}.map"));

        if let Some(name) = handler.middleware_name() {
            builder = builder.header(MIDDLEWARE_HEADER, name);
        }

        if self.settings.cache_enabled() {
            if let Some(max_age) = self.settings.cache_max_age {
                builder = builder.header(
                    header::CACHE_CONTROL,
                    format!("public, max-age={max_age}"),
                );
            }
        }

        builder.body(Body::from(body)).unwrap()
    }
}

/// Content type from the request path's extension. Everything in scope that
/// isn't a stylesheet (sourcemaps included) is JavaScript.
fn content_type(path: &str) -> &'static str {
    match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some("css") => "text/css",
        _ => "application/javascript",
    }
}

/// Percent-decode and normalize a request path to a root-relative file path.
/// Traversal escapes decline rather than error.
fn clean_request_path(path: &str) -> Result<Option<PathBuf>> {
    let decoded = urlencoding::decode(path)
        .map_err(|_| MiddlewareError::InvalidPath(path.to_string()))?;

    let trimmed = decoded.trim_end_matches('/').trim_start_matches('/');
    if trimmed.is_empty() {
        return Ok(None);
    }

    let cleaned = Path::new(trimmed).clean();
    if cleaned.is_absolute()
        || cleaned
            .components()
            .any(|component| matches!(component, Component::ParentDir))
    {
        return Ok(None);
    }

    Ok(Some(cleaned))
}

/// The target must stat as a regular, readable file; symlinks, devices and
/// directories all decline.
fn readable_regular_file(path: &Path) -> bool {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_file() => std::fs::File::open(path).is_ok(),
        _ => false,
    }
}
