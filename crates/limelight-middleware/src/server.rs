//! Middleware wiring and an axum router for hosts that want one.
//!
//! The [`Middleware`] owns the dispatcher and builder and exposes a single
//! `attempt` entry point; `Ok(None)` means "not ours", and hosts pass the
//! request on to their own routing. [`router`] wraps that in an axum
//! fallback plus the runtime-file route serving external runtime URLs.

use crate::builder::AssetBuilder;
use crate::dispatch::{HandlerType, RequestDispatcher};
use crate::error::Result;
use axum::{
    body::Body,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::Response,
    Router,
};
use limelight_config::Settings;
use limelight_core::{Compiler, ImportMap, RUNTIME_URL_PREFIX};
use std::sync::Arc;
use tower_http::services::ServeDir;

/// The asset pipeline middleware for one configured application.
pub struct Middleware {
    settings: Arc<Settings>,
    dispatcher: RequestDispatcher,
    builder: AssetBuilder,
}

impl Middleware {
    pub fn new(
        settings: Settings,
        compiler: Arc<dyn Compiler>,
        import_map: Option<ImportMap>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            dispatcher: RequestDispatcher::new(Arc::clone(&settings)),
            builder: AssetBuilder::new(Arc::clone(&settings), compiler, import_map),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Classify and attempt one request.
    ///
    /// `Ok(None)` declines: the path isn't ours, the method isn't GET/HEAD,
    /// or the target file is missing/unreadable. Compile failures surface as
    /// errors for the host to turn into a 500-class response.
    pub async fn attempt(&self, method: &Method, path: &str) -> Result<Option<Response>> {
        let handler = self.dispatcher.classify(path, method);

        if handler == HandlerType::None {
            return Ok(None);
        }

        self.builder.attempt(path, handler).await
    }
}

/// Shared middleware handle for axum state.
pub type SharedMiddleware = Arc<Middleware>;

/// Build an axum router serving the asset pipeline.
///
/// Mounts the runtime-file route at `/limelight-runtime` and attempts every
/// other request through the middleware, answering 404 on decline.
pub fn router(middleware: SharedMiddleware) -> Router {
    let runtime_dir = middleware.settings().runtime_dir.clone();

    Router::new()
        .nest_service(RUNTIME_URL_PREFIX, ServeDir::new(runtime_dir))
        .fallback(handle_request)
        .with_state(middleware)
}

/// Fallback handler: attempt the request, 404 on decline, 500 on failure.
pub async fn handle_request(
    State(middleware): State<SharedMiddleware>,
    method: Method,
    uri: Uri,
) -> Response {
    match middleware.attempt(&method, uri.path()).await {
        Ok(Some(response)) => response,
        Ok(None) => not_found(uri.path()),
        Err(error) => {
            tracing::error!(%error, path = uri.path(), "asset build failed");
            internal_error(error.to_string())
        }
    }
}

/// Return 404 Not Found response.
fn not_found(path: &str) -> Response {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(format!("Asset not found: {}", path)))
        .unwrap()
}

/// Return 500 Internal Server Error response.
fn internal_error(message: String) -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(message))
        .unwrap()
}
