//! End-to-end middleware tests with a scripted stub compiler.
//!
//! The compiler behind the builder is an opaque collaborator, so these tests
//! script one: it feeds a declared import list through the installed resolve
//! hook and emits the rewritten imports as its "compiled" output, which lets
//! the tests observe the full classify → check → build → respond path.

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use limelight_config::Settings;
use limelight_core::{
    CompileOptions, CompileOutput, Compiler, DelegateRequest, DelegateResolution, Diagnostic,
    ImportKind, ResolveHook, SourceMapMode, Specifier,
};
use limelight_middleware::{
    handle_request, Middleware, MiddlewareError, MIDDLEWARE_HEADER, SOURCE_MAP_HEADER,
};
use path_clean::PathClean;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Compiler stub: resolves every declared import through the hook and emits
/// the rewritten specifiers, one per line.
struct StubCompiler {
    root: PathBuf,
    imports: Vec<(String, ImportKind)>,
}

impl StubCompiler {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            imports: Vec::new(),
        }
    }

    fn with_imports(root: &Path, imports: &[(&str, ImportKind)]) -> Self {
        Self {
            root: root.to_path_buf(),
            imports: imports
                .iter()
                .map(|(spec, kind)| (spec.to_string(), *kind))
                .collect(),
        }
    }
}

#[async_trait]
impl Compiler for StubCompiler {
    async fn compile(
        &self,
        entry: &Path,
        options: &CompileOptions,
        hook: &dyn ResolveHook,
    ) -> CompileOutput {
        if entry.to_string_lossy().contains("includes_error") {
            return CompileOutput {
                errors: vec![Diagnostic::new("Unexpected token")
                    .with_file(entry.to_string_lossy().into_owned())],
                ..Default::default()
            };
        }

        let importer = self.root.join(entry);
        let mut errors = Vec::new();
        let mut lines = vec![format!("// compiled {}", entry.display())];

        for (raw, kind) in &self.imports {
            let spec = Specifier::parse(raw, *kind, &importer.to_string_lossy());
            if let Some(result) = hook.on_resolve(&spec) {
                errors.extend(result.errors.clone());
                lines.push(format!(
                    "import \"{}{}\"",
                    result.path,
                    result.suffix.unwrap_or_default()
                ));
            }
        }

        CompileOutput {
            code: lines.join("\n").into_bytes(),
            source_map: matches!(options.sourcemap, SourceMapMode::External)
                .then(|| br#"{"version":3,"sources":[]}"#.to_vec()),
            errors,
        }
    }

    fn resolve_path(&self, request: &DelegateRequest) -> DelegateResolution {
        let path = if request.specifier.starts_with('/') {
            PathBuf::from(&request.specifier)
        } else if request.specifier.starts_with('.') {
            request.resolve_dir.join(&request.specifier).clean()
        } else {
            self.root
                .join("node_modules")
                .join(&request.specifier)
                .join("index.js")
        };

        DelegateResolution {
            path,
            ..Default::default()
        }
    }
}

fn settings_for(root: &Path) -> Settings {
    Settings {
        root: root.to_path_buf(),
        ..Settings::default()
    }
}

fn middleware_with(settings: Settings, compiler: StubCompiler) -> Middleware {
    Middleware::new(settings, Arc::new(compiler), None)
}

fn write_fixture(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "export default null").unwrap();
}

fn header<'a>(response: &'a axum::response::Response, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .map(|value| value.to_str().unwrap())
        .unwrap_or("")
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_unsupported_path_declines() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "db/some.js");
    let middleware = middleware_with(settings_for(temp.path()), StubCompiler::new(temp.path()));

    let response = middleware
        .attempt(&Method::GET, "/db/some.js")
        .await
        .unwrap();

    assert!(response.is_none());
}

#[tokio::test]
async fn test_include_paths_config_is_honored() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "db/some.js");

    let mut settings = settings_for(temp.path());
    settings.include_paths.insert("db".into());
    let middleware = middleware_with(settings, StubCompiler::new(temp.path()));

    let response = middleware
        .attempt(&Method::GET, "/db/some.js")
        .await
        .unwrap()
        .expect("configured include path should be served");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_js_request_is_compiled_and_identified() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "app/views/layouts/application.js");
    let middleware = middleware_with(settings_for(temp.path()), StubCompiler::new(temp.path()));

    let response = middleware
        .attempt(&Method::GET, "/app/views/layouts/application.js")
        .await
        .unwrap()
        .expect("readable file should be served");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "content-type"), "application/javascript");
    assert_eq!(header(&response, MIDDLEWARE_HEADER), "esbuild");
    assert_eq!(
        header(&response, SOURCE_MAP_HEADER),
        "/app/views/layouts/application.js.map"
    );

    let body = body_string(response).await;
    assert!(body.contains("compiled app/views/layouts/application.js"));
}

#[tokio::test]
async fn test_jsx_request_is_served_as_javascript() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "lib/component.jsx");
    let middleware = middleware_with(settings_for(temp.path()), StubCompiler::new(temp.path()));

    let response = middleware
        .attempt(&Method::GET, "/lib/component.jsx")
        .await
        .unwrap()
        .expect("jsx should be served");

    assert_eq!(header(&response, "content-type"), "application/javascript");
    assert_eq!(header(&response, MIDDLEWARE_HEADER), "esbuild");
}

#[tokio::test]
async fn test_css_request_is_served_as_stylesheet() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "lib/styles.css");
    let middleware = middleware_with(settings_for(temp.path()), StubCompiler::new(temp.path()));

    let response = middleware
        .attempt(&Method::GET, "/lib/styles.css")
        .await
        .unwrap()
        .expect("css should be served");

    assert_eq!(header(&response, "content-type"), "text/css");
    assert_eq!(header(&response, MIDDLEWARE_HEADER), "esbuild");
}

#[tokio::test]
async fn test_sourcemap_request_checks_the_source_file() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "lib/foo.js");
    let middleware = middleware_with(settings_for(temp.path()), StubCompiler::new(temp.path()));

    let response = middleware
        .attempt(&Method::GET, "/lib/foo.js.map")
        .await
        .unwrap()
        .expect("map for readable source should be served");

    assert_eq!(header(&response, "content-type"), "application/javascript");
    assert_eq!(header(&response, MIDDLEWARE_HEADER), "esbuild");

    let body = body_string(response).await;
    assert!(body.contains("\"version\":3"));
}

#[tokio::test]
async fn test_missing_file_declines() {
    let temp = TempDir::new().unwrap();
    let middleware = middleware_with(settings_for(temp.path()), StubCompiler::new(temp.path()));

    let response = middleware
        .attempt(&Method::GET, "/lib/not_here.js")
        .await
        .unwrap();

    assert!(response.is_none());
}

#[tokio::test]
async fn test_directory_declines() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("lib/dir.js")).unwrap();
    let middleware = middleware_with(settings_for(temp.path()), StubCompiler::new(temp.path()));

    let response = middleware
        .attempt(&Method::GET, "/lib/dir.js")
        .await
        .unwrap();

    assert!(response.is_none());
}

#[tokio::test]
async fn test_compile_error_is_typed() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "lib/includes_error.js");
    let middleware = middleware_with(settings_for(temp.path()), StubCompiler::new(temp.path()));

    let error = middleware
        .attempt(&Method::GET, "/lib/includes_error.js")
        .await
        .unwrap_err();

    match error {
        MiddlewareError::Compile { file, detail } => {
            assert_eq!(file, "/lib/includes_error.js");
            assert!(detail.contains("Unexpected token"));
        }
        other => panic!("expected compile error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_compile_error_surfaces_as_500_through_the_router_handler() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "lib/includes_error.js");
    let middleware = Arc::new(middleware_with(
        settings_for(temp.path()),
        StubCompiler::new(temp.path()),
    ));

    let response = handle_request(
        State(middleware),
        Method::GET,
        Uri::from_static("/lib/includes_error.js"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_string(response).await;
    assert!(body.contains("Failed to build '/lib/includes_error.js'"));
}

#[tokio::test]
async fn test_decline_surfaces_as_404_through_the_router_handler() {
    let temp = TempDir::new().unwrap();
    let middleware = Arc::new(middleware_with(
        settings_for(temp.path()),
        StubCompiler::new(temp.path()),
    ));

    let response = handle_request(
        State(middleware),
        Method::GET,
        Uri::from_static("/nope/missing.js"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cache_control_requires_both_cache_knobs() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "lib/query_cache.js");

    // Max-age alone: no cache header.
    let middleware = middleware_with(settings_for(temp.path()), StubCompiler::new(temp.path()));
    let response = middleware
        .attempt(&Method::GET, "/lib/query_cache.js")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(header(&response, "cache-control"), "");

    // Query string + max-age: advisory public caching.
    let mut settings = settings_for(temp.path());
    settings.cache_query_string = Some("v1".into());
    let middleware = middleware_with(settings, StubCompiler::new(temp.path()));
    let response = middleware
        .attempt(&Method::GET, "/lib/query_cache.js")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        header(&response, "cache-control"),
        "public, max-age=2592000"
    );
}

#[tokio::test]
async fn test_non_get_methods_decline() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "lib/foo.js");
    let middleware = middleware_with(settings_for(temp.path()), StubCompiler::new(temp.path()));

    let response = middleware
        .attempt(&Method::POST, "/lib/foo.js")
        .await
        .unwrap();

    assert!(response.is_none());
}

#[tokio::test]
async fn test_encoded_url_is_proxied() {
    let temp = TempDir::new().unwrap();
    let middleware = middleware_with(settings_for(temp.path()), StubCompiler::new(temp.path()));

    let response = middleware
        .attempt(&Method::GET, "/https%3A%2F%2Fesm.sh%2Freact.js")
        .await
        .unwrap()
        .expect("encoded url should be proxied");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, MIDDLEWARE_HEADER), "url");
    assert_eq!(header(&response, "content-type"), "application/javascript");

    let body = body_string(response).await;
    assert!(body.contains("compiled https://esm.sh/react.js"));
}

#[tokio::test]
async fn test_bare_imports_are_rewritten_to_unbundled_urls() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "lib/app.js");

    let compiler = StubCompiler::with_imports(
        temp.path(),
        &[("react", ImportKind::ImportStatement)],
    );
    let middleware = middleware_with(settings_for(temp.path()), compiler);

    let response = middleware
        .attempt(&Method::GET, "/lib/app.js")
        .await
        .unwrap()
        .unwrap();

    let body = body_string(response).await;
    assert!(
        body.contains("import \"/node_modules/react/index.js\""),
        "bare import should be rewritten root-relative, got:\n{body}"
    );
}

#[tokio::test]
async fn test_runtime_imports_are_rewritten_to_runtime_urls() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "lib/app.js");

    let compiler = StubCompiler::with_imports(
        temp.path(),
        &[("@limelight/auto_reload", ImportKind::ImportStatement)],
    );
    let middleware = middleware_with(settings_for(temp.path()), compiler);

    let response = middleware
        .attempt(&Method::GET, "/lib/app.js")
        .await
        .unwrap()
        .unwrap();

    let body = body_string(response).await;
    assert!(body.contains("import \"/limelight-runtime/auto_reload/index.js\""));
}

#[tokio::test]
async fn test_unresolvable_import_fails_the_whole_build() {
    struct FailingResolver(StubCompiler);

    #[async_trait]
    impl Compiler for FailingResolver {
        async fn compile(
            &self,
            entry: &Path,
            options: &CompileOptions,
            hook: &dyn ResolveHook,
        ) -> CompileOutput {
            self.0.compile(entry, options, hook).await
        }

        fn resolve_path(&self, request: &DelegateRequest) -> DelegateResolution {
            DelegateResolution {
                errors: vec![Diagnostic::new(format!(
                    "Could not resolve \"{}\"",
                    request.specifier
                ))],
                ..Default::default()
            }
        }
    }

    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "lib/app.js");

    let compiler = FailingResolver(StubCompiler::with_imports(
        temp.path(),
        &[("missing-pkg", ImportKind::ImportStatement)],
    ));
    let middleware = Middleware::new(settings_for(temp.path()), Arc::new(compiler), None);

    let error = middleware
        .attempt(&Method::GET, "/lib/app.js")
        .await
        .unwrap_err();

    match error {
        MiddlewareError::Compile { detail, .. } => {
            assert!(detail.contains("Could not resolve \"missing-pkg\""));
        }
        other => panic!("expected compile error, got {other:?}"),
    }
}
