//! The resolution engine.
//!
//! Installed as the compiler's resolve hook, the engine decides for every
//! discovered import whether it is served unbundled as its own URL, rewritten
//! to a runtime path, inlined into the current bundle, marked external, or
//! redirected through the import map. One engine exists per compile
//! invocation; the only cross-call state is the sticky bundle-all bit.

use crate::compiler::{Compiler, DelegateRequest, ResolveHook, SideEffects};
use crate::diagnostics::Diagnostic;
use crate::import_map::{ImportMap, ImportMapMatch};
use crate::specifier::{self, BundleFlag, ImportKind, Specifier};
use path_clean::PathClean;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reserved prefix for runtime-internal specifiers.
pub const RUNTIME_NAMESPACE: &str = "@limelight/";

/// Root-relative URL prefix under which runtime files are served.
pub const RUNTIME_URL_PREFIX: &str = "/limelight-runtime";

/// Per-specifier resolution decision, produced fresh per call and never
/// mutated after return.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionResult {
    /// Root-relative URL or absolute filesystem path; never a bare specifier.
    pub path: String,
    /// External results are fetched by the browser as their own request.
    pub external: bool,
    /// Query-string suffix reattached to the resolved path.
    pub suffix: Option<String>,
    pub side_effects: Option<SideEffects>,
    /// Set for stylesheets imported from script files, which the compiler
    /// processes in place instead of externalizing.
    pub imported_from_js: bool,
    /// Deferred resolution failures, reported with the final build errors.
    pub errors: Vec<Diagnostic>,
}

impl ResolutionResult {
    fn external(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            external: true,
            ..Default::default()
        }
    }
}

/// Options fixed for the lifetime of one engine (one compile invocation).
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub root: PathBuf,
    pub runtime_dir: PathBuf,
    pub import_map: Option<ImportMap>,
}

/// The resolve hook for one compile invocation.
///
/// Safe to invoke concurrently for different specifiers; the sticky
/// bundle-all bit is a single test-and-set flag that is set before any
/// result observing it is returned, so dependents of a flagged specifier
/// always see it raised.
pub struct ResolutionEngine {
    root: PathBuf,
    runtime_dir: PathBuf,
    import_map: Option<ImportMap>,
    runtime_cwd_alias: String,
    delegate: Arc<dyn Compiler>,
    bundle_all: AtomicBool,
}

impl ResolutionEngine {
    pub fn new(options: EngineOptions, delegate: Arc<dyn Compiler>) -> Self {
        let runtime_cwd_alias = format!(
            "{}{}",
            options.root.to_string_lossy().trim_end_matches('/'),
            RUNTIME_URL_PREFIX
        );

        Self {
            root: options.root,
            runtime_dir: options.runtime_dir,
            import_map: options.import_map,
            runtime_cwd_alias,
            delegate,
            bundle_all: AtomicBool::new(false),
        }
    }

    /// Whether the sticky bundle-all bit has been raised in this invocation.
    pub fn bundling_all(&self) -> bool {
        self.bundle_all.load(Ordering::SeqCst)
    }

    /// Resolve one specifier, first match wins:
    ///
    /// 1. remote scheme → external, untouched
    /// 2. runtime namespace → inlined runtime file or external runtime URL
    /// 3. runtime cwd alias → inlined runtime file
    /// 4. recognized import kind → unbundle algorithm
    ///
    /// Any other kind produces no resolution and defers to the compiler.
    pub fn resolve(&self, spec: &Specifier) -> Option<ResolutionResult> {
        if spec.is_remote() {
            let mut result = ResolutionResult::external(spec.path());
            result.suffix = spec.suffix();
            return Some(result);
        }

        if let Some(rest) = spec.path().strip_prefix(RUNTIME_NAMESPACE) {
            return Some(self.resolve_runtime(spec, rest));
        }

        if let Some(rest) = spec.path().strip_prefix(self.runtime_cwd_alias.as_str()) {
            let path = self.runtime_dir.join(rest.trim_start_matches('/')).clean();
            return Some(ResolutionResult {
                path: path.to_string_lossy().into_owned(),
                suffix: spec.suffix(),
                ..Default::default()
            });
        }

        if spec.kind().is_recognized() {
            return Some(self.unbundle(spec));
        }

        None
    }

    /// Runtime-namespace specifiers resolve to `<dir-or-alias>/<rest>/index.js`.
    fn resolve_runtime(&self, spec: &Specifier, rest: &str) -> ResolutionResult {
        if spec.flag() == BundleFlag::BundleAll {
            self.bundle_all.store(true, Ordering::SeqCst);
        }

        let mut result = ResolutionResult {
            suffix: spec.suffix(),
            ..Default::default()
        };

        if self.bundling_all() || spec.flag() == BundleFlag::Bundle {
            result.path = self
                .runtime_dir
                .join(rest)
                .join("index.js")
                .clean()
                .to_string_lossy()
                .into_owned();
        } else {
            result.path = format!("{RUNTIME_URL_PREFIX}/{rest}/index.js");
            result.external = true;
        }

        result
    }

    /// The unbundle algorithm: import map, root-relative anchoring, delegated
    /// resolution, bundling flags, and finally translation back to a
    /// root-relative URL.
    fn unbundle(&self, spec: &Specifier) -> ResolutionResult {
        let mut path = spec.path().to_string();

        if let Some(map) = &self.import_map {
            match map.resolve(&path, spec.importer()) {
                Some(ImportMapMatch::External(url)) => {
                    return ResolutionResult::external(url);
                }
                Some(ImportMapMatch::File(mapped)) => path = mapped,
                None => {}
            }
        }

        // Root-relative paths are anchored under the working directory.
        if let Some(rest) = path.strip_prefix('/') {
            path = self.root.join(rest).clean().to_string_lossy().into_owned();
        }

        // Bare modules resolve from the root; everything else from the
        // importer's directory. Query parameters are consumed here and never
        // reach the delegate.
        let resolve_dir = if specifier::is_bare(&path) {
            self.root.clone()
        } else {
            Path::new(spec.importer())
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.root.clone())
        };

        let delegated = self.delegate.resolve_path(&DelegateRequest {
            specifier: path,
            resolve_dir,
            internal: true,
        });

        if !delegated.errors.is_empty() {
            tracing::debug!(
                specifier = spec.path(),
                importer = spec.importer(),
                "delegated resolution failed; deferring to build errors"
            );
            return ResolutionResult {
                path: spec.path().to_string(),
                suffix: spec.suffix(),
                errors: delegated.errors,
                ..Default::default()
            };
        }

        // Sticky bundle-all: raised before this result is returned, so every
        // dependent resolved afterwards observes it.
        let bundle_all = if spec.flag() == BundleFlag::BundleAll {
            self.bundle_all.store(true, Ordering::SeqCst);
            true
        } else {
            self.bundling_all()
        };

        if bundle_all {
            return ResolutionResult {
                path: delegated.path.to_string_lossy().into_owned(),
                suffix: Some("?bundle-all".to_string()),
                side_effects: delegated.side_effects,
                ..Default::default()
            };
        }

        if spec.flag() == BundleFlag::Bundle {
            return ResolutionResult {
                path: delegated.path.to_string_lossy().into_owned(),
                suffix: Some("?bundle".to_string()),
                side_effects: delegated.side_effects,
                ..Default::default()
            };
        }

        // A stylesheet imported from a script file stays with the compiler,
        // which processes the CSS import in place.
        if spec.path().ends_with(".css")
            && spec.kind() == ImportKind::ImportStatement
            && is_script(spec.importer())
        {
            return ResolutionResult {
                path: delegated.path.to_string_lossy().into_owned(),
                suffix: spec.suffix(),
                side_effects: delegated.side_effects,
                imported_from_js: true,
                ..Default::default()
            };
        }

        ResolutionResult {
            path: self.to_url_path(&delegated.path),
            external: true,
            suffix: spec.suffix(),
            side_effects: delegated.side_effects,
            ..Default::default()
        }
    }

    /// Translate a delegated absolute path back into a root-relative URL,
    /// substituting the runtime URL prefix for paths inside the runtime dir.
    fn to_url_path(&self, resolved: &Path) -> String {
        if let Ok(rest) = resolved.strip_prefix(&self.runtime_dir) {
            return format!("{RUNTIME_URL_PREFIX}/{}", rest.display());
        }

        if let Ok(rest) = resolved.strip_prefix(&self.root) {
            return format!("/{}", rest.display());
        }

        resolved.to_string_lossy().into_owned()
    }
}

impl ResolveHook for ResolutionEngine {
    fn on_resolve(&self, specifier: &Specifier) -> Option<ResolutionResult> {
        self.resolve(specifier)
    }
}

fn is_script(importer: &str) -> bool {
    importer.ends_with(".js") || importer.ends_with(".jsx")
}
