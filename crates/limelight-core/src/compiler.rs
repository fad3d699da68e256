//! The opaque compiler capability.
//!
//! The bundler/compiler engine behind limelight is an external collaborator.
//! This module defines the seam: a [`Compiler`] produces compiled output for
//! an entry path with a [`ResolveHook`] installed, and exposes its own
//! low-level path resolution for the hook to delegate to. Limelight never
//! looks inside the engine.

use crate::diagnostics::Diagnostic;
use crate::import_map::ImportMap;
use crate::resolve::ResolutionResult;
use crate::specifier::Specifier;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Source map emission mode for one compile invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMapMode {
    #[default]
    None,
    /// Emit alongside the code with a linking comment.
    Linked,
    /// Emit as a separate artifact; used for `.map` requests.
    External,
}

/// Options for one compile invocation.
///
/// Each HTTP request builds its own options; nothing here is shared across
/// requests.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Working directory root; entry and result paths are relative to it.
    pub root: PathBuf,
    /// Directory holding the runtime-internal modules.
    pub runtime_dir: PathBuf,
    /// Import map consulted by the resolve hook, if configured.
    pub import_map: Option<ImportMap>,
    pub sourcemap: SourceMapMode,
    /// Environment definitions passed through to the engine verbatim.
    pub env: BTreeMap<String, String>,
}

/// Result of one compile invocation.
///
/// A non-empty `errors` list means the build failed; deferred resolution
/// failures surface here rather than out of the resolve hook.
#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    pub code: Vec<u8>,
    pub source_map: Option<Vec<u8>>,
    pub errors: Vec<Diagnostic>,
}

impl CompileOutput {
    pub fn failed(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// A delegated path-resolution request from the resolve hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateRequest {
    /// Specifier to resolve, query parameters already consumed.
    pub specifier: String,
    /// Base directory for relative and bare-module resolution.
    pub resolve_dir: PathBuf,
    /// Marks the call as hook-internal bookkeeping: the engine must not
    /// re-enter its registered resolve hooks for this request.
    pub internal: bool,
}

/// Result of a delegated path resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DelegateResolution {
    pub path: PathBuf,
    pub external: bool,
    pub side_effects: Option<SideEffects>,
    /// Non-empty when the engine could not resolve the specifier. Not fatal
    /// at this layer; carried into the hook result and reported with the
    /// final build errors.
    pub errors: Vec<Diagnostic>,
}

/// Side-effect metadata for a resolved module, as declared by its package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SideEffects {
    Flag(bool),
    Globs(Vec<String>),
}

/// The resolve-hook protocol.
///
/// Called once per discovered import, concurrently for different specifiers
/// within one invocation. Returning `None` defers to the engine's own
/// default resolution.
pub trait ResolveHook: Send + Sync {
    fn on_resolve(&self, specifier: &Specifier) -> Option<ResolutionResult>;
}

/// The compiler service invoked by the asset builder.
#[async_trait]
pub trait Compiler: Send + Sync {
    /// Compile `entry` with `hook` installed as the resolve hook, calling it
    /// for every import discovered while building the module graph.
    async fn compile(
        &self,
        entry: &Path,
        options: &CompileOptions,
        hook: &dyn ResolveHook,
    ) -> CompileOutput;

    /// The engine's own path resolution (bare-module/node-style lookup),
    /// exposed for the resolve hook to delegate to.
    fn resolve_path(&self, request: &DelegateRequest) -> DelegateResolution;
}
