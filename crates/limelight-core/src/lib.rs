//! Limelight core: request-time asset resolution for web frameworks.
//!
//! This crate holds the resolution engine that decides, for every import
//! specifier discovered during an on-demand compile, whether the asset is
//! served unbundled, inlined, rewritten to a runtime path, redirected
//! through an import map, or marked external. It also provides the
//! per-render side-load registry and CSS module token resolution.
//!
//! The compiler/bundler engine itself is an external collaborator behind
//! the [`Compiler`] trait; limelight supplies the decisions, not the
//! bundling.

pub mod compiler;
pub mod css_modules;
pub mod diagnostics;
pub mod import_map;
pub mod resolve;
pub mod side_load;
pub mod specifier;

pub use compiler::{
    CompileOptions, CompileOutput, Compiler, DelegateRequest, DelegateResolution, ResolveHook,
    SideEffects, SourceMapMode,
};
pub use css_modules::{class_name, CssModuleError, CssModulePath, CssModuleResolver};
pub use diagnostics::Diagnostic;
pub use import_map::{ImportMap, ImportMapError, ImportMapMatch};
pub use resolve::{
    EngineOptions, ResolutionEngine, ResolutionResult, RUNTIME_NAMESPACE, RUNTIME_URL_PREFIX,
};
pub use side_load::{AssetKind, RenderScope, SideLoadRegistry};
pub use specifier::{BundleFlag, ImportKind, Specifier};
