//! Per-render side-load tracking.
//!
//! A render scope collects every JS/CSS asset the component tree pulls in
//! while rendering one response, deduplicated across nested renders. Scopes
//! are render-local: concurrent renders each own an independent scope, and
//! nothing survives past the response.

use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// The kind of asset being side-loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Js,
    Css,
}

impl AssetKind {
    pub fn extension(self) -> &'static str {
        match self {
            AssetKind::Js => "js",
            AssetKind::Css => "css",
        }
    }
}

/// The deduplicated set of assets collected during one render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideLoadRegistry {
    js: FxHashSet<String>,
    css: FxHashSet<String>,
}

impl SideLoadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent set insertion. Returns `true` when the path was new.
    pub fn append(&mut self, kind: AssetKind, path: impl Into<String>) -> bool {
        let path = path.into();
        let added = match kind {
            AssetKind::Js => self.js.insert(path.clone()),
            AssetKind::Css => self.css.insert(path.clone()),
        };

        if added {
            tracing::debug!(%path, "side loaded asset");
        }

        added
    }

    pub fn contains(&self, kind: AssetKind, path: &str) -> bool {
        match kind {
            AssetKind::Js => self.js.contains(path),
            AssetKind::Css => self.css.contains(path),
        }
    }

    pub fn js(&self) -> &FxHashSet<String> {
        &self.js
    }

    pub fn css(&self) -> &FxHashSet<String> {
        &self.css
    }

    pub fn is_empty(&self) -> bool {
        self.js.is_empty() && self.css.is_empty()
    }

    /// Clear both sets; called at the start of each top-level render.
    pub fn reset(&mut self) {
        self.js.clear();
        self.css.clear();
    }

    /// Union-merge a nested render's registry into this one.
    pub fn merge(&mut self, child: &SideLoadRegistry) {
        self.js.extend(child.js.iter().cloned());
        self.css.extend(child.css.iter().cloned());
    }

    /// Register a component's sibling assets (`<stem>.js`, `<stem>.css`),
    /// consulting the host for which of them actually exist.
    pub fn side_load_component(&mut self, stem: &str, has_asset: impl Fn(&str) -> bool) {
        for kind in [AssetKind::Js, AssetKind::Css] {
            let path = format!("{stem}.{}", kind.extension());
            if has_asset(&path) {
                self.append(kind, path);
            }
        }
    }
}

/// Shared handle to one render's registry.
///
/// Nested component renders write into the same scope through cloned
/// handles; the host creates one scope per top-level render and reads the
/// final snapshot after rendering to emit script/link tags.
#[derive(Debug, Clone, Default)]
pub struct RenderScope {
    inner: Arc<RwLock<SideLoadRegistry>>,
}

impl RenderScope {
    /// A fresh, empty scope for a new top-level render.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, kind: AssetKind, path: impl Into<String>) -> bool {
        self.inner.write().append(kind, path)
    }

    /// Snapshot of the current scope's registry.
    pub fn current(&self) -> SideLoadRegistry {
        self.inner.read().clone()
    }

    /// Reset the scope; must be called exactly once per incoming render.
    pub fn reset(&self) {
        self.inner.write().reset();
    }

    /// Fold a child registry into this scope.
    pub fn merge(&self, child: &SideLoadRegistry) {
        self.inner.write().merge(child);
    }

    pub fn side_load_component(&self, stem: &str, has_asset: impl Fn(&str) -> bool) {
        self.inner.write().side_load_component(stem, has_asset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_is_idempotent() {
        let mut registry = SideLoadRegistry::new();

        assert!(registry.append(AssetKind::Css, "/lib/a.css"));
        assert!(!registry.append(AssetKind::Css, "/lib/a.css"));
        assert_eq!(registry.css().len(), 1);
    }

    #[test]
    fn test_kinds_are_tracked_separately() {
        let mut registry = SideLoadRegistry::new();
        registry.append(AssetKind::Js, "/lib/a.js");
        registry.append(AssetKind::Css, "/lib/a.css");

        assert!(registry.contains(AssetKind::Js, "/lib/a.js"));
        assert!(!registry.contains(AssetKind::Css, "/lib/a.js"));
    }

    #[test]
    fn test_merge_is_a_union_without_duplicates() {
        let mut a = SideLoadRegistry::new();
        a.append(AssetKind::Js, "/components/a.js");
        a.append(AssetKind::Css, "/shared.css");

        let mut b = SideLoadRegistry::new();
        b.append(AssetKind::Css, "/components/b.css");
        b.append(AssetKind::Css, "/shared.css");

        let mut parent = SideLoadRegistry::new();
        parent.merge(&a);
        parent.merge(&b);

        let mut expected = SideLoadRegistry::new();
        expected.append(AssetKind::Js, "/components/a.js");
        expected.append(AssetKind::Css, "/shared.css");
        expected.append(AssetKind::Css, "/components/b.css");

        assert_eq!(parent, expected);
    }

    #[test]
    fn test_union_law_for_nested_renders() {
        // Rendering parent(embed A, embed B) must equal the union of A and B
        // rendered independently.
        let render_a = |scope: &RenderScope| {
            scope.append(AssetKind::Js, "/components/a.js");
            scope.append(AssetKind::Css, "/dep.css");
        };
        let render_b = |scope: &RenderScope| {
            scope.append(AssetKind::Js, "/components/b.js");
            scope.append(AssetKind::Css, "/dep.css");
        };

        let nested = RenderScope::new();
        render_a(&nested);
        render_b(&nested);

        let alone_a = RenderScope::new();
        render_a(&alone_a);
        let alone_b = RenderScope::new();
        render_b(&alone_b);

        let mut union = alone_a.current();
        union.merge(&alone_b.current());

        assert_eq!(nested.current(), union);
        assert_eq!(nested.current().css().len(), 1);
    }

    #[test]
    fn test_reset_empties_the_scope() {
        let scope = RenderScope::new();
        scope.append(AssetKind::Js, "/lib/a.js");
        scope.reset();

        assert!(scope.current().is_empty());
    }

    #[test]
    fn test_scopes_are_independent() {
        let first = RenderScope::new();
        let second = RenderScope::new();

        first.append(AssetKind::Js, "/lib/a.js");

        assert!(second.current().is_empty());
    }

    #[test]
    fn test_nested_handles_share_one_scope() {
        let scope = RenderScope::new();
        let nested = scope.clone();

        nested.append(AssetKind::Css, "/components/child.css");

        assert!(scope.current().contains(AssetKind::Css, "/components/child.css"));
    }

    #[test]
    fn test_side_load_component_registers_existing_siblings() {
        let mut registry = SideLoadRegistry::new();
        registry.side_load_component("/components/widget", |path| path.ends_with(".css"));

        assert!(registry.contains(AssetKind::Css, "/components/widget.css"));
        assert!(!registry.contains(AssetKind::Js, "/components/widget.js"));
    }
}
