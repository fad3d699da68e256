//! CSS module token resolution.
//!
//! Resolves `path@exportedName` tokens to deterministic hashed class names
//! and registers the backing stylesheet as a css side-load. The class name is
//! a pure function of (stylesheet path, exported name), so rendered HTML is
//! stable across processes and safe to snapshot.

use crate::side_load::{AssetKind, RenderScope};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Extension appended to the module path before registration.
pub const MODULE_STYLESHEET_SUFFIX: &str = ".module.css";

/// Number of digest hex characters appended to the exported name.
const DIGEST_LEN: usize = 8;

/// Errors raised for tokens that cannot be resolved. A malformed token
/// raises rather than guessing at a class name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CssModuleError {
    #[error("Malformed CSS module token '{token}': expected '<path>@<exportedName>'")]
    MalformedToken { token: String },
}

/// A parsed CSS module reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssModulePath {
    /// Stylesheet path registered as a css side-load.
    pub stylesheet: String,
    /// Exported class name within the stylesheet.
    pub name: String,
}

impl CssModulePath {
    /// Parse a token of the form `[@]?<path>@<exportedName>`.
    ///
    /// - `@scoped/pkg/lib/button@default` → `npm:@scoped/pkg/lib/button.module.css`
    /// - `mypkg/lib/button@default` → `npm:mypkg/lib/button.module.css`
    /// - `/app/styles@name` → `/app/styles.module.css`
    pub fn parse(token: &str) -> Result<Self, CssModuleError> {
        let malformed = || CssModuleError::MalformedToken {
            token: token.to_string(),
        };

        let (prefix, rest) = if let Some(rest) = token.strip_prefix('@') {
            // Scoped package path; the leading @ is part of the path.
            ("npm:@", rest)
        } else if let Some(rest) = token.strip_prefix('/') {
            ("/", rest)
        } else {
            ("npm:", token)
        };

        let (path, name) = rest.split_once('@').ok_or_else(malformed)?;

        if path.is_empty() || name.is_empty() || name.contains('@') {
            return Err(malformed());
        }

        Ok(Self {
            stylesheet: format!("{prefix}{path}{MODULE_STYLESHEET_SUFFIX}"),
            name: name.to_string(),
        })
    }
}

/// Deterministic class name for an exported name in a stylesheet.
pub fn class_name(stylesheet: &str, name: &str) -> String {
    let digest = Sha256::digest(stylesheet.as_bytes());
    let mut hex = String::with_capacity(DIGEST_LEN);
    for byte in digest.iter().take(DIGEST_LEN / 2) {
        hex.push_str(&format!("{byte:02x}"));
    }

    format!("{name}{hex}")
}

/// Resolves CSS module tokens within one render scope.
#[derive(Debug, Clone)]
pub struct CssModuleResolver {
    scope: RenderScope,
}

impl CssModuleResolver {
    pub fn new(scope: RenderScope) -> Self {
        Self { scope }
    }

    /// Resolve a token to its hashed class name, registering the stylesheet
    /// as a css side-load of the current render.
    pub fn resolve(&self, token: &str) -> Result<String, CssModuleError> {
        let parsed = CssModulePath::parse(token)?;

        self.scope.append(AssetKind::Css, parsed.stylesheet.clone());

        Ok(class_name(&parsed.stylesheet, &parsed.name))
    }
}
