//! Import specifier parsing and classification.
//!
//! A raw specifier string arrives from the compiler with an optional query
//! string carrying the bundling protocol (`?bundle`, `?bundle-all`). The
//! query is split off and decoded into a typed [`BundleFlag`] exactly once,
//! here; later stages never re-parse the string.

use serde::{Deserialize, Serialize};

/// How the compiler discovered an import.
///
/// Only the four recognized kinds are eligible for the unbundle algorithm;
/// anything else is left to the compiler's own default resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportKind {
    ImportStatement,
    DynamicImport,
    RequireCall,
    CssImport,
    /// Any other kind (entry points, URL tokens, compiler-internal).
    Other,
}

impl ImportKind {
    /// Whether this kind participates in the unbundle algorithm.
    pub fn is_recognized(self) -> bool {
        !matches!(self, ImportKind::Other)
    }
}

/// The bundling flag decoded from a specifier's query string.
///
/// `BundleAll` subsumes `Bundle`: when both parameters are present the
/// stronger flag wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BundleFlag {
    #[default]
    None,
    Bundle,
    BundleAll,
}

/// A parsed import specifier, immutable for the duration of one resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    path: String,
    query: Option<String>,
    params: Vec<(String, String)>,
    flag: BundleFlag,
    kind: ImportKind,
    importer: String,
}

impl Specifier {
    /// Parse a raw specifier as received from the compiler's resolve hook.
    ///
    /// `importer` is the path of the module containing the import; empty for
    /// entry points.
    pub fn parse(raw: &str, kind: ImportKind, importer: &str) -> Self {
        let (path, query) = match raw.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (raw.to_string(), None),
        };

        let params = query.as_deref().map(parse_query).unwrap_or_default();

        let flag = if params.iter().any(|(k, _)| k == "bundle-all") {
            BundleFlag::BundleAll
        } else if params.iter().any(|(k, _)| k == "bundle") {
            BundleFlag::Bundle
        } else {
            BundleFlag::None
        };

        Self {
            path,
            query,
            params,
            flag,
            kind,
            importer: importer.to_string(),
        }
    }

    /// The specifier path with the query string stripped.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// The query string as a result suffix, with the leading `?` restored.
    pub fn suffix(&self) -> Option<String> {
        self.query.as_ref().map(|q| format!("?{q}"))
    }

    pub fn flag(&self) -> BundleFlag {
        self.flag
    }

    pub fn kind(&self) -> ImportKind {
        self.kind
    }

    pub fn importer(&self) -> &str {
        &self.importer
    }

    /// First value for a query parameter, if present.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|(k, _)| k == name)
    }

    /// Remote specifiers are marked external without further processing.
    pub fn is_remote(&self) -> bool {
        self.path.starts_with("http://") || self.path.starts_with("https://")
    }

    /// Bare module: no leading `/` or `.`, resolved by package convention.
    pub fn is_bare(&self) -> bool {
        is_bare(&self.path)
    }

    pub fn is_root_relative(&self) -> bool {
        self.path.starts_with('/')
    }
}

/// Bare-module test on an arbitrary path string.
pub(crate) fn is_bare(path: &str) -> bool {
    !path.starts_with('/') && !path.starts_with('.')
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}
