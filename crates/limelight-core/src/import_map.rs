//! Import-map loading and resolution.
//!
//! Implements the standard mapping format: a top-level `imports` table plus
//! `scopes` keyed by importer-URL prefix. Scope maps are consulted before the
//! top-level table, longest scope prefix first; within a map an exact key
//! match beats a trailing-slash prefix match, and among prefix matches the
//! longest key wins.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading an import map.
#[derive(Debug, Error)]
pub enum ImportMapError {
    #[error("Failed to parse import map: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid import map entry '{key}': {reason}")]
    InvalidEntry { key: String, reason: String },
}

/// A parsed import map, read-only during resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportMap {
    #[serde(default)]
    pub imports: IndexMap<String, String>,

    #[serde(default)]
    pub scopes: IndexMap<String, IndexMap<String, String>>,
}

/// Outcome of a successful import-map match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportMapMatch {
    /// The target is a local file path; substitute it and keep resolving.
    File(String),
    /// The target is a remote URL; short-circuit as an external reference.
    External(String),
}

impl ImportMap {
    /// Parse an import map from its JSON representation.
    ///
    /// Prefix keys (ending in `/`) must map to prefix targets, per the
    /// standard; violations are rejected up front rather than at match time.
    pub fn from_json(source: &str) -> Result<Self, ImportMapError> {
        let map: ImportMap = serde_json::from_str(source)?;

        for (key, target) in map
            .imports
            .iter()
            .chain(map.scopes.values().flat_map(|m| m.iter()))
        {
            if key.ends_with('/') && !target.ends_with('/') {
                return Err(ImportMapError::InvalidEntry {
                    key: key.clone(),
                    reason: "prefix key must map to a prefix target ending in '/'".into(),
                });
            }
        }

        Ok(map)
    }

    /// Resolve `specifier` against the map, scoped by the importer's URL.
    ///
    /// Returns `None` when nothing matches, leaving the specifier untouched.
    pub fn resolve(&self, specifier: &str, importer: &str) -> Option<ImportMapMatch> {
        // Scope maps first, longest matching scope prefix wins.
        let mut scopes: Vec<(&String, &IndexMap<String, String>)> = self
            .scopes
            .iter()
            .filter(|(scope, _)| importer.starts_with(scope.as_str()))
            .collect();
        scopes.sort_by_key(|(scope, _)| std::cmp::Reverse(scope.len()));

        for (_, map) in scopes {
            if let Some(target) = match_in(map, specifier) {
                return Some(classify(target));
            }
        }

        match_in(&self.imports, specifier).map(classify)
    }
}

/// Match a specifier within one mapping table.
fn match_in(map: &IndexMap<String, String>, specifier: &str) -> Option<String> {
    if let Some(target) = map.get(specifier) {
        return Some(target.clone());
    }

    map.iter()
        .filter(|(key, _)| key.ends_with('/') && specifier.starts_with(key.as_str()))
        .max_by_key(|(key, _)| key.len())
        .map(|(key, target)| format!("{}{}", target, &specifier[key.len()..]))
}

/// Classify a matched target: `file:` and path-like targets substitute the
/// specifier's path; any other scheme short-circuits as external.
fn classify(target: String) -> ImportMapMatch {
    if let Some(path) = target.strip_prefix("file://") {
        return ImportMapMatch::File(path.to_string());
    }

    if target.contains("://") {
        return ImportMapMatch::External(target);
    }

    ImportMapMatch::File(target)
}
