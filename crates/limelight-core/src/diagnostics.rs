//! Diagnostics carried through the resolve/compile protocol.
//!
//! Resolution failures are never thrown out of the resolve hook; they are
//! attached to hook results and surface in the compiler's final error list.

use serde::{Deserialize, Serialize};

/// A single diagnostic produced during resolution or compilation.
///
/// Cloneable and serializable so it can cross the compiler boundary in a
/// stable shape regardless of the engine behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    /// File the diagnostic points at, when known.
    pub file: Option<String>,
    /// Raw detail text from the underlying engine.
    pub detail: Option<String>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: None,
            detail: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.file, &self.detail) {
            (Some(file), Some(detail)) => write!(f, "{} ({}): {}", self.message, file, detail),
            (Some(file), None) => write!(f, "{} ({})", self.message, file),
            (None, Some(detail)) => write!(f, "{}: {}", self.message, detail),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}
