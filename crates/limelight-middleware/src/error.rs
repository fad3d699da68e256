//! Middleware error types.
//!
//! Compile failures are typed so hosts can render them distinctly; a
//! declined request is not an error (the builder returns `Ok(None)`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MiddlewareError {
    /// The compiler reported errors for the requested file. Surfaced as a
    /// 500-class response; never retried, never cached.
    #[error("Failed to build '{file}' -- {detail}")]
    Compile { file: String, detail: String },

    /// Request path could not be decoded into a servable path.
    #[error("Invalid request path: {0}")]
    InvalidPath(String),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using `MiddlewareError` as the default error type.
pub type Result<T, E = MiddlewareError> = std::result::Result<T, E>;
