//! Limelight middleware: request dispatch and on-demand asset building.
//!
//! Sits in a host framework's request pipeline. Each GET/HEAD request for a
//! JavaScript/CSS source path is classified to a handler, compiled on demand
//! with the resolution engine installed as the compiler's resolve hook, and
//! answered with the compiled bytes plus caching headers, or declined so the
//! host's own routing takes over.

mod builder;
mod dispatch;
mod error;
#[cfg(feature = "logging")]
pub mod logging;
mod server;

pub use builder::{AssetBuilder, MIDDLEWARE_HEADER, SOURCE_MAP_HEADER};
pub use dispatch::{HandlerType, RequestDispatcher};
pub use error::{MiddlewareError, Result};
pub use server::{handle_request, router, Middleware, SharedMiddleware};
