//! HTTP middleware components.
//!
//! Provides CORS, security headers, and requester resolution.

pub mod cors;
pub mod headers;
pub mod requester;

pub use cors::build_cors_layer;
pub use headers::security_headers;
pub use requester::{Requester, resolve_requester};
