//! Static file serving from the public directory.

use std::path::Path;

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::state::AppState;

/// Serve `/favicon.ico` and fall back to files under `public_dir` for every
/// path no other route matches.
pub fn attach(router: Router<AppState>, public_dir: &Path) -> Router<AppState> {
    router
        .route_service("/favicon.ico", ServeFile::new(public_dir.join("favicon.ico")))
        .fallback_service(ServeDir::new(public_dir))
}
