//! HTTP route handlers and the application router.

pub mod content;
pub mod health;
pub mod static_files;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use fred::prelude::Pool;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_redis_store::RedisStore;

use crate::middleware::{build_cors_layer, resolve_requester, security_headers};
use crate::state::AppState;

/// Session layer type used when Redis is configured.
pub type SessionLayer = SessionManagerLayer<RedisStore<Pool>>;

/// Build the application router with its middleware chain.
pub fn app(state: AppState, session: Option<SessionLayer>) -> Router {
    let config = state.config().clone();

    let router = Router::new()
        .merge(health::router())
        .merge(content::router());
    let router = static_files::attach(router, &config.public_dir);

    // Middleware layers (last added = first executed in request flow):
    // TraceLayer → CORS → security headers → body limit → session → requester → routes
    let router = router.layer(axum::middleware::from_fn_with_state(
        state.clone(),
        resolve_requester,
    ));
    let router = match session {
        Some(layer) => router.layer(layer),
        None => router,
    };
    let router = router.layer(DefaultBodyLimit::max(config.max_body_bytes));

    security_headers(router)
        .layer(build_cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
