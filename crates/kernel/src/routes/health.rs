//! `GET /health`: which store backs the content API and whether it answers.
//!
//! A store that fails its ping turns the response into 503 so load
//! balancers stop routing to this instance.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct HealthReport {
    status: &'static str,
    /// `postgres` or `memory`.
    backend: &'static str,
    store: bool,
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let store = state.store_healthy().await;
    let report = HealthReport {
        status: if store { "healthy" } else { "unhealthy" },
        backend: state.store_backend(),
        store,
    };

    let code = if store {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(report))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
