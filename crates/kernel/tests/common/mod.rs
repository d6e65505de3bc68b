#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Tests drive the REAL kernel router and state, backed by a fresh
//! [`MemoryStore`] per [`TestApp`], so no database or Redis is required.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use launchpad_kernel::bootstrap::{self, BootstrapReport};
use launchpad_kernel::config::Config;
use launchpad_kernel::models::SeedData;
use launchpad_kernel::routes;
use launchpad_kernel::state::AppState;
use launchpad_kernel::store::MemoryStore;

/// Admin token configured on every test app.
pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    pub store: MemoryStore,
    pub state: AppState,
}

impl TestApp {
    /// Create an app over an empty memory store with the default roles.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    /// Create an app over a given store.
    pub fn with_store(store: MemoryStore) -> Self {
        let public_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("public");

        let config = Config {
            admin_api_token: Some(ADMIN_TOKEN.to_string()),
            public_dir,
            ..Config::default()
        };

        let state = AppState::with_stores(config, Arc::new(store.clone()), Arc::new(store.clone()));
        let router = routes::app(state.clone(), None);

        Self {
            router,
            store,
            state,
        }
    }

    /// Run the bootstrap with the built-in seed lists.
    pub async fn bootstrap(&self) -> BootstrapReport {
        let seed = SeedData::embedded().expect("embedded seed parses");
        bootstrap::run(&self.state.bootstrap_context(), &seed)
            .await
            .expect("bootstrap succeeds")
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Anonymous GET, returning status and JSON body.
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let response = self
            .request(Request::get(uri).body(Body::empty()).unwrap())
            .await;
        into_json(response).await
    }

    /// Admin request with an optional JSON body.
    pub async fn admin(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(method, uri, body, Some(ADMIN_TOKEN)).await
    }

    /// Request with an optional JSON body and bearer token.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        into_json(self.request(request).await).await
    }
}

/// Read a response body as JSON (`Value::Null` when empty or not JSON).
pub async fn into_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// Read a response body as text.
pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}
