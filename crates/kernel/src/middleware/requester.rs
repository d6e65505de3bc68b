//! Requester resolution.
//!
//! Every request is either the admin (bearer token matching
//! `ADMIN_API_TOKEN`) or the public. The result is stored in request
//! extensions for handlers to authorize against.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::AppError;
use crate::models::well_known;
use crate::state::AppState;

/// Who is making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    /// Holder of the admin API token; allowed everything.
    Admin,
    /// Anonymous caller, limited to the public role's grants.
    Public,
}

impl Requester {
    /// Role whose grants apply, if permissions are checked at all.
    pub fn role_type(self) -> Option<&'static str> {
        match self {
            Requester::Admin => None,
            Requester::Public => Some(well_known::PUBLIC),
        }
    }
}

/// Middleware that resolves the [`Requester`].
///
/// - No `Authorization` header -> public
/// - `Bearer <ADMIN_API_TOKEN>` -> admin
/// - Any other bearer value, or one sent while no admin token is configured -> 401
pub async fn resolve_requester(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let requester = match auth_header.and_then(|v| v.strip_prefix("Bearer ")) {
        None => Requester::Public,
        Some(token) => {
            let expected = state.config().admin_api_token.as_deref();
            if !token_matches(token, expected) {
                debug!("rejecting request with invalid bearer token");
                return AppError::Unauthorized.into_response();
            }
            Requester::Admin
        }
    };

    request.extensions_mut().insert(requester);
    next.run(request).await
}

/// Constant-time comparison against the configured token.
fn token_matches(presented: &str, expected: Option<&str>) -> bool {
    match expected {
        Some(expected) => bool::from(presented.as_bytes().ct_eq(expected.as_bytes())),
        None => false,
    }
}

impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Requester>()
            .copied()
            .unwrap_or(Requester::Public))
    }
}
