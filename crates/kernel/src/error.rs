//! Application error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::content::EntityError;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("invalid API token")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "InternalServerError",
            AppError::NotFound(_) => "NotFoundError",
            AppError::Unauthorized => "UnauthorizedError",
            AppError::Forbidden => "ForbiddenError",
            AppError::BadRequest(_) => "BadRequestError",
            AppError::Validation(_) => "ValidationError",
        }
    }
}

impl From<EntityError> for AppError {
    fn from(err: EntityError) -> Self {
        match err {
            EntityError::Validation { .. } => AppError::Validation(err.to_string()),
            EntityError::NotFound { .. } => AppError::NotFound(err.to_string()),
            EntityError::Store(e) => AppError::Internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal server error");
                "internal server error".to_string()
            }
            _ => self.to_string(),
        };

        let body = json!({
            "data": null,
            "error": {
                "status": status.as_u16(),
                "name": self.name(),
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::EntityKind;

    #[test]
    fn entity_errors_map_to_statuses() {
        let validation: AppError = EntityError::Validation {
            kind: EntityKind::Tag,
            message: "'slug' is required".into(),
        }
        .into();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.name(), "ValidationError");

        let missing: AppError = EntityError::NotFound {
            kind: EntityKind::Tag,
            id: 4,
        }
        .into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let store: AppError = EntityError::Store(anyhow::anyhow!("connection reset")).into();
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn internal_details_are_not_leaked() {
        use http_body_util::BodyExt;

        let response = AppError::Internal(anyhow::anyhow!("password=hunter2")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["data"], serde_json::Value::Null);
        assert_eq!(body["error"]["status"], 500);
        assert_eq!(body["error"]["message"], "internal server error");
    }
}
