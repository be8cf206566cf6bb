use crate::db::StoreError;
use crate::validation::{ViolationDetail, Violations};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use utoipa::ToSchema;

/// Longest error message echoed back to a client.
pub const MAX_ERROR_DETAIL: usize = 80;

/// Cuts a message to at most `max` characters.
pub fn truncate_detail(message: &str, max: usize) -> String {
    message.chars().take(max).collect()
}

/// Body of every 422 response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidationErrorBody {
    /// One entry per rejected field, in declaration order.
    pub detail: Vec<ViolationDetail>,
}

impl From<&Violations> for ValidationErrorBody {
    fn from(violations: &Violations) -> Self {
        Self {
            detail: violations.details(),
        }
    }
}

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Input failed schema validation.
    Validation(Violations),
    /// The document store was unavailable or rejected the operation.
    Store(StoreError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(violations) => write!(f, "Validation failed: {}", violations),
            AppError::Store(e) => write!(f, "Store error: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Validation(violations) => Some(violations),
            AppError::Store(e) => Some(e),
        }
    }
}

impl IntoResponse for AppError {
    /// Validation failures become 422 with one entry per offending field;
    /// store failures become 500 with a truncated message.
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(violations) => {
                tracing::debug!("Rejected payload: {}", violations);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(ValidationErrorBody::from(&violations)),
                )
                    .into_response()
            }
            AppError::Store(e) => {
                tracing::error!("Store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": truncate_detail(&e.to_string(), MAX_ERROR_DETAIL) })),
                )
                    .into_response()
            }
        }
    }
}

impl From<Violations> for AppError {
    fn from(violations: Violations) -> Self {
        AppError::Validation(violations)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::validate_lead;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_truncate_detail_is_char_safe() {
        assert_eq!(truncate_detail("✅✅✅", 2), "✅✅");
        assert_eq!(truncate_detail("short", 80), "short");
    }

    #[tokio::test]
    async fn test_validation_error_is_unprocessable() {
        let violations = validate_lead(&json!({"name": "Jane Doe"})).unwrap_err();
        let response = AppError::from(violations).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["detail"][0]["field"], "email");
        assert_eq!(body["detail"][0]["message"], "Field required");
    }

    #[tokio::test]
    async fn test_store_error_detail_is_truncated() {
        let response = AppError::Store(StoreError::Operation("x".repeat(500))).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["detail"].as_str().unwrap().len(), MAX_ERROR_DETAIL);
    }
}
