//! Request extractors that report undecodable input as a validation failure.
//!
//! axum's stock `Json` and `Query` answer bad input with 400/415 and a plain
//! text body. These wrappers route the same failures through
//! [`AppError::Validation`] so every rejected request gets the 422
//! `{"detail": [...]}` shape.

use crate::errors::{truncate_detail, AppError, MAX_ERROR_DETAIL};
use crate::models::{PropertyQuery, RawPropertyQuery};
use crate::validation::{ViolationKind, Violations};
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// A request body decoded as JSON, whatever the `Content-Type` header says.
#[derive(Debug, Clone)]
pub struct JsonBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // Oversized bodies keep their 413 from the body limit layer.
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        serde_json::from_slice(&bytes).map(JsonBody).map_err(|e| {
            let reason = format!("JSON decode error: {}", e);
            AppError::Validation(Violations::single(
                "body",
                ViolationKind::Malformed {
                    reason: truncate_detail(&reason, MAX_ERROR_DETAIL),
                },
            ))
            .into_response()
        })
    }
}

/// Property feed parameters parsed from the query string.
#[derive(Debug, Clone)]
pub struct FeedQuery(pub PropertyQuery);

#[async_trait]
impl<S> FromRequestParts<S> for FeedQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(raw) = Query::<RawPropertyQuery>::try_from_uri(&parts.uri).map_err(|e| {
            AppError::Validation(Violations::single(
                "query",
                ViolationKind::Malformed {
                    reason: truncate_detail(&e.body_text(), MAX_ERROR_DETAIL),
                },
            ))
        })?;

        Ok(FeedQuery(PropertyQuery::from_raw(raw)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    async fn parts(uri: &str) -> Parts {
        let (parts, _) = Request::get(uri).body(Body::empty()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_json_body_ignores_content_type() {
        let req = Request::post("/api/leads")
            .body(Body::from(r#"{"name":"Jane Doe"}"#))
            .unwrap();
        let JsonBody(value) = JsonBody::from_request(req, &()).await.unwrap();
        assert_eq!(value["name"], "Jane Doe");
    }

    #[tokio::test]
    async fn test_json_body_syntax_error_is_unprocessable() {
        let req = Request::post("/api/leads")
            .body(Body::from("{not json"))
            .unwrap();
        let response = JsonBody::from_request(req, &()).await.unwrap_err();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_feed_query_parses_filters() {
        let mut parts = parts("/api/properties?city=Austin&limit=-3").await;
        let FeedQuery(query) = FeedQuery::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(query.city.as_deref(), Some("Austin"));
        assert_eq!(query.row_limit(), 3);
    }

    #[tokio::test]
    async fn test_feed_query_bad_limit_names_the_field() {
        let mut parts = parts("/api/properties?limit=abc").await;
        let err = FeedQuery::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        match err {
            AppError::Validation(violations) => assert_eq!(violations.fields(), vec!["limit"]),
            other => panic!("unexpected error: {}", other),
        }
    }
}
