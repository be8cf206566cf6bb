use crate::handlers::{self, AppState};
use crate::openapi;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Builds the full application router around an already-constructed state.
pub fn router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route(
            "/api/properties",
            get(handlers::list_properties).post(handlers::create_property),
        )
        .route("/api/savedsearches", post(handlers::create_saved_search))
        .route("/api/leads", post(handlers::create_lead))
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)));

    Router::new()
        .route("/", get(handlers::root))
        .route("/test", get(handlers::test_database))
        // API Documentation
        .route("/docs", get(openapi::serve_swagger_ui))
        .route(openapi::OPENAPI_JSON_PATH, get(openapi::serve_openapi_spec))
        .merge(api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // Any origin, method and header; credentials allowed
        .layer(CorsLayer::very_permissive())
}
