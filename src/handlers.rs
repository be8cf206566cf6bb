use crate::config::DatabaseConfig;
use crate::db::{DocumentStore, Filter, StoreError};
use crate::errors::{truncate_detail, AppError, ValidationErrorBody, MAX_ERROR_DETAIL};
use crate::extract::{FeedQuery, JsonBody};
use crate::models::*;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// Most collection names reported by the diagnostic endpoint.
pub const MAX_DIAGNOSTIC_COLLECTIONS: usize = 10;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Document store, connected (or degraded) once at startup.
    pub store: Arc<dyn DocumentStore>,
    /// Database settings, reported by the diagnostic endpoint.
    pub database: DatabaseConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, database: DatabaseConfig) -> Self {
        Self { store, database }
    }
}

/// GET /
///
/// Static liveness marker.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "API is running"))
)]
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Real Estate Investing API is running" }))
}

/// GET /test
///
/// Checks the document store and reports its state as presentational
/// strings. Never fails: every error ends up in the `database` field.
#[utoipa::path(
    get,
    path = "/test",
    responses((status = 200, description = "Backend and database diagnostics", body = DiagnosticReport))
)]
pub async fn test_database(State(state): State<Arc<AppState>>) -> Json<DiagnosticReport> {
    Json(diagnose(&state).await)
}

async fn diagnose(state: &AppState) -> DiagnosticReport {
    let set_or_not = |value: &Option<String>| {
        if value.is_some() {
            "✅ Set"
        } else {
            "❌ Not Set"
        }
    };

    let mut report = DiagnosticReport {
        backend: "✅ Running".to_string(),
        database: "❌ Not Available".to_string(),
        database_url: "❌ Not Set".to_string(),
        database_name: "❌ Not Set".to_string(),
        connection_status: "Not Connected".to_string(),
        collections: Vec::new(),
    };

    if !state.store.is_available() {
        report.database = "⚠️  Available but not initialized".to_string();
        return report;
    }

    report.database = "✅ Available".to_string();
    report.database_url = set_or_not(&state.database.url).to_string();
    report.database_name = set_or_not(&state.database.name).to_string();

    match state.store.list_collections().await {
        Ok(mut collections) => {
            collections.truncate(MAX_DIAGNOSTIC_COLLECTIONS);
            report.collections = collections;
            report.database = "✅ Connected & Working".to_string();
            report.connection_status = "Connected".to_string();
        }
        Err(e) => {
            tracing::warn!("Diagnostic collections query failed: {}", e);
            report.database = format!(
                "⚠️  Connected but Error: {}",
                truncate_detail(&e.to_string(), MAX_ERROR_DETAIL)
            );
        }
    }

    report
}

/// GET /api/properties
///
/// Deal feed. Any store or validation failure yields an empty list so the
/// feed keeps rendering while storage is degraded. Only a `limit` that is not
/// an integer is rejected.
#[utoipa::path(
    get,
    path = "/api/properties",
    params(PropertyQuery),
    responses(
        (status = 200, description = "Listings, possibly empty", body = [Property]),
        (status = 422, description = "Malformed query string", body = ValidationErrorBody)
    )
)]
pub async fn list_properties(
    State(state): State<Arc<AppState>>,
    FeedQuery(params): FeedQuery,
) -> Json<Vec<Property>> {
    tracing::debug!("GET /api/properties - params: {:?}", params);

    match fetch_properties(state.store.as_ref(), &params).await {
        Ok(properties) => Json(properties),
        Err(e) => {
            tracing::warn!("Property feed degraded to empty list: {}", e);
            Json(Vec::new())
        }
    }
}

/// Equality filter from the non-empty `city` and `state` parameters.
pub fn property_filter(params: &PropertyQuery) -> Filter {
    let mut filter = Filter::new();
    for (field, value) in [("city", &params.city), ("state", &params.state)] {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            filter.insert(field.to_string(), Value::String(value.to_string()));
        }
    }
    filter
}

async fn fetch_properties(
    store: &dyn DocumentStore,
    params: &PropertyQuery,
) -> Result<Vec<Property>, AppError> {
    let limit = params.row_limit();
    if limit == 0 {
        return Ok(Vec::new());
    }

    let filter = property_filter(params);
    let documents = store.find(Property::COLLECTION, &filter, limit).await?;

    documents
        .into_iter()
        .map(|document| validate_property(&Value::Object(document)).map_err(AppError::from))
        .collect()
}

/// Validates `body` as `T` and inserts it into `T`'s collection.
async fn create<T: Entity>(state: &AppState, body: &Value) -> Result<CreatedResponse, AppError> {
    let entity = T::validate(body)?;

    let document = match serde_json::to_value(&entity) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return Err(StoreError::Operation(
                "entity did not serialize to a document".to_string(),
            )
            .into())
        }
        Err(e) => return Err(StoreError::Operation(e.to_string()).into()),
    };

    let id = state.store.insert(T::COLLECTION, document).await?;
    tracing::info!("Inserted document {} into '{}'", id, T::COLLECTION);

    Ok(CreatedResponse::ok(id))
}

/// POST /api/properties
#[utoipa::path(
    post,
    path = "/api/properties",
    request_body = Property,
    responses(
        (status = 200, description = "Listing stored", body = CreatedResponse),
        (status = 422, description = "Validation failed", body = ValidationErrorBody),
        (status = 500, description = "Store error")
    )
)]
pub async fn create_property(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody,
) -> Result<Json<CreatedResponse>, AppError> {
    create::<Property>(&state, &body).await.map(Json)
}

/// POST /api/savedsearches
#[utoipa::path(
    post,
    path = "/api/savedsearches",
    request_body = SavedSearch,
    responses(
        (status = 200, description = "Saved search stored", body = CreatedResponse),
        (status = 422, description = "Validation failed", body = ValidationErrorBody),
        (status = 500, description = "Store error")
    )
)]
pub async fn create_saved_search(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody,
) -> Result<Json<CreatedResponse>, AppError> {
    create::<SavedSearch>(&state, &body).await.map(Json)
}

/// POST /api/leads
#[utoipa::path(
    post,
    path = "/api/leads",
    request_body = Lead,
    responses(
        (status = 200, description = "Lead stored", body = CreatedResponse),
        (status = 422, description = "Validation failed", body = ValidationErrorBody),
        (status = 500, description = "Store error")
    )
)]
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody,
) -> Result<Json<CreatedResponse>, AppError> {
    create::<Lead>(&state, &body).await.map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;

    fn state_with(store: MemoryStore, database: DatabaseConfig) -> AppState {
        AppState::new(Arc::new(store), database)
    }

    fn configured() -> DatabaseConfig {
        DatabaseConfig {
            url: Some("mongodb://localhost:27017".to_string()),
            name: Some("proplift".to_string()),
        }
    }

    #[test]
    fn test_property_filter_skips_empty_values() {
        let params = PropertyQuery {
            limit: 12,
            city: Some(String::new()),
            state: Some("TX".to_string()),
        };
        let filter = property_filter(&params);
        assert_eq!(filter.len(), 1);
        assert_eq!(filter["state"], "TX");
    }

    #[tokio::test]
    async fn test_diagnose_degraded_store() {
        let report = diagnose(&state_with(MemoryStore::unavailable(), configured())).await;
        assert_eq!(report.database, "⚠️  Available but not initialized");
        assert_eq!(report.database_url, "❌ Not Set");
        assert_eq!(report.connection_status, "Not Connected");
        assert!(report.collections.is_empty());
    }

    #[tokio::test]
    async fn test_diagnose_caps_collection_list() {
        let store = MemoryStore::new();
        for n in 0..15 {
            store.seed(&format!("c{:02}", n), json!({})).await;
        }
        let report = diagnose(&state_with(store, configured())).await;
        assert_eq!(report.database, "✅ Connected & Working");
        assert_eq!(report.database_url, "✅ Set");
        assert_eq!(report.database_name, "✅ Set");
        assert_eq!(report.collections.len(), MAX_DIAGNOSTIC_COLLECTIONS);
    }

    #[tokio::test]
    async fn test_diagnose_collections_error_is_truncated() {
        let report = diagnose(&state_with(
            MemoryStore::with_failing_collections(),
            configured(),
        ))
        .await;
        assert!(report.database.starts_with("⚠️  Connected but Error: "));
        assert_eq!(report.connection_status, "Not Connected");
        let detail = report.database.trim_start_matches("⚠️  Connected but Error: ");
        assert!(detail.chars().count() <= MAX_ERROR_DETAIL);
    }

    #[tokio::test]
    async fn test_fetch_properties_negative_limit_caps_rows() {
        let store = MemoryStore::new();
        for n in 0..5 {
            store
                .seed(
                    Property::COLLECTION,
                    json!({
                        "title": format!("Listing {}", n),
                        "address": "1 Main St",
                        "city": "Austin",
                        "state": "TX",
                        "zipcode": "78701",
                        "price": 100000,
                        "property_type": "SFR"
                    }),
                )
                .await;
        }
        let params = PropertyQuery {
            limit: -3,
            ..Default::default()
        };
        let properties = fetch_properties(&store, &params).await.unwrap();
        assert_eq!(properties.len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_properties_fails_on_invalid_stored_document() {
        let store = MemoryStore::new();
        store
            .seed(Property::COLLECTION, json!({"title": "half a listing"}))
            .await;
        let result = fetch_properties(&store, &PropertyQuery::default()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
