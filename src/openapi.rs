use crate::handlers;
use crate::models::{CreatedResponse, DiagnosticReport, Lead, Property, SavedSearch};
use crate::errors::ValidationErrorBody;
use crate::validation::ViolationDetail;
use axum::{response::Html, Json};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Proplift Next - Real Estate Investing API",
        description = "Deal feed, saved searches and inbound leads."
    ),
    paths(
        handlers::root,
        handlers::test_database,
        handlers::list_properties,
        handlers::create_property,
        handlers::create_saved_search,
        handlers::create_lead,
    ),
    components(schemas(
        Property,
        SavedSearch,
        Lead,
        CreatedResponse,
        DiagnosticReport,
        ViolationDetail,
        ValidationErrorBody,
    ))
)]
pub struct ApiDoc;

/// Serves the generated OpenAPI document.
pub async fn serve_openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Route of the generated OpenAPI document.
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

const SWAGGER_UI_DIST: &str = "https://unpkg.com/swagger-ui-dist@5";

fn swagger_ui_page(spec_url: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>{title}</title>
<link rel="stylesheet" href="{dist}/swagger-ui.css">
</head>
<body>
<div id="swagger-ui"></div>
<script src="{dist}/swagger-ui-bundle.js"></script>
<script>SwaggerUIBundle({{ url: "{spec_url}", dom_id: "#swagger-ui" }});</script>
</body>
</html>
"##,
        title = ApiDoc::openapi().info.title,
        dist = SWAGGER_UI_DIST,
        spec_url = spec_url,
    )
}

/// Serves a Swagger UI page pointed at [`OPENAPI_JSON_PATH`].
pub async fn serve_swagger_ui() -> Html<String> {
    Html(swagger_ui_page(OPENAPI_JSON_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_endpoint() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = doc["paths"].as_object().unwrap();
        for path in ["/", "/test", "/api/properties", "/api/savedsearches", "/api/leads"] {
            assert!(paths.contains_key(path), "missing {}", path);
        }
        assert!(paths["/api/properties"].get("get").is_some());
        assert!(paths["/api/properties"].get("post").is_some());
    }

    #[test]
    fn test_unprocessable_response_is_wrapped_in_detail() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let schema = &doc["components"]["schemas"]["ValidationErrorBody"];
        assert_eq!(schema["properties"]["detail"]["type"], "array");

        let reference = &doc["paths"]["/api/leads"]["post"]["responses"]["422"]["content"]
            ["application/json"]["schema"]["$ref"];
        assert_eq!(reference, "#/components/schemas/ValidationErrorBody");
    }

    #[test]
    fn test_swagger_page_points_at_document() {
        let page = swagger_ui_page(OPENAPI_JSON_PATH);
        assert!(page.contains(r#"url: "/api-docs/openapi.json""#));
        assert!(page.contains("<title>Proplift Next - Real Estate Investing API</title>"));
    }
}
