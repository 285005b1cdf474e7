use crate::config::AppState;
use anyhow::Result;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use speckle_mcp::protocol::CallToolResult;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

mod handlers;
mod plugin;

/// Start the HTTP mirror
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the API router
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/openapi.yaml", get(plugin::openapi_document))
        .route("/.well-known/ai-plugin.json", get(plugin::plugin_manifest))
        .route("/projects", get(handlers::list_projects))
        .route("/projects/search", get(handlers::search_projects))
        .route("/projects/{project_id}", get(handlers::get_project_details))
        .route(
            "/projects/{project_id}/models/{model_id}/versions",
            get(handlers::get_model_versions),
        )
        .route(
            "/projects/{project_id}/versions/{version_id}/objects",
            get(handlers::get_version_objects),
        )
        .route(
            "/projects/{project_id}/versions/{version_id}/query",
            get(handlers::query_object_properties),
        )
        .route(
            "/projects/{project_id}/versions/{version_id}/geometry",
            get(handlers::extract_geometry_data),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "speckle-http",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Answer with the tool's text: parsed JSON when it is JSON, plain text otherwise.
/// Failed tool runs keep their text but answer 500.
fn tool_response(result: CallToolResult) -> Response {
    let status = if result.is_error == Some(true) {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };

    let text = result.joined_text();
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(json) if json.is_object() || json.is_array() => (status, Json(json)).into_response(),
        _ => (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            text,
        )
            .into_response(),
    }
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Custom error type for API handlers
pub struct ApiError(anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_msg = self.0.to_string();
        let details = self
            .0
            .chain()
            .skip(1)
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(": ");

        let response = if details.is_empty() {
            ErrorResponse::new(error_msg)
        } else {
            ErrorResponse::with_details(error_msg, details)
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value as JsonValue};
    use speckle_mcp::protocol::ToolSchema;
    use speckle_mcp::tools::{json_schema_object, Tool};
    use speckle_mcp::ToolRegistry;
    use tower::ServiceExt;

    /// Answers with its own name and the arguments it received
    struct EchoTool(&'static str);

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: self.0.to_string(),
                description: String::new(),
                input_schema: json_schema_object(json!({}), vec![]),
            }
        }

        async fn execute(&self, arguments: JsonValue) -> anyhow::Result<CallToolResult> {
            if arguments.get("project_id") == Some(&json!("missing")) {
                return Ok(CallToolResult::text("No project found with ID: missing"));
            }
            if arguments.get("version_id") == Some(&json!("broken")) {
                bail!("connection reset");
            }
            Ok(CallToolResult::text(
                json!({"tool": self.0, "args": arguments}).to_string(),
            ))
        }
    }

    fn app() -> Router {
        let mut tools = ToolRegistry::new();
        for name in [
            "list_projects",
            "get_project_details",
            "search_projects",
            "get_model_versions",
            "get_version_objects",
            "query_object_properties",
            "extract_geometry_data",
        ] {
            tools.register(Arc::new(EchoTool(name)));
        }
        create_router(AppState::with_tools(tools))
    }

    async fn get(uri: &str) -> (StatusCode, String, String) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn get_json(uri: &str) -> JsonValue {
        let (status, content_type, body) = get(uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/json");
        serde_json::from_str(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let json = get_json("/api/health").await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_list_projects_forwards_query() {
        let json = get_json("/projects?limit=5&cursor=abc").await;
        assert_eq!(json["tool"], "list_projects");
        assert_eq!(json["args"], json!({"limit": 5, "cursor": "abc"}));

        let json = get_json("/projects").await;
        assert_eq!(json["args"], json!({}));
    }

    #[tokio::test]
    async fn test_search_route_wins_over_project_id() {
        let json = get_json("/projects/search?query=tower").await;
        assert_eq!(json["tool"], "search_projects");
        assert_eq!(json["args"], json!({"query": "tower"}));

        let json = get_json("/projects/p1?limit=3").await;
        assert_eq!(json["tool"], "get_project_details");
        assert_eq!(json["args"], json!({"project_id": "p1", "limit": 3}));
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let (status, _, _) = get("/projects/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_version_routes_map_path_parameters() {
        let json = get_json("/projects/p1/models/m1/versions").await;
        assert_eq!(json["args"], json!({"project_id": "p1", "model_id": "m1"}));

        let json = get_json("/projects/p1/versions/v1/objects?include_children=true").await;
        assert_eq!(
            json["args"],
            json!({"project_id": "p1", "version_id": "v1", "include_children": true})
        );

        let json = get_json("/projects/p1/versions/v1/query?property_path=elements.0.name").await;
        assert_eq!(json["args"]["property_path"], "elements.0.name");

        let json = get_json("/projects/p1/versions/v1/geometry?geometry_type=mesh&max_depth=4").await;
        assert_eq!(
            json["args"],
            json!({"project_id": "p1", "version_id": "v1", "geometry_type": "mesh", "max_depth": 4})
        );
    }

    #[tokio::test]
    async fn test_plain_text_results() {
        let (status, content_type, body) = get("/projects/missing").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.starts_with("text/plain"));
        assert_eq!(body, "No project found with ID: missing");
    }

    #[tokio::test]
    async fn test_tool_failures_answer_500() {
        let (status, content_type, body) = get("/projects/p1/versions/broken/objects").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(content_type.starts_with("text/plain"));
        assert!(body.starts_with("Error: connection reset"));
    }

    #[tokio::test]
    async fn test_openapi_document_covers_tool_routes() {
        let (status, content_type, body) = get("/openapi.yaml").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.starts_with("text/yaml"));
        for operation in [
            "list_projects",
            "get_project_details",
            "search_projects",
            "get_model_versions",
            "get_version_objects",
            "query_object_properties",
            "extract_geometry_data",
        ] {
            assert!(
                body.contains(&format!("operationId: {}", operation)),
                "missing {}",
                operation
            );
        }
    }

    #[tokio::test]
    async fn test_plugin_manifest_points_at_requested_host() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/.well-known/ai-plugin.json")
                    .header(header::HOST, "localhost:8000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: JsonValue = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["schema_version"], "v1");
        assert_eq!(json["auth"]["type"], "none");
        assert_eq!(
            json["api"],
            json!({"type": "openapi", "url": "http://localhost:8000/openapi.yaml"})
        );

        let json = get_json("/.well-known/ai-plugin.json").await;
        assert_eq!(json["api"]["url"], "/openapi.yaml");
    }
}
