use axum::{
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

const OPENAPI_DOCUMENT: &str = include_str!("openapi.yaml");

/// OpenAPI document for the tool routes
pub async fn openapi_document() -> Response {
    (
        [(header::CONTENT_TYPE, "text/yaml; charset=utf-8")],
        OPENAPI_DOCUMENT,
    )
        .into_response()
}

/// Plugin manifest pointing at [`openapi_document`] on the requested host
pub async fn plugin_manifest(headers: HeaderMap) -> Response {
    let url = match headers.get(header::HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("http://{}/openapi.yaml", host),
        None => "/openapi.yaml".to_string(),
    };

    Json(json!({
        "schema_version": "v1",
        "name_for_human": "Speckle",
        "name_for_model": "speckle",
        "description_for_human": "Browse Speckle projects, models and versions.",
        "description_for_model": "Access Speckle projects, list model versions, dump the objects of a version, query object properties by dot path and extract geometry.",
        "auth": {"type": "none"},
        "api": {"type": "openapi", "url": url},
    }))
    .into_response()
}
