use super::{tool_response, ApiResult};
use crate::config::AppState;
use anyhow::anyhow;
use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;

/// Run a registered tool with `arguments`.
async fn call(state: &AppState, name: &str, arguments: JsonValue) -> ApiResult<Response> {
    let result = state
        .tools
        .call(name, arguments)
        .await
        .ok_or_else(|| anyhow!("Tool {} is not registered", name))?;
    Ok(tool_response(result))
}

/// Tool arguments from path parameters plus the set query parameters
fn arguments(path: &[(&str, String)], query: &impl Serialize) -> ApiResult<JsonValue> {
    let mut args = Map::new();
    for (name, value) in path {
        args.insert(name.to_string(), JsonValue::String(value.clone()));
    }
    if let JsonValue::Object(fields) = serde_json::to_value(query)? {
        args.extend(fields);
    }
    Ok(JsonValue::Object(args))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LimitQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ObjectsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_children: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PropertyQuery {
    pub property_path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeometryQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

/// List the user's projects
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Response> {
    call(&state, "list_projects", arguments(&[], &query)?).await
}

/// Search the user's projects
pub async fn search_projects(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Response> {
    call(&state, "search_projects", arguments(&[], &query)?).await
}

/// Get one project with its models
pub async fn get_project_details(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Response> {
    let args = arguments(&[("project_id", project_id)], &query)?;
    call(&state, "get_project_details", args).await
}

/// List the versions of a model
pub async fn get_model_versions(
    State(state): State<Arc<AppState>>,
    Path((project_id, model_id)): Path<(String, String)>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Response> {
    let args = arguments(&[("project_id", project_id), ("model_id", model_id)], &query)?;
    call(&state, "get_model_versions", args).await
}

/// Dump the objects of a version
pub async fn get_version_objects(
    State(state): State<Arc<AppState>>,
    Path((project_id, version_id)): Path<(String, String)>,
    Query(query): Query<ObjectsQuery>,
) -> ApiResult<Response> {
    let args = arguments(&[("project_id", project_id), ("version_id", version_id)], &query)?;
    call(&state, "get_version_objects", args).await
}

/// Read one property of a version's root object
pub async fn query_object_properties(
    State(state): State<Arc<AppState>>,
    Path((project_id, version_id)): Path<(String, String)>,
    Query(query): Query<PropertyQuery>,
) -> ApiResult<Response> {
    let args = arguments(&[("project_id", project_id), ("version_id", version_id)], &query)?;
    call(&state, "query_object_properties", args).await
}

/// Extract geometry from a version
pub async fn extract_geometry_data(
    State(state): State<Arc<AppState>>,
    Path((project_id, version_id)): Path<(String, String)>,
    Query(query): Query<GeometryQuery>,
) -> ApiResult<Response> {
    let args = arguments(&[("project_id", project_id), ("version_id", version_id)], &query)?;
    call(&state, "extract_geometry_data", args).await
}
