// Object tools: bounded dumps, property queries and geometry extraction

use crate::protocol::{CallToolResult, ToolSchema};
use crate::service::SpeckleService;
use crate::tools::{
    json_schema_boolean, json_schema_enum, json_schema_integer, json_schema_object,
    json_schema_string, Tool,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;

/// Tool to dump the object tree a version points at
pub struct GetVersionObjectsTool {
    service: Arc<SpeckleService>,
}

impl GetVersionObjectsTool {
    pub fn new(service: Arc<SpeckleService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
struct GetVersionObjectsArgs {
    project_id: String,
    version_id: String,
    #[serde(default)]
    include_children: bool,
}

#[async_trait::async_trait]
impl Tool for GetVersionObjectsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_version_objects".to_string(),
            description: "Get objects from a specific version in a project. Nested objects below the depth limit are replaced by references unless include_children is set.".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "project_id": json_schema_string("The ID of the Speckle project"),
                    "version_id": json_schema_string("The ID of the version to retrieve objects from"),
                    "include_children": json_schema_boolean(
                        "Whether to include children objects in the response",
                        false,
                    )
                }),
                vec!["project_id", "version_id"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: GetVersionObjectsArgs = serde_json::from_value(arguments)
            .context("Invalid arguments for get_version_objects")?;

        let text = self
            .service
            .get_version_objects(&args.project_id, &args.version_id, args.include_children)
            .await?;
        Ok(CallToolResult::text(text))
    }
}

/// Tool to read a single value by dot path
pub struct QueryObjectPropertiesTool {
    service: Arc<SpeckleService>,
}

impl QueryObjectPropertiesTool {
    pub fn new(service: Arc<SpeckleService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
struct QueryObjectPropertiesArgs {
    project_id: String,
    version_id: String,
    property_path: String,
}

#[async_trait::async_trait]
impl Tool for QueryObjectPropertiesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "query_object_properties".to_string(),
            description: "Query specific properties from objects in a version.".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "project_id": json_schema_string("The ID of the Speckle project"),
                    "version_id": json_schema_string("The ID of the version to retrieve objects from"),
                    "property_path": json_schema_string("The dot-notation path to the property (e.g., \"elements.0.name\")")
                }),
                vec!["project_id", "version_id", "property_path"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: QueryObjectPropertiesArgs = serde_json::from_value(arguments)
            .context("Invalid arguments for query_object_properties")?;

        let text = self
            .service
            .query_object_properties(&args.project_id, &args.version_id, &args.property_path)
            .await?;
        Ok(CallToolResult::text(text))
    }
}

/// Tool to collect meshes, points, lines and curves from a version
pub struct ExtractGeometryDataTool {
    service: Arc<SpeckleService>,
}

impl ExtractGeometryDataTool {
    pub fn new(service: Arc<SpeckleService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
struct ExtractGeometryDataArgs {
    project_id: String,
    version_id: String,
    #[serde(default = "default_geometry_type")]
    geometry_type: String,
    max_depth: Option<usize>,
}

fn default_geometry_type() -> String {
    "all".to_string()
}

#[async_trait::async_trait]
impl Tool for ExtractGeometryDataTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "extract_geometry_data".to_string(),
            description: "Extract geometry (meshes, points, lines, curves) from the objects of a version.".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "project_id": json_schema_string("The ID of the Speckle project"),
                    "version_id": json_schema_string("The ID of the version to extract geometry from"),
                    "geometry_type": json_schema_enum(
                        "Kind of geometry to extract",
                        &["all", "mesh", "point", "line", "curve"],
                        "all",
                    ),
                    "max_depth": json_schema_integer(
                        "Maximum object nesting depth to search",
                        self.service.limits().geometry.max_depth as u64,
                    )
                }),
                vec!["project_id", "version_id"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: ExtractGeometryDataArgs = serde_json::from_value(arguments)
            .context("Invalid arguments for extract_geometry_data")?;

        let text = self
            .service
            .extract_geometry_data(
                &args.project_id,
                &args.version_id,
                &args.geometry_type,
                args.max_depth,
            )
            .await?;
        Ok(CallToolResult::text(text))
    }
}
