// Version history tool

use crate::protocol::{CallToolResult, ToolSchema};
use crate::service::SpeckleService;
use crate::tools::{json_schema_integer, json_schema_object, json_schema_string, Tool};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;

/// Tool to list the versions committed to a model
pub struct GetModelVersionsTool {
    service: Arc<SpeckleService>,
}

impl GetModelVersionsTool {
    pub fn new(service: Arc<SpeckleService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
struct GetModelVersionsArgs {
    project_id: String,
    model_id: String,
    limit: Option<u32>,
    cursor: Option<String>,
}

#[async_trait::async_trait]
impl Tool for GetModelVersionsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_model_versions".to_string(),
            description: "Get all versions for a specific model in a project.".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "project_id": json_schema_string("The ID of the Speckle project"),
                    "model_id": json_schema_string("The ID of the model to retrieve versions for"),
                    "limit": json_schema_integer(
                        "Maximum number of versions to retrieve",
                        self.service.limits().default_list_limit as u64,
                    ),
                    "cursor": json_schema_string("Cursor of the next page, as returned by a previous call")
                }),
                vec!["project_id", "model_id"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: GetModelVersionsArgs = serde_json::from_value(arguments)
            .context("Invalid arguments for get_model_versions")?;

        let text = self
            .service
            .get_model_versions(
                &args.project_id,
                &args.model_id,
                args.limit,
                args.cursor.as_deref(),
            )
            .await?;
        Ok(CallToolResult::text(text))
    }
}
