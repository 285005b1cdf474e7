// Project tools: listing, details and search

use crate::protocol::{CallToolResult, ToolSchema};
use crate::service::SpeckleService;
use crate::tools::{json_schema_integer, json_schema_object, json_schema_string, Tool};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;

/// Tool to list the projects of the authenticated user
pub struct ListProjectsTool {
    service: Arc<SpeckleService>,
}

impl ListProjectsTool {
    pub fn new(service: Arc<SpeckleService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListProjectsArgs {
    limit: Option<u32>,
    cursor: Option<String>,
}

#[async_trait::async_trait]
impl Tool for ListProjectsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_projects".to_string(),
            description: "List all projects accessible with the configured Speckle token.".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "limit": json_schema_integer(
                        "Maximum number of projects to retrieve",
                        self.service.limits().default_list_limit as u64,
                    ),
                    "cursor": json_schema_string("Cursor of the next page, as returned by a previous call")
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: ListProjectsArgs = parse_optional(arguments)
            .context("Invalid arguments for list_projects")?;

        let text = self
            .service
            .list_projects(args.limit, args.cursor.as_deref())
            .await?;
        Ok(CallToolResult::text(text))
    }
}

/// Tool to show one project with its models and team size
pub struct GetProjectDetailsTool {
    service: Arc<SpeckleService>,
}

impl GetProjectDetailsTool {
    pub fn new(service: Arc<SpeckleService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
struct GetProjectDetailsArgs {
    project_id: String,
    limit: Option<u32>,
}

#[async_trait::async_trait]
impl Tool for GetProjectDetailsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_project_details".to_string(),
            description: "Get detailed information about a specific Speckle project.".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "project_id": json_schema_string("The ID of the Speckle project to retrieve"),
                    "limit": json_schema_integer(
                        "Maximum number of models to retrieve",
                        self.service.limits().default_list_limit as u64,
                    )
                }),
                vec!["project_id"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: GetProjectDetailsArgs = serde_json::from_value(arguments)
            .context("Invalid arguments for get_project_details")?;

        let text = self
            .service
            .get_project_details(&args.project_id, args.limit)
            .await?;
        Ok(CallToolResult::text(text))
    }
}

/// Tool to search the user's projects by name or description
pub struct SearchProjectsTool {
    service: Arc<SpeckleService>,
}

impl SearchProjectsTool {
    pub fn new(service: Arc<SpeckleService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
struct SearchProjectsArgs {
    query: String,
    cursor: Option<String>,
}

#[async_trait::async_trait]
impl Tool for SearchProjectsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_projects".to_string(),
            description: "Search for Speckle projects by name or description.".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "query": json_schema_string("The search term to look for in project names and descriptions"),
                    "cursor": json_schema_string("Cursor of the next page, as returned by a previous call")
                }),
                vec!["query"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: SearchProjectsArgs = serde_json::from_value(arguments)
            .context("Invalid arguments for search_projects")?;

        let text = self
            .service
            .search_projects(&args.query, args.cursor.as_deref())
            .await?;
        Ok(CallToolResult::text(text))
    }
}

/// Tools without required arguments may be called with `null` arguments.
pub(crate) fn parse_optional<T>(arguments: serde_json::Value) -> serde_json::Result<T>
where
    T: Default + serde::de::DeserializeOwned,
{
    if arguments.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(arguments)
}
