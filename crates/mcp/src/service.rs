// Object access facade: fetches through the shared session and renders tool output

use crate::config::{ConfigError, LimitsConfig, Settings};
use anyhow::{Context, Result};
use serde_json::{json, Map, Value as JsonValue};
use speckle_core::{extract_geometry, normalize, serialize, GeometryKind, ObjectGraph};
use speckle_sdk::{Project, SessionManager, Version, VersionCollection};
use std::sync::Arc;
use tracing::{info, warn};

const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// Everything the tools do against a Speckle server.
///
/// Not-found outcomes and path errors are part of the returned text. Only
/// transport and decoding failures come back as `Err`.
pub struct SpeckleService {
    sessions: SessionManager,
    limits: LimitsConfig,
}

impl SpeckleService {
    pub fn new(sessions: SessionManager, limits: LimitsConfig) -> Self {
        Self { sessions, limits }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let connector = settings.connector()?;
        Ok(Self::new(
            SessionManager::new(Arc::new(connector)),
            settings.limits,
        ))
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    pub async fn list_projects(&self, limit: Option<u32>, cursor: Option<&str>) -> Result<String> {
        let limit = limit.unwrap_or(self.limits.default_list_limit);
        info!(limit, "Retrieving user projects");

        let page = self
            .sessions
            .run(|api| async move { api.active_user_projects(limit, cursor, None).await })
            .await?;

        if page.items.is_empty() {
            info!("No projects found for the configured Speckle account");
            return Ok("No projects found for the configured Speckle account.".to_string());
        }

        info!(count = page.items.len(), "Found projects");
        let blocks: Vec<String> = page.items.iter().map(project_block).collect();
        let mut text = format!(
            "Found {} projects:\n\n{}",
            blocks.len(),
            blocks.join(BLOCK_SEPARATOR)
        );
        push_next_cursor(&mut text, page.cursor.as_deref(), page.items.len(), limit);
        Ok(text)
    }

    pub async fn get_project_details(&self, project_id: &str, limit: Option<u32>) -> Result<String> {
        let limit = limit.unwrap_or(self.limits.default_list_limit);
        info!(project_id, "Retrieving project details");

        let Some(project) = self
            .sessions
            .run(|api| async move { api.project(project_id).await })
            .await?
        else {
            warn!(project_id, "No project found");
            return Ok(format!("No project found with ID: {}", project_id));
        };

        info!(project_id, limit, "Retrieving project models");
        let models = self
            .sessions
            .run(|api| async move { api.project_with_models(project_id, limit).await })
            .await?
            .and_then(|p| p.models);

        info!(project_id, "Retrieving project team");
        let team_count = self
            .sessions
            .run(|api| async move { api.project_with_team(project_id).await })
            .await?
            .map(|p| p.team.len())
            .unwrap_or(0);

        let models_count = models.as_ref().map(|m| m.total_count).unwrap_or(0);

        let mut lines = vec![
            format!("Project: {}", project.name),
            format!("ID: {}", project.id),
        ];
        if let Some(description) = non_empty(&project.description) {
            lines.push(format!("Description: {}", description));
        }
        lines.extend([
            format!("Visibility: {}", project.visibility),
            format!("Created: {}", project.created_at.format("%Y-%m-%d")),
            format!("Last Updated: {}", project.updated_at.format("%Y-%m-%d")),
            format!("Models: {}", models_count),
            format!("Team Members: {}", team_count),
        ]);
        if !project.source_apps.is_empty() {
            lines.push(format!("Source Applications: {}", project.source_apps.join(", ")));
        }

        if let Some(models) = models.filter(|m| m.total_count > 0) {
            lines.push("\nModels:".to_string());
            for model in &models.items {
                lines.push(format!("- {} (ID: {})", model.name, model.id));
            }
        }

        Ok(lines.join("\n"))
    }

    pub async fn search_projects(&self, query: &str, cursor: Option<&str>) -> Result<String> {
        let limit = self.limits.default_list_limit;
        info!(query, "Searching projects");

        let page = self
            .sessions
            .run(|api| async move { api.active_user_projects(limit, cursor, Some(query)).await })
            .await?;

        if page.items.is_empty() {
            info!(query, "No projects matched the search term");
            return Ok(format!(
                "No projects found matching the search term: '{}'",
                query
            ));
        }

        let blocks: Vec<String> = page
            .items
            .iter()
            .map(|project| {
                let mut lines = vec![
                    format!("ID: {}", project.id),
                    format!("Name: {}", project.name),
                ];
                if let Some(description) = non_empty(&project.description) {
                    lines.push(format!("Description: {}", description));
                }
                lines.push(format!("Visibility: {}", project.visibility));
                lines.join("\n")
            })
            .collect();

        let mut text = format!(
            "Found {} projects matching '{}':\n\n{}",
            blocks.len(),
            query,
            blocks.join(BLOCK_SEPARATOR)
        );
        push_next_cursor(&mut text, page.cursor.as_deref(), page.items.len(), limit);
        Ok(text)
    }

    pub async fn get_model_versions(
        &self,
        project_id: &str,
        model_id: &str,
        limit: Option<u32>,
        cursor: Option<&str>,
    ) -> Result<String> {
        let limit = limit.unwrap_or(self.limits.default_list_limit);
        info!(project_id, model_id, limit, "Retrieving model versions");

        let page = self
            .sessions
            .run(|api| async move { api.model_versions(project_id, model_id, limit, cursor).await })
            .await?
            .filter(|page| !page.items.is_empty());

        let Some(VersionCollection { items, cursor: next, .. }) = page else {
            info!(project_id, model_id, "No versions found");
            return Ok(format!(
                "No versions found for model {} in project {}.",
                model_id, project_id
            ));
        };

        let blocks: Vec<String> = items.iter().map(version_block).collect();
        let mut text = format!(
            "Found {} versions for model {}:\n\n{}",
            blocks.len(),
            model_id,
            blocks.join(BLOCK_SEPARATOR)
        );
        push_next_cursor(&mut text, next.as_deref(), items.len(), limit);
        Ok(text)
    }

    pub async fn get_version_objects(
        &self,
        project_id: &str,
        version_id: &str,
        include_children: bool,
    ) -> Result<String> {
        let Some((version, graph)) = self.receive_version(project_id, version_id).await? else {
            return Ok(version_not_found(project_id, version_id));
        };

        info!(include_children, "Serializing object graph");
        let data = serialize(&graph, graph.root(), self.limits.serializer, include_children);

        let result = json!({
            "version_id": version_id,
            "object_id": version.referenced_object,
            "created_at": version.created_at.to_rfc3339(),
            "data": data,
        });
        Ok(serde_json::to_string_pretty(&result)?)
    }

    pub async fn query_object_properties(
        &self,
        project_id: &str,
        version_id: &str,
        property_path: &str,
    ) -> Result<String> {
        let Some((_, graph)) = self.receive_version(project_id, version_id).await? else {
            return Ok(version_not_found(project_id, version_id));
        };

        info!(property_path, "Querying property path");
        let value = match graph.resolve(property_path) {
            Ok(value) => normalize(&graph, value),
            Err(e) => {
                warn!(error = %e, "Error navigating property path");
                return Ok(format!("Error: {}", e));
            }
        };

        let result = json!({
            "property_path": property_path,
            "value": value,
        });
        Ok(serde_json::to_string_pretty(&result)?)
    }

    pub async fn extract_geometry_data(
        &self,
        project_id: &str,
        version_id: &str,
        geometry_type: &str,
        max_depth: Option<usize>,
    ) -> Result<String> {
        let kind: GeometryKind = match geometry_type.parse() {
            Ok(kind) => kind,
            Err(e) => return Ok(format!("Error: {}", e)),
        };

        let Some((version, graph)) = self.receive_version(project_id, version_id).await? else {
            return Ok(version_not_found(project_id, version_id));
        };

        let mut config = self.limits.geometry;
        if let Some(max_depth) = max_depth {
            config.max_depth = max_depth;
        }

        info!(geometry_type = %kind, max_depth = config.max_depth, "Extracting geometry");
        let extraction = extract_geometry(&graph, kind, config);
        info!(
            total_found = extraction.total_found,
            returned = extraction.returned,
            "Geometry extraction finished"
        );

        let mut result = Map::new();
        result.insert("version_id".to_string(), json!(version_id));
        result.insert("object_id".to_string(), json!(version.referenced_object));
        if let JsonValue::Object(fields) = serde_json::to_value(&extraction)? {
            result.extend(fields);
        }
        Ok(serde_json::to_string_pretty(&JsonValue::Object(result))?)
    }

    /// Look up a version and receive the object it references.
    async fn receive_version(
        &self,
        project_id: &str,
        version_id: &str,
    ) -> Result<Option<(Version, ObjectGraph)>> {
        info!(project_id, version_id, "Retrieving version");
        let Some(version) = self
            .sessions
            .run(|api| async move { api.version(project_id, version_id).await })
            .await?
        else {
            warn!(project_id, version_id, "Version not found");
            return Ok(None);
        };

        let object_id = version.referenced_object.as_str();
        info!(object_id, "Receiving object");
        let graph = self
            .sessions
            .run(|api| async move { api.receive_object(project_id, object_id).await })
            .await
            .with_context(|| format!("Failed to receive object {}", object_id))?;

        Ok(Some((version, graph)))
    }
}

fn project_block(project: &Project) -> String {
    let mut lines = vec![
        format!("ID: {}", project.id),
        format!("Name: {}", project.name),
    ];
    if let Some(description) = non_empty(&project.description) {
        lines.push(format!("Description: {}", description));
    }
    lines.extend([
        format!("Visibility: {}", project.visibility),
        format!("Created: {}", project.created_at.format("%Y-%m-%d")),
        format!("Last Updated: {}", project.updated_at.format("%Y-%m-%d")),
    ]);
    lines.join("\n")
}

fn version_block(version: &Version) -> String {
    let mut lines = vec![
        format!("Version ID: {}", version.id),
        format!(
            "Message: {}",
            non_empty(&version.message).unwrap_or("No message")
        ),
        format!(
            "Source Application: {}",
            non_empty(&version.source_application).unwrap_or("Unknown")
        ),
        format!("Created: {}", version.created_at.format("%Y-%m-%d %H:%M:%S")),
        format!("Referenced Object ID: {}", version.referenced_object),
    ];
    if let Some(author) = &version.author_user {
        lines.push(format!("Author: {} ({})", author.name, author.id));
    }
    lines.join("\n")
}

fn version_not_found(project_id: &str, version_id: &str) -> String {
    format!("Version {} not found in project {}.", version_id, project_id)
}

/// A full page with a cursor means the caller can ask for more.
fn push_next_cursor(text: &mut String, cursor: Option<&str>, returned: usize, limit: u32) {
    if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
        if returned >= limit as usize {
            text.push_str(&format!("\n\nNext cursor: {}", cursor));
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
