//! Projects API: project metadata, models and team.

use crate::api::null_as_default;
use crate::api::users::LimitedUser;
use crate::client::SpeckleClient;
use crate::error::{SpeckleError, SpeckleResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

const PROJECT_QUERY: &str = r#"
query Project($projectId: String!) {
  project(id: $projectId) {
    id name description visibility role createdAt updatedAt sourceApps
  }
}"#;

const PROJECT_WITH_MODELS_QUERY: &str = r#"
query ProjectWithModels($projectId: String!, $modelsLimit: Int!) {
  project(id: $projectId) {
    id name description visibility role createdAt updatedAt sourceApps
    models(limit: $modelsLimit) {
      totalCount
      cursor
      items { id name displayName description createdAt updatedAt }
    }
  }
}"#;

const PROJECT_WITH_TEAM_QUERY: &str = r#"
query ProjectWithTeam($projectId: String!) {
  project(id: $projectId) {
    id name description visibility role createdAt updatedAt sourceApps
    team { id role user { id name avatar } }
  }
}"#;

pub struct ProjectsApi<'a> {
    client: &'a SpeckleClient,
}

impl<'a> ProjectsApi<'a> {
    pub(crate) fn new(client: &'a SpeckleClient) -> Self {
        Self { client }
    }

    /// Fetch a project, `None` when it does not exist.
    pub async fn get(&self, project_id: &str) -> SpeckleResult<Option<Project>> {
        let data: ProjectData<Project> = match self
            .client
            .http
            .graphql(PROJECT_QUERY, json!({ "projectId": project_id }))
            .await
        {
            Err(SpeckleError::NotFound(_)) => return Ok(None),
            other => other?,
        };
        Ok(data.project)
    }

    /// Fetch a project together with its first `models_limit` models.
    pub async fn get_with_models(
        &self,
        project_id: &str,
        models_limit: u32,
    ) -> SpeckleResult<Option<ProjectWithModels>> {
        let data: ProjectData<ProjectWithModels> = match self
            .client
            .http
            .graphql(
                PROJECT_WITH_MODELS_QUERY,
                json!({ "projectId": project_id, "modelsLimit": models_limit }),
            )
            .await
        {
            Err(SpeckleError::NotFound(_)) => return Ok(None),
            other => other?,
        };
        Ok(data.project)
    }

    /// Fetch a project together with its collaborators.
    pub async fn get_with_team(&self, project_id: &str) -> SpeckleResult<Option<ProjectWithTeam>> {
        let data: ProjectData<ProjectWithTeam> = match self
            .client
            .http
            .graphql(PROJECT_WITH_TEAM_QUERY, json!({ "projectId": project_id }))
            .await
        {
            Err(SpeckleError::NotFound(_)) => return Ok(None),
            other => other?,
        };
        Ok(data.project)
    }
}

#[derive(Debug, Deserialize)]
struct ProjectData<T> {
    project: Option<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectVisibility {
    Public,
    Private,
    Unlisted,
    Workspace,
    #[serde(other)]
    Unknown,
}

impl ProjectVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectVisibility::Public => "PUBLIC",
            ProjectVisibility::Private => "PRIVATE",
            ProjectVisibility::Unlisted => "UNLISTED",
            ProjectVisibility::Workspace => "WORKSPACE",
            ProjectVisibility::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ProjectVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub visibility: ProjectVisibility,
    /// Role of the authenticated user on this project.
    #[serde(default)]
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source_apps: Vec<String>,
}

/// One page of projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCollection {
    pub total_count: u64,
    /// Cursor of the next page, if there is one.
    pub cursor: Option<String>,
    pub items: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCollection {
    pub total_count: u64,
    pub cursor: Option<String>,
    pub items: Vec<Model>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectWithModels {
    #[serde(flatten)]
    pub project: Project,
    pub models: Option<ModelCollection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectWithTeam {
    #[serde(flatten)]
    pub project: Project,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team: Vec<ProjectCollaborator>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCollaborator {
    pub id: String,
    pub role: String,
    pub user: LimitedUser,
}
