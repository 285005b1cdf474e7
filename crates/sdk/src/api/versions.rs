//! Versions API: the commits of a model.

use crate::api::users::LimitedUser;
use crate::client::SpeckleClient;
use crate::error::{SpeckleError, SpeckleResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

const MODEL_VERSIONS_QUERY: &str = r#"
query ModelVersions($projectId: String!, $modelId: String!, $limit: Int!, $cursor: String) {
  project(id: $projectId) {
    model(id: $modelId) {
      versions(limit: $limit, cursor: $cursor) {
        totalCount
        cursor
        items {
          id referencedObject message sourceApplication createdAt previewUrl
          authorUser { id name avatar }
        }
      }
    }
  }
}"#;

const VERSION_QUERY: &str = r#"
query Version($projectId: String!, $versionId: String!) {
  project(id: $projectId) {
    version(id: $versionId) {
      id referencedObject message sourceApplication createdAt previewUrl
      authorUser { id name avatar }
    }
  }
}"#;

pub struct VersionsApi<'a> {
    client: &'a SpeckleClient,
}

impl<'a> VersionsApi<'a> {
    pub(crate) fn new(client: &'a SpeckleClient) -> Self {
        Self { client }
    }

    /// One page of a model's versions, newest first; `None` when the project
    /// or model does not exist.
    pub async fn list(
        &self,
        project_id: &str,
        model_id: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> SpeckleResult<Option<VersionCollection>> {
        let data: ProjectScope<ModelScope> = match self
            .client
            .http
            .graphql(
                MODEL_VERSIONS_QUERY,
                json!({
                    "projectId": project_id,
                    "modelId": model_id,
                    "limit": limit,
                    "cursor": cursor,
                }),
            )
            .await
        {
            Err(SpeckleError::NotFound(_)) => return Ok(None),
            other => other?,
        };

        Ok(data
            .project
            .and_then(|p| p.model)
            .map(|m| m.versions))
    }

    /// A single version; `None` when it does not exist in the project.
    pub async fn get(&self, project_id: &str, version_id: &str) -> SpeckleResult<Option<Version>> {
        let data: ProjectScope<VersionScope> = match self
            .client
            .http
            .graphql(
                VERSION_QUERY,
                json!({ "projectId": project_id, "versionId": version_id }),
            )
            .await
        {
            Err(SpeckleError::NotFound(_)) => return Ok(None),
            other => other?,
        };

        Ok(data.project.and_then(|p| p.version))
    }
}

#[derive(Debug, Deserialize)]
struct ProjectScope<T> {
    project: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ModelScope {
    model: Option<ModelVersions>,
}

#[derive(Debug, Deserialize)]
struct ModelVersions {
    versions: VersionCollection,
}

#[derive(Debug, Deserialize)]
struct VersionScope {
    version: Option<Version>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: String,
    /// Id of the root object committed in this version.
    pub referenced_object: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub source_application: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub author_user: Option<LimitedUser>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionCollection {
    pub total_count: u64,
    pub cursor: Option<String>,
    pub items: Vec<Version>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SpeckleClient {
        SpeckleClient::builder()
            .server_url(server.uri())
            .token("tok")
            .retry_config(RetryConfig::no_retry())
            .build()
            .unwrap()
    }

    fn version_json() -> serde_json::Value {
        json!({
            "id": "v1",
            "referencedObject": "obj1",
            "message": null,
            "sourceApplication": "Revit",
            "createdAt": "2024-05-06T07:08:09Z",
            "previewUrl": null,
            "authorUser": {"id": "u1", "name": "Ada", "avatar": null}
        })
    }

    #[tokio::test]
    async fn test_list_versions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(json!({"variables": {"modelId": "m1", "limit": 2}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"project": {"model": {"versions": {
                    "totalCount": 4, "cursor": "next", "items": [version_json()]
                }}}}
            })))
            .mount(&server)
            .await;

        let page = client(&server)
            .versions()
            .list("p1", "m1", 2, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(page.total_count, 4);
        assert_eq!(page.items[0].referenced_object, "obj1");
        assert_eq!(page.items[0].author_user.as_ref().unwrap().name, "Ada");
    }

    #[tokio::test]
    async fn test_get_version_and_missing_version() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(json!({"variables": {"versionId": "v1"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"project": {"version": version_json()}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [{"message": "Version not found", "extensions": {"code": "VERSION_NOT_FOUND"}}]
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        let version = client.versions().get("p1", "v1").await.unwrap().unwrap();
        assert_eq!(version.source_application.as_deref(), Some("Revit"));
        assert!(client.versions().get("p1", "v404").await.unwrap().is_none());
    }
}
