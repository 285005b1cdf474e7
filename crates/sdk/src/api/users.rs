//! Active user API: authentication check and the user's projects.

use crate::api::projects::ProjectCollection;
use crate::client::SpeckleClient;
use crate::error::SpeckleResult;
use serde::{Deserialize, Serialize};
use serde_json::json;

const ACTIVE_USER_QUERY: &str = r#"
query ActiveUser {
  activeUser { id name email }
}"#;

const ACTIVE_USER_PROJECTS_QUERY: &str = r#"
query ActiveUserProjects($limit: Int!, $cursor: String, $filter: UserProjectsFilter) {
  activeUser {
    projects(limit: $limit, cursor: $cursor, filter: $filter) {
      totalCount
      cursor
      items { id name description visibility role createdAt updatedAt sourceApps }
    }
  }
}"#;

pub struct ActiveUserApi<'a> {
    client: &'a SpeckleClient,
}

impl<'a> ActiveUserApi<'a> {
    pub(crate) fn new(client: &'a SpeckleClient) -> Self {
        Self { client }
    }

    /// The user owning the token; `None` when the server does not recognise it.
    pub async fn get(&self) -> SpeckleResult<Option<User>> {
        let data: ActiveUserData<User> = self
            .client
            .http
            .graphql(ACTIVE_USER_QUERY, json!({}))
            .await?;
        Ok(data.active_user)
    }

    /// One page of the user's projects, optionally filtered by a search term.
    pub async fn projects(
        &self,
        limit: u32,
        cursor: Option<&str>,
        search: Option<&str>,
    ) -> SpeckleResult<ProjectCollection> {
        let filter = search.map(|term| json!({ "search": term }));
        let data: ActiveUserData<UserProjects> = self
            .client
            .http
            .graphql(
                ACTIVE_USER_PROJECTS_QUERY,
                json!({ "limit": limit, "cursor": cursor, "filter": filter }),
            )
            .await?;

        Ok(data
            .active_user
            .map(|user| user.projects)
            .unwrap_or(ProjectCollection {
                total_count: 0,
                cursor: None,
                items: Vec::new(),
            }))
    }
}

#[derive(Debug, Deserialize)]
struct ActiveUserData<T> {
    #[serde(rename = "activeUser")]
    active_user: Option<T>,
}

#[derive(Debug, Deserialize)]
struct UserProjects {
    projects: ProjectCollection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Public view of another user, as attached to versions and collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitedUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
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

    #[tokio::test]
    async fn test_get_active_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"activeUser": {"id": "u1", "name": "Ada", "email": "ada@example.com"}}
            })))
            .mount(&server)
            .await;

        let user = client(&server).active_user().get().await.unwrap().unwrap();
        assert_eq!(user.name, "Ada");
    }

    #[tokio::test]
    async fn test_projects_pass_search_filter_and_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(json!({
                "variables": {"limit": 10, "cursor": "c0", "filter": {"search": "tower"}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"activeUser": {"projects": {
                    "totalCount": 11,
                    "cursor": "c1",
                    "items": [{
                        "id": "p1", "name": "Tower", "description": "Main tower",
                        "visibility": "PUBLIC", "role": null,
                        "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-02T00:00:00Z",
                        "sourceApps": null
                    }]
                }}}
            })))
            .mount(&server)
            .await;

        let page = client(&server)
            .active_user()
            .projects(10, Some("c0"), Some("tower"))
            .await
            .unwrap();
        assert_eq!(page.total_count, 11);
        assert_eq!(page.cursor.as_deref(), Some("c1"));
        assert_eq!(page.items[0].description.as_deref(), Some("Main tower"));
        assert!(page.items[0].source_apps.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user_yields_empty_page() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"activeUser": null}})))
            .mount(&server)
            .await;

        let page = client(&server).active_user().projects(20, None, None).await.unwrap();
        assert!(page.items.is_empty());
        assert!(client(&server).active_user().get().await.unwrap().is_none());
    }
}
