//! Main client for the Speckle API.

use crate::api::*;
use crate::config::{ClientConfig, RetryConfig, DEFAULT_SERVER_URL};
use crate::error::{SpeckleError, SpeckleResult};
use crate::session::SpeckleApi;
use crate::transport::HttpTransport;
use async_trait::async_trait;
use speckle_core::ObjectGraph;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Client for one Speckle server, authenticated with a personal access token.
#[derive(Clone)]
pub struct SpeckleClient {
    config: Arc<ClientConfig>,
    pub(crate) http: HttpTransport,
}

impl SpeckleClient {
    pub fn builder() -> SpeckleClientBuilder {
        SpeckleClientBuilder::new()
    }

    fn from_config(config: ClientConfig) -> SpeckleResult<Self> {
        let config = Arc::new(config);
        let http = HttpTransport::new(config.clone())?;

        Ok(Self { config, http })
    }

    pub fn server_url(&self) -> &Url {
        &self.config.server_url
    }

    pub fn active_user(&self) -> ActiveUserApi<'_> {
        ActiveUserApi::new(self)
    }

    pub fn projects(&self) -> ProjectsApi<'_> {
        ProjectsApi::new(self)
    }

    pub fn versions(&self) -> VersionsApi<'_> {
        VersionsApi::new(self)
    }

    pub fn objects(&self) -> ObjectsApi<'_> {
        ObjectsApi::new(self)
    }

    /// Verify the token by resolving the active user.
    pub async fn authenticate(&self) -> SpeckleResult<User> {
        let user = self.active_user().get().await?.ok_or_else(|| {
            SpeckleError::Authentication(format!(
                "token was not accepted by {}",
                self.config.server_url
            ))
        })?;
        info!(user_id = %user.id, server = %self.config.server_url, "Authenticated with Speckle");
        Ok(user)
    }
}

#[async_trait]
impl SpeckleApi for SpeckleClient {
    async fn active_user_projects(
        &self,
        limit: u32,
        cursor: Option<&str>,
        search: Option<&str>,
    ) -> SpeckleResult<ProjectCollection> {
        self.active_user().projects(limit, cursor, search).await
    }

    async fn project(&self, project_id: &str) -> SpeckleResult<Option<Project>> {
        self.projects().get(project_id).await
    }

    async fn project_with_models(
        &self,
        project_id: &str,
        models_limit: u32,
    ) -> SpeckleResult<Option<ProjectWithModels>> {
        self.projects().get_with_models(project_id, models_limit).await
    }

    async fn project_with_team(&self, project_id: &str) -> SpeckleResult<Option<ProjectWithTeam>> {
        self.projects().get_with_team(project_id).await
    }

    async fn model_versions(
        &self,
        project_id: &str,
        model_id: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> SpeckleResult<Option<VersionCollection>> {
        self.versions().list(project_id, model_id, limit, cursor).await
    }

    async fn version(&self, project_id: &str, version_id: &str) -> SpeckleResult<Option<Version>> {
        self.versions().get(project_id, version_id).await
    }

    async fn receive_object(&self, project_id: &str, object_id: &str) -> SpeckleResult<ObjectGraph> {
        self.objects().receive(project_id, object_id).await
    }
}

pub struct SpeckleClientBuilder {
    server_url: Option<String>,
    token: Option<String>,
    timeout: Duration,
    retry_config: RetryConfig,
}

impl SpeckleClientBuilder {
    pub fn new() -> Self {
        Self {
            server_url: None,
            token: None,
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
        }
    }

    /// Server base URL; defaults to [`DEFAULT_SERVER_URL`].
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    pub fn build(self) -> SpeckleResult<SpeckleClient> {
        let server_url = Url::parse(self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL))?;
        if !matches!(server_url.scheme(), "http" | "https") {
            return Err(SpeckleError::Config(format!(
                "unsupported server URL scheme '{}'",
                server_url.scheme()
            )));
        }

        SpeckleClient::from_config(ClientConfig {
            server_url,
            token: self.token.filter(|t| !t.is_empty()),
            timeout: self.timeout,
            retry_config: self.retry_config,
        })
    }
}

impl Default for SpeckleClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
