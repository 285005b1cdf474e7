//! Shared, lazily created and refreshable Speckle session.
//!
//! [`SessionManager`] owns the one authenticated client of the process. It is
//! created on first use, reused afterwards and replaced when a call fails
//! with an authentication error.

use crate::api::{
    Project, ProjectCollection, ProjectWithModels, ProjectWithTeam, Version, VersionCollection,
};
use crate::client::SpeckleClient;
use crate::config::RetryConfig;
use crate::error::SpeckleResult;
use async_trait::async_trait;
use speckle_core::ObjectGraph;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Remote operations the tools depend on.
#[async_trait]
pub trait SpeckleApi: Send + Sync {
    async fn active_user_projects(
        &self,
        limit: u32,
        cursor: Option<&str>,
        search: Option<&str>,
    ) -> SpeckleResult<ProjectCollection>;

    async fn project(&self, project_id: &str) -> SpeckleResult<Option<Project>>;

    async fn project_with_models(
        &self,
        project_id: &str,
        models_limit: u32,
    ) -> SpeckleResult<Option<ProjectWithModels>>;

    async fn project_with_team(&self, project_id: &str) -> SpeckleResult<Option<ProjectWithTeam>>;

    async fn model_versions(
        &self,
        project_id: &str,
        model_id: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> SpeckleResult<Option<VersionCollection>>;

    async fn version(&self, project_id: &str, version_id: &str) -> SpeckleResult<Option<Version>>;

    async fn receive_object(&self, project_id: &str, object_id: &str) -> SpeckleResult<ObjectGraph>;
}

/// Creates authenticated API handles.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> SpeckleResult<Arc<dyn SpeckleApi>>;
}

/// Connects with a personal access token and verifies it against the server.
#[derive(Debug, Clone)]
pub struct TokenConnector {
    server_url: String,
    token: String,
    timeout: Duration,
    retry_config: RetryConfig,
}

impl TokenConnector {
    pub fn new(server_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            token: token.into(),
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }
}

#[async_trait]
impl Connector for TokenConnector {
    async fn connect(&self) -> SpeckleResult<Arc<dyn SpeckleApi>> {
        let client = SpeckleClient::builder()
            .server_url(self.server_url.clone())
            .token(self.token.clone())
            .timeout(self.timeout)
            .retry_config(self.retry_config.clone())
            .build()?;
        client.authenticate().await?;
        Ok(Arc::new(client))
    }
}

pub struct SessionManager {
    connector: Arc<dyn Connector>,
    current: Mutex<Option<Arc<dyn SpeckleApi>>>,
}

impl SessionManager {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            current: Mutex::new(None),
        }
    }

    /// The shared client, created on first use.
    pub async fn client(&self) -> SpeckleResult<Arc<dyn SpeckleApi>> {
        let mut current = self.current.lock().await;
        if let Some(client) = current.as_ref() {
            return Ok(client.clone());
        }

        let client = self.connect().await?;
        *current = Some(client.clone());
        Ok(client)
    }

    /// Replace `stale` with a fresh client. If another caller already
    /// replaced it, that newer client is returned instead.
    pub async fn refresh(&self, stale: &Arc<dyn SpeckleApi>) -> SpeckleResult<Arc<dyn SpeckleApi>> {
        let mut current = self.current.lock().await;
        if let Some(client) = current.as_ref() {
            if !same_client(client, stale) {
                return Ok(client.clone());
            }
        }

        *current = None;
        let client = self.connect().await?;
        *current = Some(client.clone());
        Ok(client)
    }

    /// Drop the shared client; the next call creates a new one.
    pub async fn invalidate(&self) {
        self.current.lock().await.take();
    }

    /// Run `op` on the shared client, retrying once on a refreshed client
    /// when the first attempt fails with an authentication error.
    pub async fn run<T, F, Fut>(&self, op: F) -> SpeckleResult<T>
    where
        F: Fn(Arc<dyn SpeckleApi>) -> Fut,
        Fut: Future<Output = SpeckleResult<T>>,
    {
        let client = self.client().await?;
        match op(client.clone()).await {
            Err(e) if e.is_auth_error() => {
                warn!(error = %e, "Authentication issue detected, refreshing Speckle session");
                let fresh = self.refresh(&client).await?;
                op(fresh).await
            }
            other => other,
        }
    }

    /// Create a client, retrying once when creation fails on authentication.
    async fn connect(&self) -> SpeckleResult<Arc<dyn SpeckleApi>> {
        debug!("Creating Speckle session");
        match self.connector.connect().await {
            Err(e) if e.is_auth_error() => {
                warn!(error = %e, "Authentication failed while creating session, retrying once");
                self.connector.connect().await
            }
            other => other,
        }
    }
}

fn same_client(a: &Arc<dyn SpeckleApi>, b: &Arc<dyn SpeckleApi>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
