//! HTTP transport for the Speckle GraphQL and object endpoints.

use crate::config::ClientConfig;
use crate::error::{SpeckleError, SpeckleResult};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<ClientConfig>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
    #[serde(default)]
    extensions: Option<GraphQlExtensions>,
}

#[derive(Debug, Deserialize)]
struct GraphQlExtensions {
    code: Option<String>,
}

impl HttpTransport {
    pub fn new(config: Arc<ClientConfig>) -> SpeckleResult<Self> {
        let mut headers = header::HeaderMap::new();

        if let Some(ref token) = config.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|_| SpeckleError::Config("Invalid token format".to_string()))?,
            );
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn server_url(&self) -> &url::Url {
        &self.config.server_url
    }

    fn build_url(&self, path: &str) -> SpeckleResult<url::Url> {
        Ok(self.config.server_url.join(path)?)
    }

    async fn execute_with_retry(&self, request_builder: RequestBuilder) -> SpeckleResult<Response> {
        let retry_config = &self.config.retry_config;
        let mut attempts = 0;

        loop {
            let request = request_builder
                .try_clone()
                .ok_or_else(|| SpeckleError::Config("Request cannot be cloned".to_string()))?;

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if response.status().is_success() {
                        return Ok(response);
                    }

                    if attempts < retry_config.max_retries && retry_config.should_retry_status(status) {
                        let backoff = retry_config.backoff_for_attempt(attempts);
                        warn!(
                            status = status,
                            attempt = attempts + 1,
                            backoff_ms = backoff.as_millis(),
                            "Speckle request failed, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        continue;
                    }

                    let body = response.text().await.unwrap_or_default();
                    return Err(SpeckleError::from_response(status, &body));
                }
                Err(e) => {
                    if attempts < retry_config.max_retries
                        && retry_config.retry_on_timeout
                        && e.is_timeout()
                    {
                        let backoff = retry_config.backoff_for_attempt(attempts);
                        warn!(
                            attempt = attempts + 1,
                            backoff_ms = backoff.as_millis(),
                            "Speckle request timed out, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }
    }

    /// Run a GraphQL operation against `{server}/graphql` and decode its `data`.
    pub async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: JsonValue,
    ) -> SpeckleResult<T> {
        let url = self.build_url("/graphql")?;
        debug!(url = %url, "GraphQL request");

        let body = json!({ "query": query, "variables": variables });
        let response = self
            .execute_with_retry(self.client.post(url).json(&body))
            .await?;
        let payload: GraphQlResponse<T> = response.json().await?;

        if let Some(first) = payload.errors.into_iter().next() {
            let code = first.extensions.and_then(|e| e.code);
            return Err(SpeckleError::from_graphql(first.message, code));
        }

        payload
            .data
            .ok_or_else(|| SpeckleError::GraphQl {
                message: "response carried neither data nor errors".to_string(),
                code: None,
            })
    }

    /// GET a path and return the raw body.
    pub async fn get_text(&self, path: &str) -> SpeckleResult<String> {
        let url = self.build_url(path)?;
        debug!(url = %url, "GET request");

        let response = self.execute_with_retry(self.client.get(url)).await?;
        Ok(response.text().await?)
    }

    /// POST a JSON body and return the raw response body.
    pub async fn post_text<B: Serialize>(&self, path: &str, body: &B) -> SpeckleResult<String> {
        let url = self.build_url(path)?;
        debug!(url = %url, "POST request");

        let response = self
            .execute_with_retry(self.client.post(url).json(body))
            .await?;
        Ok(response.text().await?)
    }
}
