//! Error types for the Speckle client.

use serde::Deserialize;
use speckle_core::GraphError;

/// Result type for SDK operations.
pub type SpeckleResult<T> = Result<T, SpeckleError>;

/// GraphQL error codes that mean the token was not accepted.
const AUTH_ERROR_CODES: [&str; 3] = ["FORBIDDEN", "UNAUTHENTICATED", "UNAUTHORIZED"];

#[derive(Debug, thiserror::Error)]
pub enum SpeckleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from a REST endpoint.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The GraphQL endpoint answered with an error payload.
    #[error("GraphQL error: {message}")]
    GraphQl {
        message: String,
        code: Option<String>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Received objects could not be assembled into a graph.
    #[error("Object graph error: {0}")]
    Graph(#[from] GraphError),
}

impl SpeckleError {
    /// Errors after which a fresh authenticated session may succeed.
    pub fn is_auth_error(&self) -> bool {
        match self {
            Self::Authentication(_) => true,
            Self::Api { status, .. } => matches!(status, 401 | 403),
            _ => false,
        }
    }

    /// Map a non-success HTTP response.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .ok()
            .and_then(|r| r.error.or(r.message))
            .unwrap_or_else(|| body.trim().to_string());

        match status {
            401 | 403 => Self::Authentication(message),
            404 => Self::NotFound(message),
            _ => Self::Api { status, message },
        }
    }

    /// Map the first error of a GraphQL response by its `extensions.code`.
    pub fn from_graphql(message: String, code: Option<String>) -> Self {
        match code.as_deref() {
            Some(c) if AUTH_ERROR_CODES.contains(&c) => Self::Authentication(message),
            Some(c) if c.contains("NOT_FOUND") => Self::NotFound(message),
            _ => Self::GraphQl { message, code },
        }
    }
}

/// Error body returned by the REST endpoints.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
    message: Option<String>,
}
