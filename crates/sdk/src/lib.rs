//! # Speckle SDK
//!
//! Async client for a Speckle server: projects, models, versions and the
//! committed object graphs behind them.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use speckle_sdk::{SpeckleClient, SpeckleResult};
//!
//! #[tokio::main]
//! async fn main() -> SpeckleResult<()> {
//!     let client = SpeckleClient::builder()
//!         .server_url("https://app.speckle.systems")
//!         .token("your-personal-access-token")
//!         .build()?;
//!
//!     let user = client.authenticate().await?;
//!     println!("Signed in as {}", user.name);
//!
//!     let projects = client.active_user().projects(10, None, None).await?;
//!     for project in &projects.items {
//!         println!("{} ({})", project.name, project.id);
//!     }
//!
//!     if let Some(version) = client.versions().get("project-id", "version-id").await? {
//!         let graph = client
//!             .objects()
//!             .receive("project-id", &version.referenced_object)
//!             .await?;
//!         println!("Received {} objects", graph.len());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Shared sessions
//!
//! Long running services hold one [`SessionManager`], which creates the
//! client lazily and replaces it when the server starts rejecting the token.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod transport;

pub use api::{
    LimitedUser, Model, ModelCollection, Project, ProjectCollaborator, ProjectCollection,
    ProjectVisibility, ProjectWithModels, ProjectWithTeam, User, Version, VersionCollection,
};
pub use client::{SpeckleClient, SpeckleClientBuilder};
pub use config::{ClientConfig, RetryConfig, DEFAULT_SERVER_URL};
pub use error::{SpeckleError, SpeckleResult};
pub use session::{Connector, SessionManager, SpeckleApi, TokenConnector};

pub use speckle_core::ObjectGraph;
