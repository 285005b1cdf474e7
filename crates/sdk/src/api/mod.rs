//! Sub-APIs of the Speckle client.

pub mod objects;
pub mod projects;
pub mod users;
pub mod versions;

pub use objects::ObjectsApi;
pub use projects::{
    Model, ModelCollection, Project, ProjectCollaborator, ProjectCollection, ProjectVisibility,
    ProjectWithModels, ProjectWithTeam, ProjectsApi,
};
pub use users::{ActiveUserApi, LimitedUser, User};
pub use versions::{Version, VersionCollection, VersionsApi};

use serde::{Deserialize, Deserializer};

/// The API sends `null` for empty lists in a few places.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
