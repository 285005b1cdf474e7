// In-memory Speckle server used by the facade, tool and protocol tests

use crate::config::LimitsConfig;
use crate::service::SpeckleService;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use speckle_sdk::{
    Connector, LimitedUser, Model, ModelCollection, ObjectGraph, Project, ProjectCollaborator,
    ProjectCollection, ProjectVisibility, ProjectWithModels, ProjectWithTeam, SessionManager,
    SpeckleApi, SpeckleError, SpeckleResult, Version, VersionCollection,
};
use std::sync::Arc;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

fn project(id: &str, name: &str, description: Option<&str>, visibility: ProjectVisibility) -> Project {
    Project {
        id: id.to_string(),
        name: name.to_string(),
        description: description.map(String::from),
        visibility,
        role: Some("stream:owner".to_string()),
        created_at: at(2024, 1, 2, 9, 0, 0),
        updated_at: at(2024, 2, 3, 17, 30, 0),
        source_apps: vec!["Revit".to_string(), "Rhino".to_string()],
    }
}

fn model(id: &str, name: &str) -> Model {
    Model {
        id: id.to_string(),
        name: name.to_string(),
        display_name: None,
        description: None,
        created_at: at(2024, 1, 2, 9, 0, 0),
        updated_at: at(2024, 1, 2, 9, 0, 0),
    }
}

fn version(id: &str, referenced_object: &str) -> Version {
    Version {
        id: id.to_string(),
        referenced_object: referenced_object.to_string(),
        message: Some("Initial upload".to_string()),
        source_application: Some("Revit".to_string()),
        created_at: at(2024, 3, 5, 10, 20, 30),
        preview_url: None,
        author_user: Some(LimitedUser {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            avatar: None,
        }),
    }
}

fn user(id: &str) -> LimitedUser {
    LimitedUser {
        id: id.to_string(),
        name: id.to_uppercase(),
        avatar: None,
    }
}

/// Tower project with a wall that displays as a single triangle mesh
pub fn tower_graph() -> ObjectGraph {
    ObjectGraph::from_wire(
        "root",
        vec![
            (
                "root".to_string(),
                json!({
                    "id": "root",
                    "speckle_type": "Base",
                    "name": "Tower",
                    "levels": [1, 2, 3, 4, 5, 6, 7],
                    "@elements": [{"referencedId": "wall", "speckle_type": "reference"}],
                    "__closure": {"wall": 1, "mesh": 2}
                }),
            ),
            (
                "wall".to_string(),
                json!({
                    "id": "wall",
                    "speckle_type": "Objects.BuiltElements.Wall:Objects.BuiltElements.Revit.RevitWall",
                    "name": "W1",
                    "@displayValue": [{"referencedId": "mesh", "speckle_type": "reference"}]
                }),
            ),
            (
                "mesh".to_string(),
                json!({
                    "id": "mesh",
                    "speckle_type": "Objects.Geometry.Mesh",
                    "vertices": [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
                    "faces": [3, 0, 1, 2],
                    "units": "m"
                }),
            ),
        ],
    )
    .unwrap()
}

pub struct FakeApi {
    projects: Vec<Project>,
}

#[async_trait]
impl SpeckleApi for FakeApi {
    async fn active_user_projects(
        &self,
        limit: u32,
        _cursor: Option<&str>,
        search: Option<&str>,
    ) -> SpeckleResult<ProjectCollection> {
        let matching: Vec<Project> = self
            .projects
            .iter()
            .filter(|p| match search {
                Some(q) => p.name.to_lowercase().contains(&q.to_lowercase()),
                None => true,
            })
            .cloned()
            .collect();

        Ok(ProjectCollection {
            total_count: matching.len() as u64,
            cursor: Some("page-2".to_string()),
            items: matching.into_iter().take(limit as usize).collect(),
        })
    }

    async fn project(&self, project_id: &str) -> SpeckleResult<Option<Project>> {
        Ok(self.projects.iter().find(|p| p.id == project_id).cloned())
    }

    async fn project_with_models(
        &self,
        project_id: &str,
        models_limit: u32,
    ) -> SpeckleResult<Option<ProjectWithModels>> {
        let Some(project) = self.project(project_id).await? else {
            return Ok(None);
        };
        let items: Vec<Model> = vec![model("m1", "architecture"), model("m2", "structure")];
        Ok(Some(ProjectWithModels {
            project,
            models: Some(ModelCollection {
                total_count: items.len() as u64,
                cursor: None,
                items: items.into_iter().take(models_limit as usize).collect(),
            }),
        }))
    }

    async fn project_with_team(&self, project_id: &str) -> SpeckleResult<Option<ProjectWithTeam>> {
        let Some(project) = self.project(project_id).await? else {
            return Ok(None);
        };
        let team = ["u1", "u2", "u3"]
            .iter()
            .map(|id| ProjectCollaborator {
                id: id.to_string(),
                role: "stream:contributor".to_string(),
                user: user(id),
            })
            .collect();
        Ok(Some(ProjectWithTeam { project, team }))
    }

    async fn model_versions(
        &self,
        project_id: &str,
        model_id: &str,
        _limit: u32,
        _cursor: Option<&str>,
    ) -> SpeckleResult<Option<VersionCollection>> {
        if project_id != "p1" {
            return Ok(None);
        }
        let items = match model_id {
            "m1" => {
                let mut second = version("v2", "root");
                second.message = None;
                second.source_application = Some(String::new());
                second.created_at = at(2024, 3, 6, 8, 0, 0);
                second.author_user = None;
                vec![version("v1", "root"), second]
            }
            _ => Vec::new(),
        };
        Ok(Some(VersionCollection {
            total_count: items.len() as u64,
            cursor: None,
            items,
        }))
    }

    async fn version(&self, project_id: &str, version_id: &str) -> SpeckleResult<Option<Version>> {
        Ok(match (project_id, version_id) {
            ("p1", "v1") => Some(version("v1", "root")),
            ("p1", "broken") => Some(version("broken", "gone")),
            _ => None,
        })
    }

    async fn receive_object(&self, _project_id: &str, object_id: &str) -> SpeckleResult<ObjectGraph> {
        match object_id {
            "root" => Ok(tower_graph()),
            other => Err(SpeckleError::NotFound(format!("Failed to find object {}.", other))),
        }
    }
}

pub struct FakeConnector {
    projects: Vec<Project>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self {
            projects: vec![
                project("p1", "Tower", Some("Office tower"), ProjectVisibility::Private),
                project("p2", "Bridge", None, ProjectVisibility::Public),
            ],
        }
    }

    pub fn empty() -> Self {
        Self {
            projects: Vec::new(),
        }
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self) -> SpeckleResult<Arc<dyn SpeckleApi>> {
        Ok(Arc::new(FakeApi {
            projects: self.projects.clone(),
        }))
    }
}

pub fn service() -> SpeckleService {
    SpeckleService::new(
        SessionManager::new(Arc::new(FakeConnector::new())),
        LimitsConfig::default(),
    )
}
