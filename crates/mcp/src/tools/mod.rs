pub mod objects;
pub mod projects;
pub mod versions;
mod registry;

pub use objects::{ExtractGeometryDataTool, GetVersionObjectsTool, QueryObjectPropertiesTool};
pub use projects::{GetProjectDetailsTool, ListProjectsTool, SearchProjectsTool};
pub use registry::{
    json_schema_boolean, json_schema_enum, json_schema_integer, json_schema_object,
    json_schema_string, Tool, ToolRegistry,
};
pub use versions::GetModelVersionsTool;

use crate::service::SpeckleService;
use std::sync::Arc;

/// Registry holding every Speckle tool, all backed by `service`
pub fn speckle_tools(service: Arc<SpeckleService>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(ListProjectsTool::new(service.clone())));
    registry.register(Arc::new(GetProjectDetailsTool::new(service.clone())));
    registry.register(Arc::new(SearchProjectsTool::new(service.clone())));
    registry.register(Arc::new(GetModelVersionsTool::new(service.clone())));
    registry.register(Arc::new(GetVersionObjectsTool::new(service.clone())));
    registry.register(Arc::new(QueryObjectPropertiesTool::new(service.clone())));
    registry.register(Arc::new(ExtractGeometryDataTool::new(service)));

    registry
}
