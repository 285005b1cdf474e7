// Core object graph model and the walks over it: path navigation,
// value normalization, bounded serialization and geometry extraction

pub mod error;
pub mod geometry;
pub mod graph;
pub mod node;
pub mod normalize;
pub mod path;
pub mod serialize;
pub mod value;

pub use error::{GeometryError, GraphError, PathError};
pub use geometry::{
    extract_geometry, GeometryConfig, GeometryExtraction, GeometryExtractor, GeometryKind,
    GeometryPayload, GeometryRecord,
};
pub use graph::ObjectGraph;
pub use node::{DynamicObject, Node};
pub use normalize::normalize;
pub use path::resolve;
pub use serialize::{serialize, GraphSerializer, SerializerConfig};
pub use value::{Base, Members, Value};
