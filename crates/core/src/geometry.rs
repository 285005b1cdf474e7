// Geometry extraction: a bounded search for geometry-bearing objects

use crate::error::GeometryError;
use crate::graph::ObjectGraph;
use crate::node::{DynamicObject, Node};
use crate::normalize::normalize;
use crate::value::{is_internal, Base, Value};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

/// Requested geometry category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    All,
    Mesh,
    Point,
    Line,
    Curve,
}

impl GeometryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::All => "all",
            GeometryKind::Mesh => "mesh",
            GeometryKind::Point => "point",
            GeometryKind::Line => "line",
            GeometryKind::Curve => "curve",
        }
    }

    /// Lowercase substrings of a type tag that place it in this category
    fn needles(&self) -> &'static [&'static str] {
        match self {
            GeometryKind::All => &["geometry"],
            GeometryKind::Mesh => &["mesh"],
            GeometryKind::Point => &["point"],
            GeometryKind::Line => &["line"],
            GeometryKind::Curve => &["curve", "arc", "circle", "ellipse"],
        }
    }

    /// Case-insensitive substring match against a `speckle_type` tag
    pub fn matches(&self, speckle_type: &str) -> bool {
        let tag = speckle_type.to_lowercase();
        self.needles().iter().any(|needle| tag.contains(needle))
    }
}

impl FromStr for GeometryKind {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(GeometryKind::All),
            "mesh" => Ok(GeometryKind::Mesh),
            "point" => Ok(GeometryKind::Point),
            "line" => Ok(GeometryKind::Line),
            "curve" => Ok(GeometryKind::Curve),
            _ => Err(GeometryError::UnknownKind(s.to_string())),
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounds of a geometry search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Object hops below the root that are still inspected
    pub max_depth: usize,
    /// Records returned to the caller
    pub max_results: usize,
    /// Vertex and face entries kept per mesh
    pub array_limit: usize,
    /// Elements of any one sequence that are traversed
    pub sequence_scan_limit: usize,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            max_results: 100,
            array_limit: 100,
            sequence_scan_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coordinates {
    /// Read `x`, `y` and optional `z` off a point-like object or mapping
    fn from_value(graph: &ObjectGraph, value: &Value) -> Option<Self> {
        let coordinate = |name: &str| -> Option<f64> {
            match graph.classify(value) {
                Node::Object(base) => base.get_attribute(name)?.as_f64(),
                Node::Mapping(members) => members.get(name)?.as_f64(),
                _ => None,
            }
        };
        Some(Self {
            x: coordinate("x")?,
            y: coordinate("y")?,
            z: coordinate("z").unwrap_or(0.0),
        })
    }
}

/// Type-specific fields of a geometry record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GeometryPayload {
    Mesh {
        vertices: Vec<JsonValue>,
        faces: Vec<JsonValue>,
        vertex_count: usize,
        face_count: usize,
        vertices_truncated: bool,
        faces_truncated: bool,
    },
    Point {
        x: Option<f64>,
        y: Option<f64>,
        z: Option<f64>,
    },
    Line {
        #[serde(skip_serializing_if = "Option::is_none")]
        start: Option<Coordinates>,
        #[serde(skip_serializing_if = "Option::is_none")]
        end: Option<Coordinates>,
        #[serde(skip_serializing_if = "Option::is_none")]
        length: Option<f64>,
    },
    Curve {
        #[serde(skip_serializing_if = "Option::is_none")]
        start: Option<Coordinates>,
        #[serde(skip_serializing_if = "Option::is_none")]
        end: Option<Coordinates>,
        #[serde(skip_serializing_if = "Option::is_none")]
        center: Option<Coordinates>,
        #[serde(skip_serializing_if = "Option::is_none")]
        radius: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        length: Option<f64>,
    },
    /// Geometry with no dedicated extraction, e.g. a Brep
    Other {},
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryRecord {
    #[serde(rename = "type")]
    pub speckle_type: String,
    pub id: Option<String>,
    /// Dot path from the root, usable with the path navigator
    pub path: String,
    #[serde(flatten)]
    pub payload: GeometryPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

/// Result handed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryExtraction {
    pub geometry_type: GeometryKind,
    pub total_found: usize,
    pub returned: usize,
    pub truncated: bool,
    pub geometries: Vec<GeometryRecord>,
}

pub struct GeometryExtractor<'g> {
    graph: &'g ObjectGraph,
    kind: GeometryKind,
    config: GeometryConfig,
}

impl<'g> GeometryExtractor<'g> {
    pub fn new(graph: &'g ObjectGraph, kind: GeometryKind, config: GeometryConfig) -> Self {
        Self {
            graph,
            kind,
            config,
        }
    }

    /// Every match reachable from `value` within the depth bound, uncapped
    pub fn extract(&self, value: &'g Value) -> Vec<GeometryRecord> {
        let mut found = Vec::new();
        let mut ancestors = Vec::new();
        self.visit(value, String::new(), 0, &mut ancestors, &mut found);
        found
    }

    fn visit(
        &self,
        value: &'g Value,
        path: String,
        depth: usize,
        ancestors: &mut Vec<&'g Base>,
        found: &mut Vec<GeometryRecord>,
    ) {
        match self.graph.classify(value) {
            Node::Object(base) => {
                if depth > self.config.max_depth
                    || ancestors.iter().any(|a| std::ptr::eq(*a, base))
                {
                    return;
                }
                if self.kind.matches(base.speckle_type()) {
                    found.push(self.record(base, &path));
                }

                ancestors.push(base);
                for (name, attr) in base.attribute_walk() {
                    if !is_internal(name) {
                        self.visit(attr, join(&path, name), depth + 1, ancestors, found);
                    }
                }
                ancestors.pop();
            }
            Node::Sequence(items) => {
                for (i, item) in items.iter().take(self.config.sequence_scan_limit).enumerate() {
                    self.visit(item, join(&path, &i.to_string()), depth, ancestors, found);
                }
            }
            Node::Mapping(members) => {
                for (key, item) in members.iter() {
                    self.visit(item, join(&path, key), depth, ancestors, found);
                }
            }
            Node::Scalar(_) | Node::Unknown(_) => {}
        }
    }

    fn record(&self, base: &'g Base, path: &str) -> GeometryRecord {
        GeometryRecord {
            speckle_type: base.speckle_type().to_string(),
            id: base.id().map(str::to_string),
            path: path.to_string(),
            payload: self.payload(base),
            units: base.units().map(str::to_string),
        }
    }

    /// Fields are chosen by the object's own tag, whatever category was requested
    fn payload(&self, base: &'g Base) -> GeometryPayload {
        let tag = base.speckle_type().to_lowercase();
        if tag.contains("mesh") {
            self.mesh_payload(base)
        } else if tag.contains("point") {
            let number = |name: &str| base.get_attribute(name).and_then(Value::as_f64);
            GeometryPayload::Point {
                x: number("x"),
                y: number("y"),
                z: number("z"),
            }
        } else if tag.contains("line") {
            GeometryPayload::Line {
                start: self.point_at(base, &["start", "startPoint"]),
                end: self.point_at(base, &["end", "endPoint"]),
                length: base.get_attribute("length").and_then(Value::as_f64),
            }
        } else if GeometryKind::Curve.matches(&tag) {
            let center = base
                .get_attribute("plane")
                .and_then(|plane| match self.graph.classify(plane) {
                    Node::Object(plane) => plane.get_attribute("origin"),
                    Node::Mapping(plane) => plane.get("origin"),
                    _ => None,
                })
                .or_else(|| base.get_attribute("center"))
                .and_then(|origin| Coordinates::from_value(self.graph, origin));
            GeometryPayload::Curve {
                start: self.point_at(base, &["start", "startPoint"]),
                end: self.point_at(base, &["end", "endPoint"]),
                center,
                radius: base.get_attribute("radius").and_then(Value::as_f64),
                length: base.get_attribute("length").and_then(Value::as_f64),
            }
        } else {
            GeometryPayload::Other {}
        }
    }

    fn mesh_payload(&self, base: &'g Base) -> GeometryPayload {
        let vertices = self.sequence(base, "vertices");
        let faces = self.sequence(base, "faces");
        let limit = self.config.array_limit;

        GeometryPayload::Mesh {
            vertices: self.head(vertices, limit),
            faces: self.head(faces, limit),
            vertex_count: vertices.len() / 3,
            face_count: count_faces(faces),
            vertices_truncated: vertices.len() > limit,
            faces_truncated: faces.len() > limit,
        }
    }

    fn sequence(&self, base: &'g Base, name: &str) -> &'g [Value] {
        match base.resolve_attribute(name).map(|v| self.graph.classify(v)) {
            Some(Node::Sequence(items)) => items,
            _ => &[],
        }
    }

    fn head(&self, items: &[Value], limit: usize) -> Vec<JsonValue> {
        items
            .iter()
            .take(limit)
            .map(|item| normalize(self.graph, item))
            .collect()
    }

    fn point_at(&self, base: &'g Base, names: &[&str]) -> Option<Coordinates> {
        names
            .iter()
            .find_map(|name| base.get_attribute(name))
            .and_then(|value| Coordinates::from_value(self.graph, value))
    }
}

/// Search the graph root and shape the result for the caller
pub fn extract_geometry(
    graph: &ObjectGraph,
    kind: GeometryKind,
    config: GeometryConfig,
) -> GeometryExtraction {
    let mut geometries = GeometryExtractor::new(graph, kind, config).extract(graph.root());
    let total_found = geometries.len();
    geometries.truncate(config.max_results);

    GeometryExtraction {
        geometry_type: kind,
        total_found,
        returned: geometries.len(),
        truncated: total_found > config.max_results,
        geometries,
    }
}

/// Number of faces in a `[n, i0, .., in-1, n, ..]` face list.
///
/// A leading 0 or 1 is the legacy triangle / quad marker. Counting stops at
/// the first entry that is not a usable vertex count.
pub fn count_faces(faces: &[Value]) -> usize {
    let mut count = 0;
    let mut i = 0;
    while i < faces.len() {
        let size = match faces[i].as_i64() {
            Some(0) => 3,
            Some(1) => 4,
            Some(n) if n > 1 => n as usize,
            _ => break,
        };
        count += 1;
        i += size + 1;
    }
    count
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", path, segment)
    }
}
