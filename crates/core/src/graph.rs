// Object graph: a root value plus an arena of detached objects keyed by id

use crate::error::GraphError;
use crate::node::Node;
use crate::value::{Base, Members, Value};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Speckle type tag of the objects large arrays are split into
const DATA_CHUNK_TYPE: &str = "DataChunk";

/// An in-memory Domain Object graph.
///
/// Children detached on the server are held in the arena and linked through
/// [`Value::Reference`], which is what allows the graph to contain cycles.
#[derive(Debug, Clone, Default)]
pub struct ObjectGraph {
    root: Value,
    objects: HashMap<String, Base>,
}

impl ObjectGraph {
    pub fn new(root: impl Into<Value>) -> Self {
        Self {
            root: root.into(),
            objects: HashMap::new(),
        }
    }

    /// Add a detached object to the arena; it must carry an id
    pub fn insert(&mut self, base: Base) -> Result<(), GraphError> {
        let id = base
            .id()
            .ok_or_else(|| GraphError::MissingId(base.speckle_type().to_string()))?
            .to_string();
        self.objects.insert(id, base);
        Ok(())
    }

    pub fn with_object(mut self, base: Base) -> Result<Self, GraphError> {
        self.insert(base)?;
        Ok(self)
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn get(&self, id: &str) -> Option<&Base> {
        self.objects.get(id)
    }

    /// Number of objects in the arena
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Id of the root object, if the root is an object at all
    pub fn root_id(&self) -> Option<&str> {
        match self.classify(&self.root) {
            Node::Object(base) => base.id(),
            _ => None,
        }
    }

    /// Classify a value, following references through the arena
    pub fn classify<'g>(&'g self, value: &'g Value) -> Node<'g> {
        match value {
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::String(_) => Node::Scalar(value),
            Value::Float(f) if f.is_finite() => Node::Scalar(value),
            Value::Float(_) => Node::Unknown(value),
            Value::List(items) => Node::Sequence(items),
            Value::Map(members) => Node::Mapping(members),
            Value::Object(base) => Node::Object(base),
            Value::Reference(id) => match self.objects.get(id) {
                Some(base) => Node::Object(base),
                None => Node::Unknown(value),
            },
        }
    }

    /// Assemble a graph from received wire objects.
    ///
    /// `objects` holds the root and every object of its closure as raw JSON,
    /// keyed by id. Chunked arrays are recomposed before the graph is returned.
    pub fn from_wire<I>(root_id: &str, objects: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (String, JsonValue)>,
    {
        let mut arena = HashMap::new();
        for (id, json) in objects {
            match json {
                JsonValue::Object(map) => {
                    arena.insert(id, Base::from_wire(map));
                }
                other => {
                    return Err(GraphError::InvalidWire(format!(
                        "object {} is not a JSON object (found {})",
                        id,
                        json_kind(&other)
                    )))
                }
            }
        }

        if !arena.contains_key(root_id) {
            return Err(GraphError::MissingRoot(root_id.to_string()));
        }

        let mut graph = Self {
            root: Value::Reference(root_id.to_string()),
            objects: arena,
        };
        graph.recompose_chunks();
        Ok(graph)
    }

    /// Replace `@(N)name` attributes holding data chunks with one flat `name` list
    fn recompose_chunks(&mut self) {
        let chunks: HashMap<String, Vec<Value>> = self
            .objects
            .iter()
            .filter(|(_, base)| base.speckle_type().contains(DATA_CHUNK_TYPE))
            .filter_map(|(id, base)| match base.members().get("data") {
                Some(Value::List(data)) => Some((id.clone(), data.clone())),
                _ => None,
            })
            .collect();

        for base in self.objects.values_mut() {
            recompose_members(base.members_mut(), &chunks);
        }
    }
}

fn recompose_members(members: &mut Members, chunks: &HashMap<String, Vec<Value>>) {
    let needs_rename = members.keys().any(|name| chunked_name(name).is_some());

    for (_, value) in members.iter_mut() {
        recompose_value(value, chunks);
    }

    if !needs_rename {
        return;
    }

    let entries = std::mem::take(members);
    for (name, value) in entries {
        let recomposed = match (chunked_name(&name), &value) {
            (Some(plain), Value::List(parts)) => match concat_chunks(parts, chunks) {
                Some(data) => Some((plain.to_string(), data)),
                None => {
                    tracing::warn!(attribute = %name, "Chunked attribute references missing chunks, leaving it as received");
                    None
                }
            },
            _ => None,
        };
        match recomposed {
            Some((plain, data)) => members.insert(plain, Value::List(data)),
            None => members.insert(name, value),
        };
    }
}

fn recompose_value(value: &mut Value, chunks: &HashMap<String, Vec<Value>>) {
    match value {
        Value::Object(base) => recompose_members(base.members_mut(), chunks),
        Value::List(items) => items.iter_mut().for_each(|item| recompose_value(item, chunks)),
        Value::Map(members) => members
            .iter_mut()
            .for_each(|(_, item)| recompose_value(item, chunks)),
        _ => {}
    }
}

/// `@(31250)vertices` -> `vertices`
fn chunked_name(name: &str) -> Option<&str> {
    let rest = name.strip_prefix("@(")?;
    let close = rest.find(')')?;
    let plain = &rest[close + 1..];
    (!plain.is_empty()).then_some(plain)
}

fn concat_chunks(parts: &[Value], chunks: &HashMap<String, Vec<Value>>) -> Option<Vec<Value>> {
    let mut data = Vec::new();
    for part in parts {
        match part {
            Value::Reference(id) => data.extend(chunks.get(id)?.iter().cloned()),
            Value::Object(base) if base.speckle_type().contains(DATA_CHUNK_TYPE) => {
                match base.members().get("data") {
                    Some(Value::List(inline)) => data.extend(inline.iter().cloned()),
                    _ => return None,
                }
            }
            _ => return None,
        }
    }
    Some(data)
}

fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
