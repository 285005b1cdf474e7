// Node classification and the dynamic attribute capability shared by all graph walks

use crate::error::GraphError;
use crate::value::{Base, Members, Value, DYNAMIC_PREFIX};
use serde_json::{json, Value as JsonValue};

/// Key and marker value identifying a Reference Stub
pub const REFERENCE_MARKER_KEY: &str = "_type";
pub const REFERENCE_MARKER: &str = "reference";

/// Resolve named children on a polymorphic node without knowing its concrete shape
pub trait DynamicObject {
    fn get_attribute(&self, name: &str) -> Option<&Value>;

    /// All attribute names, internal ones included, in storage order
    fn attribute_names(&self) -> Vec<&str>;

    fn id(&self) -> Option<&str>;

    fn speckle_type(&self) -> &str;

    /// Exact attribute name first, then the `@`-prefixed dynamic form
    fn resolve_attribute(&self, name: &str) -> Option<&Value> {
        self.get_attribute(name)
            .or_else(|| self.get_attribute(&format!("{}{}", DYNAMIC_PREFIX, name)))
    }

    /// Native member listing. Implementations may refuse malformed objects;
    /// callers are expected to fall back to [`DynamicObject::attribute_walk`].
    fn to_dict(&self) -> Result<Vec<(&str, &Value)>, GraphError> {
        Ok(self.attribute_walk())
    }

    /// Manual member listing driven by `attribute_names` / `get_attribute`
    fn attribute_walk(&self) -> Vec<(&str, &Value)> {
        self.attribute_names()
            .into_iter()
            .filter_map(|name| self.get_attribute(name).map(|value| (name, value)))
            .collect()
    }
}

impl DynamicObject for Base {
    fn get_attribute(&self, name: &str) -> Option<&Value> {
        self.members().get(name)
    }

    fn attribute_names(&self) -> Vec<&str> {
        self.members().keys().collect()
    }

    fn id(&self) -> Option<&str> {
        Base::id(self)
    }

    fn speckle_type(&self) -> &str {
        Base::speckle_type(self)
    }

    /// Reserved attributes first (`id`, `speckle_type`), then the rest in storage order
    fn to_dict(&self) -> Result<Vec<(&str, &Value)>, GraphError> {
        let mut out = Vec::with_capacity(self.members().len());
        for reserved in ["id", "speckle_type"] {
            match self.members().get(reserved) {
                Some(value @ Value::String(_)) => out.push((reserved, value)),
                Some(Value::Null) | None => {}
                Some(other) => {
                    return Err(GraphError::MalformedObject {
                        attribute: reserved.to_string(),
                        reason: format!("must be a string, found {}", other),
                    })
                }
            }
        }
        out.extend(
            self.members()
                .iter()
                .filter(|(name, _)| *name != "id" && *name != "speckle_type"),
        );
        Ok(out)
    }
}

/// The single classification step every walk goes through
#[derive(Debug, Clone, Copy)]
pub enum Node<'g> {
    /// null, boolean, integer, finite float or string
    Scalar(&'g Value),
    Sequence(&'g [Value]),
    Mapping(&'g Members),
    Object(&'g Base),
    /// Non-finite floats and references the graph cannot resolve
    Unknown(&'g Value),
}

/// JSON form of a scalar. Callers only pass values classified as [`Node::Scalar`].
pub fn scalar_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(f.to_string())),
        Value::String(s) => JsonValue::String(s.clone()),
        other => JsonValue::String(other.to_string()),
    }
}

/// Placeholder emitted instead of a node that must not be expanded
pub fn reference_stub(id: Option<&str>) -> JsonValue {
    let mut stub = serde_json::Map::new();
    stub.insert("id".to_string(), json!(id));
    stub.insert(REFERENCE_MARKER_KEY.to_string(), json!(REFERENCE_MARKER));
    JsonValue::Object(stub)
}
