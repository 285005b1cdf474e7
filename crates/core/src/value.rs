// Domain values and objects of a Speckle object graph

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::fmt;

/// Attributes starting with this marker stay internal and are never serialized
pub const INTERNAL_PREFIX: char = '_';

/// Prefix Speckle uses for dynamic (detachable) attributes, e.g. `@elements`
pub const DYNAMIC_PREFIX: char = '@';

/// Returns true for attributes such as `__closure` or `_chunkable`
pub fn is_internal(name: &str) -> bool {
    name.starts_with(INTERNAL_PREFIX)
}

/// Insertion-ordered attribute store.
///
/// Replacing an existing name keeps its original position, so the order in
/// which attributes were received is the order in which they are emitted.
#[derive(Debug, Clone, Default)]
pub struct Members {
    entries: IndexMap<String, Value>,
}

impl Members {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Insert or replace an entry, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.entries
            .iter_mut()
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

// Attribute order is part of an object's identity.
impl PartialEq for Members {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.iter().eq(other.iter())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Members {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut members = Members {
            entries: IndexMap::with_capacity(iter.size_hint().0),
        };
        for (name, value) in iter {
            members.insert(name, value);
        }
        members
    }
}

impl IntoIterator for Members {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A value held by a Domain Object attribute
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Members),
    Object(Box<Base>),
    /// Detached child stored in the graph arena under this id
    Reference(String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integral view of a number; floats qualify only without a fractional part
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Decode a value from the Speckle wire format.
    ///
    /// `{"referencedId": ..}` becomes a [`Value::Reference`], anything carrying a
    /// `speckle_type` becomes a [`Value::Object`], other JSON objects become maps.
    pub fn from_json(json: JsonValue) -> Value {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::List(items.into_iter().map(Value::from_json).collect()),
            JsonValue::Object(map) => {
                if let Some(JsonValue::String(id)) = map.get("referencedId") {
                    return Value::Reference(id.clone());
                }
                if map.contains_key("speckle_type") {
                    return Value::Object(Box::new(Base::from_wire(map)));
                }
                Value::Map(
                    map.into_iter()
                        .map(|(key, value)| (key, Value::from_json(value)))
                        .collect(),
                )
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => write!(f, "<list of {} items>", items.len()),
            Value::Map(members) => write!(f, "<map of {} entries>", members.len()),
            Value::Object(base) => match base.id() {
                Some(id) => write!(f, "<{} {}>", base.speckle_type(), id),
                None => write!(f, "<{}>", base.speckle_type()),
            },
            Value::Reference(id) => write!(f, "<reference {}>", id),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Members> for Value {
    fn from(members: Members) -> Self {
        Value::Map(members)
    }
}

impl From<Base> for Value {
    fn from(base: Base) -> Self {
        Value::Object(Box::new(base))
    }
}

/// A Domain Object: a dynamically shaped node of the object graph.
///
/// The reserved `id` and `speckle_type` attributes live in the same store as
/// every other attribute; the accessors below only give them a typed view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Base {
    members: Members,
}

impl Base {
    pub fn new(speckle_type: impl Into<String>) -> Self {
        let mut members = Members::new();
        members.insert("speckle_type", Value::String(speckle_type.into()));
        Self { members }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.members.insert("id", Value::String(id.into()));
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members.insert(name, value.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.members.insert(name, value.into());
    }

    pub fn id(&self) -> Option<&str> {
        self.members.get("id").and_then(Value::as_str)
    }

    pub fn speckle_type(&self) -> &str {
        self.members
            .get("speckle_type")
            .and_then(Value::as_str)
            .unwrap_or("Base")
    }

    pub fn units(&self) -> Option<&str> {
        self.members.get("units").and_then(Value::as_str)
    }

    pub fn members(&self) -> &Members {
        &self.members
    }

    pub(crate) fn members_mut(&mut self) -> &mut Members {
        &mut self.members
    }

    /// Build an object from a decoded wire payload
    pub fn from_wire(map: serde_json::Map<String, JsonValue>) -> Self {
        Self {
            members: map
                .into_iter()
                .map(|(key, value)| (key, Value::from_json(value)))
                .collect(),
        }
    }
}
