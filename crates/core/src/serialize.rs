// Depth- and size-bounded JSON serialization of an object graph

use crate::graph::ObjectGraph;
use crate::node::{reference_stub, scalar_to_json, DynamicObject, Node};
use crate::value::{is_internal, Base, Value};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use tracing::warn;

/// Key of the truncation sentinel
pub const NOTE_KEY: &str = "_note";

/// Policy knobs of the graph serializer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Deepest level that is still expanded; the root sits at depth 0
    pub max_depth: usize,
    /// Sequences and mappings keep at most this many entries
    pub truncation_width: usize,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            truncation_width: 5,
        }
    }
}

/// Walks an [`ObjectGraph`] and produces its bounded JSON form.
///
/// Depth grows by one on every edge: object attribute, sequence element and
/// mapping value alike. Anything found deeper than `max_depth` is replaced by
/// a reference stub unless children were explicitly requested, in which case
/// only objects re-entered through a cycle are stubbed.
pub struct GraphSerializer<'g> {
    graph: &'g ObjectGraph,
    config: SerializerConfig,
    include_children: bool,
}

impl<'g> GraphSerializer<'g> {
    pub fn new(graph: &'g ObjectGraph, config: SerializerConfig) -> Self {
        Self {
            graph,
            config,
            include_children: false,
        }
    }

    pub fn include_children(mut self, include: bool) -> Self {
        self.include_children = include;
        self
    }

    pub fn serialize(&self, value: &'g Value) -> JsonValue {
        let mut ancestors = Vec::new();
        self.walk(value, 0, &mut ancestors)
    }

    pub fn serialize_root(&self) -> JsonValue {
        self.serialize(self.graph.root())
    }

    fn walk(&self, value: &'g Value, depth: usize, ancestors: &mut Vec<&'g Base>) -> JsonValue {
        let node = self.graph.classify(value);

        if !self.include_children && depth > self.config.max_depth {
            let id = match node {
                Node::Object(base) => base.id(),
                _ => None,
            };
            return reference_stub(id);
        }

        match node {
            Node::Object(base) => self.walk_object(base, depth, ancestors),
            Node::Sequence(items) => {
                let width = self.config.truncation_width;
                let mut out: Vec<JsonValue> = items
                    .iter()
                    .take(width)
                    .map(|item| self.walk(item, depth + 1, ancestors))
                    .collect();
                if items.len() > width {
                    let mut note = Map::new();
                    note.insert(NOTE_KEY.to_string(), json!(more_items(items.len() - width)));
                    out.push(JsonValue::Object(note));
                }
                JsonValue::Array(out)
            }
            Node::Mapping(members) => {
                let width = self.config.truncation_width;
                let mut out: Map<String, JsonValue> = members
                    .iter()
                    .take(width)
                    .map(|(key, item)| (key.to_string(), self.walk(item, depth + 1, ancestors)))
                    .collect();
                if members.len() > width {
                    out.insert(NOTE_KEY.to_string(), json!(more_items(members.len() - width)));
                }
                JsonValue::Object(out)
            }
            Node::Scalar(scalar) => scalar_to_json(scalar),
            Node::Unknown(other) => JsonValue::String(other.to_string()),
        }
    }

    fn walk_object(
        &self,
        base: &'g Base,
        depth: usize,
        ancestors: &mut Vec<&'g Base>,
    ) -> JsonValue {
        if ancestors.iter().any(|a| std::ptr::eq(*a, base)) {
            return reference_stub(base.id());
        }

        let attributes = match base.to_dict() {
            Ok(attributes) => attributes,
            Err(e) => {
                warn!(
                    id = ?base.id(),
                    speckle_type = base.speckle_type(),
                    error = %e,
                    "Native object serialization failed, falling back to attribute walk"
                );
                base.attribute_walk()
            }
        };

        ancestors.push(base);
        let map: Map<String, JsonValue> = attributes
            .into_iter()
            .filter(|(name, _)| !is_internal(name))
            .map(|(name, attr)| (name.to_string(), self.walk(attr, depth + 1, ancestors)))
            .collect();
        ancestors.pop();

        JsonValue::Object(map)
    }
}

/// Serialize `value` with the given policy
pub fn serialize(
    graph: &ObjectGraph,
    value: &Value,
    config: SerializerConfig,
    include_children: bool,
) -> JsonValue {
    GraphSerializer::new(graph, config)
        .include_children(include_children)
        .serialize(value)
}

fn more_items(count: usize) -> String {
    format!("...{} more items", count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Members;

    fn defaults() -> SerializerConfig {
        SerializerConfig::default()
    }

    /// Deepest nesting level reached by anything other than a reference stub
    fn expanded_depth(json: &JsonValue, depth: usize) -> usize {
        let is_stub = json.get("_type") == Some(&json!("reference"));
        match json {
            JsonValue::Object(map) if !is_stub => map
                .values()
                .map(|v| expanded_depth(v, depth + 1))
                .max()
                .unwrap_or(depth),
            JsonValue::Array(items) => items
                .iter()
                .map(|v| expanded_depth(v, depth + 1))
                .max()
                .unwrap_or(depth),
            JsonValue::Object(_) => depth.saturating_sub(1),
            _ => depth,
        }
    }

    #[test]
    fn test_wall_elements_are_truncated_with_sentinel() {
        let wall = Base::new("Objects.BuiltElements.Wall")
            .with_id("wall")
            .with("name", "Wall")
            .with("elements", vec![1, 2, 3, 4, 5, 6, 7]);
        let graph = ObjectGraph::new(wall);

        let json = serialize(&graph, graph.root(), defaults(), false);
        assert_eq!(json["name"], json!("Wall"));
        assert_eq!(
            json["elements"],
            json!([1, 2, 3, 4, 5, {"_note": "...2 more items"}])
        );
    }

    #[test]
    fn test_collections_within_width_are_lossless() {
        let graph = ObjectGraph::default();
        let list = Value::from(vec![1, 2, 3, 4, 5]);

        let json = serialize(&graph, &list, defaults(), false);
        assert_eq!(json, json!([1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_mapping_truncation_uses_note_key() {
        let graph = ObjectGraph::default();
        let members: Members = (0..8).map(|i| (format!("k{}", i), Value::from(i))).collect();

        let json = serialize(&graph, &Value::Map(members), defaults(), false);
        let map = json.as_object().unwrap();
        assert_eq!(map.len(), 6);
        assert_eq!(map["k4"], json!(4));
        assert!(!map.contains_key("k5"));
        assert_eq!(map["_note"], json!("...3 more items"));
    }

    #[test]
    fn test_nodes_beyond_max_depth_become_stubs() {
        let leaf = Base::new("Base").with_id("leaf").with("value", 1);
        let mid = Base::new("Base").with_id("mid").with("child", leaf);
        let root = Base::new("Base").with_id("root").with("child", mid);
        let graph = ObjectGraph::new(root);

        let config = SerializerConfig {
            max_depth: 1,
            ..defaults()
        };
        let json = serialize(&graph, graph.root(), config, false);
        assert_eq!(json["id"], json!("root"));
        assert_eq!(json["child"]["child"], json!({"id": "leaf", "_type": "reference"}));
        // scalars past the bound are stubbed too
        assert_eq!(json["child"]["id"], json!({"id": null, "_type": "reference"}));

        let json = serialize(&graph, graph.root(), defaults(), false);
        assert_eq!(json["child"]["child"]["id"], json!({"id": null, "_type": "reference"}));
        assert_eq!(json["child"]["id"], json!("mid"));
    }

    #[test]
    fn test_no_expanded_node_exceeds_max_depth() {
        let mut nested = Value::from(vec![1, 2]);
        for i in 0..6 {
            nested = Base::new("Base")
                .with_id(format!("n{}", i))
                .with("items", vec![nested, Value::Int(i)])
                .into();
        }
        let graph = ObjectGraph::new(nested);

        for max_depth in 0..4 {
            let config = SerializerConfig {
                max_depth,
                ..defaults()
            };
            let json = serialize(&graph, graph.root(), config, false);
            assert!(expanded_depth(&json, 0) <= max_depth, "max_depth {}", max_depth);
        }
    }

    #[test]
    fn test_include_children_expands_everything_and_stubs_cycles() {
        let a = Base::new("Base")
            .with_id("a")
            .with("next", Value::Reference("b".into()));
        let b = Base::new("Base")
            .with_id("b")
            .with("next", Value::Reference("c".into()));
        let c = Base::new("Base")
            .with_id("c")
            .with("next", Value::Reference("a".into()));
        let graph = ObjectGraph::new(Value::Reference("a".into()))
            .with_object(a)
            .unwrap()
            .with_object(b)
            .unwrap()
            .with_object(c)
            .unwrap();

        let config = SerializerConfig {
            max_depth: 0,
            ..defaults()
        };
        let json = GraphSerializer::new(&graph, config)
            .include_children(true)
            .serialize_root();
        assert_eq!(json["next"]["next"]["id"], json!("c"));
        assert_eq!(
            json["next"]["next"]["next"],
            json!({"id": "a", "_type": "reference"})
        );
    }

    #[test]
    fn test_internal_attributes_are_skipped() {
        let root = Base::new("Base")
            .with_id("r")
            .with("__closure", Members::new())
            .with("_chunkable", true)
            .with("name", "kept");
        let graph = ObjectGraph::new(root);

        let json = serialize(&graph, graph.root(), defaults(), false);
        assert_eq!(json, json!({"id": "r", "speckle_type": "Base", "name": "kept"}));
    }

    #[test]
    fn test_reserved_attributes_come_first() {
        let root = Base::default()
            .with("name", "x")
            .with("speckle_type", "Base")
            .with("id", "r");
        let graph = ObjectGraph::new(root);

        let json = serialize(&graph, graph.root(), defaults(), false);
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["id", "speckle_type", "name"]);
    }

    #[test]
    fn test_malformed_object_falls_back_to_attribute_walk() {
        let root = Base::new("Base").with("id", 42).with("name", "odd");
        let graph = ObjectGraph::new(root);

        let json = serialize(&graph, graph.root(), defaults(), false);
        assert_eq!(json["id"], json!(42));
        assert_eq!(json["name"], json!("odd"));
    }

    #[test]
    fn test_unknown_values_degrade_to_strings() {
        let root = Base::new("Base")
            .with_id("r")
            .with("ratio", f64::NAN)
            .with("lost", Value::Reference("missing".into()));
        let graph = ObjectGraph::new(root);

        let json = serialize(&graph, graph.root(), defaults(), false);
        assert_eq!(json["ratio"], json!("NaN"));
        assert_eq!(json["lost"], json!("<reference missing>"));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: SerializerConfig = serde_json::from_value(json!({"max_depth": 4})).unwrap();
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.truncation_width, 5);
    }
}
