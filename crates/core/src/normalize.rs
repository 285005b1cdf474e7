// Unbounded JSON conversion of a single resolved value

use crate::graph::ObjectGraph;
use crate::node::{reference_stub, scalar_to_json, DynamicObject, Node};
use crate::value::{is_internal, Base, Value};
use serde_json::{Map, Value as JsonValue};

/// Convert `value` into JSON without depth limit or truncation.
///
/// Objects lose their internal (`_`-prefixed) attributes. An object that is
/// already being expanded further up the chain is emitted as a reference stub.
pub fn normalize(graph: &ObjectGraph, value: &Value) -> JsonValue {
    let mut ancestors = Vec::new();
    normalize_value(graph, value, &mut ancestors)
}

fn normalize_value<'g>(
    graph: &'g ObjectGraph,
    value: &'g Value,
    ancestors: &mut Vec<&'g Base>,
) -> JsonValue {
    match graph.classify(value) {
        Node::Object(base) => {
            if ancestors.iter().any(|a| std::ptr::eq(*a, base)) {
                return reference_stub(base.id());
            }
            ancestors.push(base);
            let map: Map<String, JsonValue> = base
                .attribute_walk()
                .into_iter()
                .filter(|(name, _)| !is_internal(name))
                .map(|(name, attr)| (name.to_string(), normalize_value(graph, attr, ancestors)))
                .collect();
            ancestors.pop();
            JsonValue::Object(map)
        }
        Node::Sequence(items) => JsonValue::Array(
            items
                .iter()
                .map(|item| normalize_value(graph, item, ancestors))
                .collect(),
        ),
        Node::Mapping(members) => JsonValue::Object(
            members
                .iter()
                .map(|(key, item)| (key.to_string(), normalize_value(graph, item, ancestors)))
                .collect(),
        ),
        Node::Scalar(scalar) => scalar_to_json(scalar),
        Node::Unknown(other) => JsonValue::String(other.to_string()),
    }
}
