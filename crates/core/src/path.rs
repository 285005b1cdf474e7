// Dot-path navigation into an object graph ("elements.0.name")

use crate::error::PathError;
use crate::graph::ObjectGraph;
use crate::node::{DynamicObject, Node};
use crate::value::Value;

/// Resolve `path` against `root`.
///
/// Segments are split on `.`. A digit-only segment indexes into a sequence;
/// otherwise it names a mapping key or an object attribute (exact name first,
/// then the `@`-prefixed dynamic attribute). Errors carry the sub-path
/// consumed up to and including the failing segment.
pub fn resolve<'g>(
    graph: &'g ObjectGraph,
    root: &'g Value,
    path: &str,
) -> Result<&'g Value, PathError> {
    let mut current = root;
    let mut path_so_far = String::with_capacity(path.len());

    for (i, segment) in path.split('.').enumerate() {
        if i > 0 {
            path_so_far.push('.');
        }
        path_so_far.push_str(segment);

        current = match graph.classify(current) {
            Node::Sequence(items) if is_index(segment) => {
                // digit runs too long for usize are out of range anyway
                let index = segment.parse::<usize>().unwrap_or(usize::MAX);
                items.get(index).ok_or_else(|| PathError::IndexOutOfRange {
                    index,
                    path: path_so_far.clone(),
                })?
            }
            Node::Mapping(members) if members.contains_key(segment) => members
                .get(segment)
                .ok_or_else(|| not_found(segment, &path_so_far))?,
            Node::Object(base) => base
                .resolve_attribute(segment)
                .ok_or_else(|| not_found(segment, &path_so_far))?,
            _ => return Err(not_found(segment, &path_so_far)),
        };
    }

    Ok(current)
}

impl ObjectGraph {
    /// Resolve a dot path starting at the graph root
    pub fn resolve(&self, path: &str) -> Result<&Value, PathError> {
        resolve(self, self.root(), path)
    }
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn not_found(segment: &str, path: &str) -> PathError {
    PathError::PropertyNotFound {
        segment: segment.to_string(),
        path: path.to_string(),
    }
}
