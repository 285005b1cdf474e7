// Error types for object graph decoding, path navigation and geometry queries

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("object of type {0} has no id and cannot be stored in the graph")]
    MissingId(String),

    #[error("root object {0} was not received")]
    MissingRoot(String),

    #[error("malformed object: attribute '{attribute}' {reason}")]
    MalformedObject { attribute: String, reason: String },

    #[error("invalid wire payload: {0}")]
    InvalidWire(String),
}

/// Failure to resolve a dot path. Both variants carry the sub-path consumed so far.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Index {index} out of range at path '{path}'")]
    IndexOutOfRange { index: usize, path: String },

    #[error("Property '{segment}' not found at path '{path}'")]
    PropertyNotFound { segment: String, path: String },
}

impl PathError {
    /// The prefix of the requested path at which resolution stopped
    pub fn path(&self) -> &str {
        match self {
            PathError::IndexOutOfRange { path, .. } | PathError::PropertyNotFound { path, .. } => {
                path
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("Unknown geometry type '{0}'. Expected one of: all, mesh, point, line, curve")]
    UnknownKind(String),
}
