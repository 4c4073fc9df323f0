//! Error types for Horizon Scene.

use crate::id::NodeId;
use crate::value::PropertyType;

/// The main error type for scene graph operations.
///
/// Every structural, model, and clone operation reports failures through this
/// type. Errors are returned synchronously from the triggering call and are
/// never retried internally.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    /// The requested operation is not valid for the given nodes.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Attaching would make a node its own ancestor.
    #[error("Cannot attach {child} under {parent}: {child} is an ancestor of {parent}")]
    CircularParentage {
        /// The node being attached.
        child: NodeId,
        /// The requested parent.
        parent: NodeId,
    },

    /// The node does not exist in the graph.
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    /// The node is not a current child of the given parent.
    #[error("Node {child} is not a child of {parent}")]
    NotAChild {
        /// The parent that was searched.
        parent: NodeId,
        /// The node that was expected to be a child.
        child: NodeId,
    },

    /// No custom property with this name is visible from the node.
    #[error("Custom property '{name}' is not visible from node {node}")]
    PropertyNotFound {
        /// The node the lookup started from.
        node: NodeId,
        /// The property name.
        name: String,
    },

    /// The model key has no assignment on the node.
    #[error("Model key '{key}' has no custom property assignment on node {node}")]
    AssignmentNotFound {
        /// The node that was searched.
        node: NodeId,
        /// The model key.
        key: String,
    },

    /// Internal model handle is stale.
    #[error("Model not found")]
    ModelNotFound,

    /// No node kind is registered under this tag.
    #[error("Unknown node kind '{0}'")]
    UnknownKind(String),

    /// A singleton-style root was accessed before it was set.
    #[error("{0} has not been initialized")]
    NotInitialized(&'static str),

    /// A key that the schema does not declare was read or written.
    #[error("Key '{key}' is not declared by the '{schema}' schema")]
    SchemaViolation {
        /// The schema name.
        schema: String,
        /// The undeclared key.
        key: String,
    },

    /// A custom property value does not match the property type.
    #[error("Custom property '{name}' expects {expected:?}, got {got}")]
    PropertyTypeMismatch {
        /// The property name.
        name: String,
        /// The declared type.
        expected: PropertyType,
        /// Description of the value provided.
        got: &'static str,
    },

    /// A node with this id already exists.
    #[error("Node id {0} is already in use")]
    DuplicateId(NodeId),

    /// A mirroring cascade nested deeper than the configured limit.
    #[error("Clone depth limit of {limit} exceeded")]
    CloneDepthExceeded {
        /// The configured limit.
        limit: usize,
    },
}

impl SceneError {
    /// Create an invalid-operation error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }

    /// Returns `true` for the errors reporting a missing node, child,
    /// property, assignment, or model.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NodeNotFound(_)
                | Self::NotAChild { .. }
                | Self::PropertyNotFound { .. }
                | Self::AssignmentNotFound { .. }
                | Self::ModelNotFound
        )
    }
}

/// A specialized Result type for scene graph operations.
pub type SceneResult<T> = std::result::Result<T, SceneError>;
