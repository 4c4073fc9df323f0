//! Serializable node records and synchronization events.
//!
//! A [`NodeRecord`] captures everything needed to rebuild one node: its id,
//! kind, place in the tree, own model values, clone relationship, and custom
//! properties. [`SceneGraph::snapshot`](crate::SceneGraph::snapshot) produces
//! records in an order that [`SceneGraph::restore`](crate::SceneGraph::restore)
//! can replay.
//!
//! [`SyncEvent`]s are the notifications an external synchronization layer
//! delivers when another replica changed. They are applied as facts: the
//! cascades they caused on the other side arrive as events of their own, so
//! applying them never mirrors structure.

use serde::{Deserialize, Serialize};

use crate::clone_info::CloneMode;
use crate::custom_props::CustomProperty;
use crate::id::NodeId;
use crate::value::{Value, Values};

/// The clone relationship of a recorded node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneRecord {
    /// The clone mode.
    #[serde(default)]
    pub mode: CloneMode,
    /// The node it was cloned from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloner: Option<NodeId>,
    /// Nodes cloned from it, in registration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cloned: Vec<NodeId>,
}

/// One custom property assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    /// The model key.
    pub key: String,
    /// The assigned property name.
    pub property: String,
}

/// Serialized form of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// The node id.
    pub id: NodeId,
    /// The kind tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// The display name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// The parent, if attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    /// Position among the parent's children.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// Own model values.
    #[serde(default, skip_serializing_if = "Values::is_empty")]
    pub values: Values,
    /// The clone relationship.
    #[serde(default)]
    pub clone: CloneRecord,
    /// Custom properties defined on the node itself.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_properties: Vec<CustomProperty>,
    /// Assignments made on the node itself.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignments: Vec<AssignmentRecord>,
}

impl NodeRecord {
    /// A bare record for a detached original node.
    pub fn new(id: NodeId, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            name: String::new(),
            parent: None,
            index: None,
            values: Values::new(),
            clone: CloneRecord::default(),
            custom_properties: Vec::new(),
            assignments: Vec::new(),
        }
    }
}

/// A change made on another replica.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    /// A node was created.
    NodeCreated {
        /// The new node.
        record: NodeRecord,
    },
    /// A node was deleted.
    NodeRemoved {
        /// The deleted node.
        id: NodeId,
    },
    /// A child was attached.
    ChildAdded {
        /// The parent.
        parent: NodeId,
        /// The child.
        child: NodeId,
        /// Position among the parent's children; appended when absent.
        #[serde(default)]
        index: Option<usize>,
    },
    /// A child was detached.
    ChildRemoved {
        /// The parent.
        parent: NodeId,
        /// The child.
        child: NodeId,
    },
    /// A model value was written.
    ValueChanged {
        /// The node.
        id: NodeId,
        /// The model key.
        key: String,
        /// The written value.
        value: Value,
    },
    /// A custom property was defined or redefined.
    CustomPropertyDefined {
        /// The defining node.
        id: NodeId,
        /// The definition.
        property: CustomProperty,
    },
    /// A custom property definition was removed.
    CustomPropertyRemoved {
        /// The defining node.
        id: NodeId,
        /// The property name.
        name: String,
    },
    /// A model key was assigned to a custom property.
    CustomPropertyAssigned {
        /// The node.
        id: NodeId,
        /// The model key.
        key: String,
        /// The property name.
        name: String,
    },
    /// An assignment was removed.
    CustomPropertyUnassigned {
        /// The node.
        id: NodeId,
        /// The model key.
        key: String,
    },
}

impl SyncEvent {
    /// The node the event is about.
    pub fn node(&self) -> NodeId {
        match self {
            Self::NodeCreated { record } => record.id,
            Self::ChildAdded { child, .. } | Self::ChildRemoved { child, .. } => *child,
            Self::NodeRemoved { id }
            | Self::ValueChanged { id, .. }
            | Self::CustomPropertyDefined { id, .. }
            | Self::CustomPropertyRemoved { id, .. }
            | Self::CustomPropertyAssigned { id, .. }
            | Self::CustomPropertyUnassigned { id, .. } => *id,
        }
    }
}
