//! Notifications published by a [`SceneGraph`](crate::SceneGraph).

use crate::id::NodeId;
use crate::signal::{Signal, SignalEmitter};
use crate::value::Value;

/// A resolved model value changed for a node.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
    /// The node observing the changed model.
    pub node: NodeId,
    /// The model key.
    pub key: String,
    /// The written value.
    pub value: Value,
    /// The resolved value before the write.
    pub old_value: Value,
}

/// A structural edit: `child` was attached to or detached from `parent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildEvent {
    /// The parent node.
    pub parent: NodeId,
    /// The child node.
    pub child: NodeId,
    /// The child's index at the time of the event.
    pub index: usize,
}

/// Every signal a graph emits.
///
/// All signals are emitted synchronously from inside the graph call that
/// caused them.
#[derive(Default)]
pub struct GraphSignals {
    /// A node was constructed (authored, cloned, or restored).
    pub node_created: Signal<NodeId>,
    /// A child was attached.
    pub child_added: Signal<ChildEvent>,
    /// A child was detached.
    pub child_removed: Signal<ChildEvent>,
    /// A model value changed, once per observing node.
    pub value_changed: Signal<ValueChange>,
    /// A node's resolved state changed and its view was refreshed.
    pub node_changed: Signal<NodeId>,
    /// A node's custom properties or assignments changed.
    pub custom_properties_changed: Signal<NodeId>,
    /// A node left its clone relationship.
    pub unlinked: Signal<NodeId>,
    /// A node was disposed.
    pub disposed: Signal<NodeId>,
}

impl GraphSignals {
    /// Create a bundle with no connections.
    pub fn new() -> Self {
        Self::default()
    }

    fn all(&self) -> [&dyn SignalEmitter; 8] {
        [
            &self.node_created,
            &self.child_added,
            &self.child_removed,
            &self.value_changed,
            &self.node_changed,
            &self.custom_properties_changed,
            &self.unlinked,
            &self.disposed,
        ]
    }

    /// Block or unblock every signal.
    pub fn set_blocked(&self, blocked: bool) {
        for signal in self.all() {
            signal.set_blocked(blocked);
        }
    }

    /// Disconnect every slot from every signal.
    pub fn disconnect_all(&self) {
        for signal in self.all() {
            signal.disconnect_all();
        }
    }

    /// Total number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.all().iter().map(|s| s.connection_count()).sum()
    }
}
