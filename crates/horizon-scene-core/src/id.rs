//! Node identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};

/// A unique identifier for a node in a [`SceneGraph`](crate::SceneGraph).
///
/// Ids are assigned at creation by the graph's [`IdGenerator`] and are never
/// reused, even after the node is disposed. Because they are plain integers
/// they survive serialization, which lets the sync layer refer to the same
/// node across processes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Convert the NodeId to a raw u64 value.
    #[inline]
    pub fn as_raw(self) -> u64 {
        self.0
    }

    /// Create a NodeId from a raw u64 value.
    ///
    /// This does not check that the node exists in any graph.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id source owned by a graph.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    /// Create a generator whose first id is `#1`.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate the next id.
    ///
    /// `u64::MAX` is never handed out; reaching it fails.
    pub fn next_id(&mut self) -> SceneResult<NodeId> {
        let id = NodeId(self.next);
        self.next = self.next.checked_add(1).ok_or_else(|| exhausted(id))?;
        Ok(id)
    }

    /// Make sure ids handed out later never collide with `id`.
    ///
    /// Used when nodes are restored with ids chosen by someone else. Fails
    /// for the last representable id, which would leave nothing to hand out.
    pub fn reserve(&mut self, id: NodeId) -> SceneResult<()> {
        if id.0 < self.next {
            return Ok(());
        }
        self.next = id.0.checked_add(1).ok_or_else(|| exhausted(id))?;
        Ok(())
    }

    /// The id the next call to [`next_id`](Self::next_id) will return.
    pub fn peek(&self) -> NodeId {
        NodeId(self.next)
    }
}

fn exhausted(id: NodeId) -> SceneError {
    SceneError::invalid(format!("node id {id} exhausts the id space"))
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
