//! Structural operations: attaching, detaching, and walking nodes.

use crate::error::{SceneError, SceneResult};
use crate::events::ChildEvent;
use crate::id::NodeId;

use super::{Node, SceneGraph, TARGET};

/// Direction of a [`SceneGraph::walk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkDirection {
    /// Pre-order over descendants.
    #[default]
    Down,
    /// From the node towards the root.
    Up,
}

/// Options for [`SceneGraph::walk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    /// Visit the starting node itself.
    pub include_self: bool,
    /// Walk direction.
    pub direction: WalkDirection,
    /// Stop descending (or ascending) past this distance from the start.
    pub max_depth: Option<usize>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            include_self: true,
            direction: WalkDirection::Down,
            max_depth: None,
        }
    }
}

impl WalkOptions {
    /// Pre-order over the subtree, including the start.
    pub fn down() -> Self {
        Self::default()
    }

    /// Towards the root, including the start.
    pub fn up() -> Self {
        Self {
            direction: WalkDirection::Up,
            ..Self::default()
        }
    }

    /// Skip the starting node.
    pub fn excluding_self(mut self) -> Self {
        self.include_self = false;
        self
    }

    /// Limit the walk to `depth` steps from the start.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

/// Visitor verdict for [`SceneGraph::walk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Keep going.
    Continue,
    /// Cancel the walk.
    Stop,
}

/// Whether a structural edit runs the clone machinery.
///
/// `Full` mirrors the edit into dependents and runs the reference hooks.
/// `Silent` only updates the tree and emits the child signals; restores and
/// replayed sync events use it because their cascades were already recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Propagation {
    Full,
    Silent,
}

/// Why a child leaves its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Detach {
    /// Reattached elsewhere right after.
    Move,
    /// Removed from the tree.
    Remove,
}

impl SceneGraph {
    /// Attach `child` as the last child of `parent`.
    ///
    /// Equivalent to `set_parent(child, parent)`; detaches `child` from its
    /// current parent first. Adding a node to itself is an
    /// [`InvalidOperation`](SceneError::InvalidOperation).
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        if parent == child {
            return Err(SceneError::invalid(format!("cannot add {child} to itself")));
        }
        self.set_parent(child, parent)
    }

    /// Attach `child` under `parent`, at the end of its children.
    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) -> SceneResult<()> {
        self.attach(child, parent, None, Propagation::Full)
    }

    /// Attach `child` under `parent` at `index`, clamped to the child count.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> SceneResult<()> {
        if parent == child {
            return Err(SceneError::invalid(format!("cannot add {child} to itself")));
        }
        self.attach(child, parent, Some(index), Propagation::Full)
    }

    /// Detach `child` from `parent`.
    ///
    /// The child stays alive as a detached node. Fails with
    /// [`NotAChild`](SceneError::NotAChild) if it is not a current child.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        self.node(child)?;
        if !self.node(parent)?.children.contains(&child) {
            return Err(SceneError::NotAChild { parent, child });
        }
        self.detach(child, Detach::Remove, Propagation::Full)
    }

    /// Remove the node from its parent and dispose it.
    ///
    /// No-op for detached nodes.
    pub fn delete_self(&mut self, id: NodeId) -> SceneResult<()> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(());
        };
        self.remove_child(parent, id)?;
        if self.contains_node(id) {
            self.dispose(id)?;
        }
        Ok(())
    }

    pub(crate) fn attach(
        &mut self,
        child: NodeId,
        parent: NodeId,
        index: Option<usize>,
        propagation: Propagation,
    ) -> SceneResult<()> {
        self.node(child)?;
        self.node(parent)?;
        if child == parent || self.contains(child, parent)? {
            return Err(SceneError::CircularParentage { child, parent });
        }

        let previous = self.position(child)?;
        if previous.is_some() {
            if let Err(err) = self.detach(child, Detach::Move, propagation) {
                self.restore_position(child, previous)?;
                return Err(err);
            }
        }

        let parent_node = self.node_mut(parent)?;
        let index = index
            .unwrap_or(parent_node.children.len())
            .min(parent_node.children.len());
        parent_node.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        tracing::debug!(target: TARGET, %parent, %child, index, "child added");

        self.signals.child_added.emit(ChildEvent { parent, child, index });
        if propagation == Propagation::Full {
            let mark = self.ids.peek();
            if let Err(err) = self.propagate_added(parent, child) {
                self.discard_created_since(mark);
                self.restore_position(child, previous)?;
                return Err(err);
            }
        }
        Ok(())
    }

    fn propagate_added(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        if self.config.mirror_structure {
            self.mirror_child_added(parent, child)?;
        }
        self.on_added_to_parent(child, parent)
    }

    /// The parent of `child` and its index there.
    fn position(&self, child: NodeId) -> SceneResult<Option<(NodeId, usize)>> {
        let Some(parent) = self.node(child)?.parent else {
            return Ok(None);
        };
        let index = self
            .node(parent)?
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(SceneError::NotAChild { parent, child })?;
        Ok(Some((parent, index)))
    }

    /// Put `child` back where it was before a failed attach, without
    /// mirroring.
    fn restore_position(&mut self, child: NodeId, previous: Option<(NodeId, usize)>) -> SceneResult<()> {
        if !self.contains_node(child) {
            return Ok(());
        }
        self.detach(child, Detach::Move, Propagation::Silent)?;
        if let Some((parent, index)) = previous {
            if self.contains_node(parent) {
                self.attach(child, parent, Some(index), Propagation::Silent)?;
            }
        }
        tracing::debug!(target: TARGET, %child, ?previous, "attach rolled back");
        Ok(())
    }

    pub(crate) fn detach(&mut self, child: NodeId, reason: Detach, propagation: Propagation) -> SceneResult<()> {
        let Some(parent) = self.node(child)?.parent else {
            return Ok(());
        };
        let parent_node = self.node_mut(parent)?;
        let Some(index) = parent_node.children.iter().position(|&c| c == child) else {
            return Err(SceneError::NotAChild { parent, child });
        };
        parent_node.children.remove(index);
        self.node_mut(child)?.parent = None;
        tracing::debug!(target: TARGET, %parent, %child, index, ?reason, "child removed");

        self.signals.child_removed.emit(ChildEvent { parent, child, index });
        if propagation == Propagation::Full {
            if self.config.mirror_structure {
                self.mirror_child_removed(parent, child)?;
            }
            if reason == Detach::Remove {
                self.on_removed_from_parent(child)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The node's parent.
    pub fn parent(&self, id: NodeId) -> SceneResult<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    /// The node's ordered children.
    pub fn children(&self, id: NodeId) -> SceneResult<&[NodeId]> {
        Ok(&self.node(id)?.children)
    }

    /// Position of the node among its siblings, `None` if detached.
    pub fn sibling_index(&self, id: NodeId) -> SceneResult<Option<usize>> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(None);
        };
        Ok(self.node(parent)?.children.iter().position(|&c| c == id))
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> SceneResult<Vec<NodeId>> {
        let mut out = Vec::new();
        self.walk(id, WalkOptions::up().excluding_self(), |node, _| {
            out.push(node.id);
            Walk::Continue
        })?;
        Ok(out)
    }

    /// The node and its descendants in pre-order.
    pub fn depth_first_preorder(&self, id: NodeId) -> SceneResult<Vec<NodeId>> {
        let mut out = Vec::new();
        self.walk(id, WalkOptions::down(), |node, _| {
            out.push(node.id);
            Walk::Continue
        })?;
        Ok(out)
    }

    /// Every detached node, ascending by id.
    pub fn root_nodes(&self) -> Vec<NodeId> {
        let mut roots: Vec<_> = self
            .nodes
            .values()
            .filter(|n| n.parent.is_none())
            .map(|n| n.id)
            .collect();
        roots.sort_unstable();
        roots
    }

    /// Call `f` for each immediate child, in order.
    pub fn for_each(&self, parent: NodeId, mut f: impl FnMut(&Node)) -> SceneResult<()> {
        for child in &self.node(parent)?.children {
            f(self.node(*child)?);
        }
        Ok(())
    }

    /// Returns `true` if `node` is `ancestor` or lies beneath it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> SceneResult<bool> {
        self.node(ancestor)?;
        self.is_above(ancestor, node, WalkOptions::up())
    }

    /// Returns `true` if `ancestor` is a strict ancestor of `node`.
    pub fn has_parent(&self, node: NodeId, ancestor: NodeId) -> SceneResult<bool> {
        self.node(ancestor)?;
        self.is_above(ancestor, node, WalkOptions::up().excluding_self())
    }

    fn is_above(&self, ancestor: NodeId, node: NodeId, options: WalkOptions) -> SceneResult<bool> {
        let mut found = false;
        self.walk(node, options, |n, _| {
            if n.id == ancestor {
                found = true;
                Walk::Stop
            } else {
                Walk::Continue
            }
        })?;
        Ok(found)
    }

    /// Visit nodes starting at `start`.
    ///
    /// The visitor receives each node and its distance from `start`; returning
    /// [`Walk::Stop`] cancels the walk. Returns `false` if the walk was
    /// cancelled.
    pub fn walk<F>(&self, start: NodeId, options: WalkOptions, mut visitor: F) -> SceneResult<bool>
    where
        F: FnMut(&Node, usize) -> Walk,
    {
        self.node(start)?;
        match options.direction {
            WalkDirection::Down => Ok(self.walk_down(start, 0, &options, &mut visitor)? == Walk::Continue),
            WalkDirection::Up => {
                let mut depth = 0;
                let mut current = Some(start);
                if !options.include_self {
                    current = self.node(start)?.parent;
                    depth = 1;
                }
                while let Some(id) = current {
                    if options.max_depth.is_some_and(|max| depth > max) {
                        break;
                    }
                    let node = self.node(id)?;
                    if visitor(node, depth) == Walk::Stop {
                        return Ok(false);
                    }
                    current = node.parent;
                    depth += 1;
                }
                Ok(true)
            }
        }
    }

    fn walk_down<F>(&self, id: NodeId, depth: usize, options: &WalkOptions, visitor: &mut F) -> SceneResult<Walk>
    where
        F: FnMut(&Node, usize) -> Walk,
    {
        let node = self.node(id)?;
        if (depth > 0 || options.include_self) && visitor(node, depth) == Walk::Stop {
            return Ok(Walk::Stop);
        }
        if options.max_depth.is_some_and(|max| depth >= max) {
            return Ok(Walk::Continue);
        }
        for &child in &node.children {
            if self.walk_down(child, depth + 1, options, visitor)? == Walk::Stop {
                return Ok(Walk::Stop);
            }
        }
        Ok(Walk::Continue)
    }
}
