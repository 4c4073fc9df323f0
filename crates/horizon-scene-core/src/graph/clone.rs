//! Cloning, unlinking, structural mirroring, and disposal.

use crate::clone_info::{CloneInfo, CloneMode};
use crate::error::{SceneError, SceneResult};
use crate::id::NodeId;
use crate::logging::{PerfSpan, span_names};

use super::{SceneGraph, TARGET};

const CLONE_TARGET: &str = crate::logging::targets::CLONE;

impl SceneGraph {
    /// Clone `source` and its subtree in the given mode.
    ///
    /// The clone is returned detached. The top node of a `Reference` clone
    /// becomes a [`ReferenceRoot`](CloneMode::ReferenceRoot); its descendants
    /// are plain references sharing their source's model.
    pub fn clone_node(&mut self, source: NodeId, mode: CloneMode) -> SceneResult<NodeId> {
        if mode == CloneMode::Original {
            return Err(SceneError::invalid("cannot clone in Original mode"));
        }
        let _span = tracing::debug_span!(target: CLONE_TARGET, span_names::CLONE, %source, ?mode).entered();
        let _perf = PerfSpan::new("clone_node");
        let mark = self.ids.peek();
        let result = self.clone_subtree(source, mode, 0);
        if result.is_err() {
            self.discard_created_since(mark);
        }
        result
    }

    /// Run one mirror step of a clone cascade.
    ///
    /// Only mirror steps nest: a step attaches a copy, which mirrors into the
    /// dependents of its new parent, and so on down a chain of clones. The
    /// nesting fails once it reaches the configured limit. The depth of the
    /// subtree being copied does not count.
    fn guarded<T>(&mut self, source: NodeId, step: impl FnOnce(&mut Self) -> SceneResult<T>) -> SceneResult<T> {
        let limit = self.config.max_clone_depth;
        if self.clone_depth >= limit {
            tracing::warn!(target: CLONE_TARGET, %source, limit, "clone cascade limit reached");
            return Err(SceneError::CloneDepthExceeded { limit });
        }
        self.clone_depth += 1;
        let result = step(self);
        self.clone_depth -= 1;
        result
    }

    /// Dispose every node created at or after `mark`.
    ///
    /// Ids are handed out in increasing order, so these are exactly the nodes
    /// a failed operation built. The lowest id of a copied subtree is its top,
    /// which takes the rest of the subtree with it.
    pub(crate) fn discard_created_since(&mut self, mark: NodeId) {
        let mut created: Vec<NodeId> = self.nodes.keys().copied().filter(|&id| id >= mark).collect();
        if created.is_empty() {
            return;
        }
        created.sort_unstable();
        tracing::debug!(target: CLONE_TARGET, count = created.len(), %mark, "discarding nodes of failed operation");
        for id in created {
            if !self.contains_node(id) {
                continue;
            }
            if let Err(err) = self.dispose(id) {
                tracing::warn!(target: CLONE_TARGET, %id, %err, "failed to discard node");
            }
        }
    }

    fn clone_subtree(&mut self, source: NodeId, requested: CloneMode, depth: usize) -> SceneResult<NodeId> {
        let src = self.node(source)?;
        let kind = src.kind.clone();
        let name = format!("{}{}", src.name, self.config.clone_name_suffix);
        let source_model = src.model;
        let children = src.children.clone();
        let mode = requested.at_depth(depth);

        let id = self.ids.next_id()?;
        let model = match mode {
            CloneMode::Reference => source_model,
            CloneMode::Duplicate => {
                let values = self.models.values(source_model)?;
                self.models.create_with_values(kind.schema().clone(), values)?
            }
            _ => self.models.create(kind.schema().clone()),
        };

        self.insert_node(id, kind, model, CloneInfo::cloned_from(source, mode), name)?;
        self.init_cloning(id)?;

        for child in children {
            if !self.contains_node(child) {
                continue;
            }
            let copy = self.clone_subtree(child, requested, depth + 1)?;
            self.attach(copy, id, None, super::Propagation::Full)?;
        }

        self.on_cloned(id, depth)?;
        tracing::trace!(target: CLONE_TARGET, %source, clone = %id, ?mode, depth, "cloned node");
        Ok(id)
    }

    /// Wire a freshly constructed clone to its cloner.
    pub(crate) fn init_cloning(&mut self, id: NodeId) -> SceneResult<()> {
        let node = self.node(id)?;
        let Some(cloner) = node.clone_info.cloner() else {
            return Ok(());
        };
        let mode = node.clone_info.mode();
        let model = node.model;
        let cloner_model = self.node(cloner)?.model;

        self.node_mut(cloner)?.clone_info.add_cloned(id);
        match mode {
            CloneMode::Variant => self.models.link(model, cloner_model)?,
            CloneMode::ReferenceRoot => {
                self.models.link(model, cloner_model)?;
                self.models.set_reference(model, true)?;
                self.models.set_reference(cloner_model, true)?;
            }
            _ => {}
        }
        self.node_mut(id)?.clone_info.set_follows_cloner(true);
        Ok(())
    }

    fn on_cloned(&mut self, id: NodeId, depth: usize) -> SceneResult<()> {
        let info = self.node(id)?.clone_info.clone();
        if let Some(cloner) = info.cloner() {
            self.node_mut(id)?.custom_props.set_delegate(Some(cloner));
            if info.is_duplicate() && depth == 0 {
                self.unlink_custom_properties(id, true)?;
            }
        }
        // Nested clones are refreshed once the top of the operation is done.
        if depth == 0 {
            self.update(id, true)?;
        }
        Ok(())
    }

    // =========================================================================
    // Unlinking
    // =========================================================================

    /// Make a cloned node independent of its cloner.
    ///
    /// The node's values stay as they resolve now. No-op for nodes that were
    /// not cloned. With `unlink_children`, descendants are unlinked as well.
    pub fn unlink(&mut self, id: NodeId, unlink_children: bool) -> SceneResult<()> {
        let node = self.node(id)?;
        let info = node.clone_info.clone();
        let Some(cloner) = info.cloner() else {
            return Ok(());
        };
        let model = node.model;

        if (info.is_variant() && self.models.is_linked(model)) || info.is_reference_root() {
            self.models.flatten(model)?;
            if info.is_reference_root() {
                self.models.set_reference(model, false)?;
            }
        } else if info.is_reference() {
            let fresh = self.models.clone_independent(model)?;
            self.models.unobserve(model, id)?;
            self.models.observe(fresh, id)?;
            self.node_mut(id)?.model = fresh;
            self.models.release(model)?;
        }

        self.node_mut(id)?.clone_info.set_follows_cloner(false);
        if !info.is_duplicate() {
            self.unlink_custom_properties(id, true)?;
        }
        if let Ok(cloner_node) = self.node_mut(cloner) {
            cloner_node.clone_info.remove_cloned(id);
        }
        self.node_mut(id)?.clone_info.unlink();
        tracing::debug!(target: CLONE_TARGET, %id, %cloner, mode = ?info.mode(), "unlinked node");

        self.signals.unlinked.emit(id);
        self.update(id, false)?;

        if unlink_children {
            let children = self.node(id)?.children.clone();
            for child in children {
                if self.contains_node(child) {
                    self.unlink(child, true)?;
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Structural mirroring
    // =========================================================================

    pub(crate) fn mirror_child_added(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        let dependents = self.node(parent)?.clone_info.cloned().to_vec();
        for dependent in dependents {
            if self.contains_node(dependent) && self.contains_node(child) {
                self.on_cloner_child_added(dependent, parent, child)?;
            }
        }
        Ok(())
    }

    fn on_cloner_child_added(&mut self, dependent: NodeId, cloner: NodeId, child: NodeId) -> SceneResult<()> {
        let dep = self.node(dependent)?;
        let info = &dep.clone_info;
        if !info.follows_cloner() || info.is_duplicate() || info.cloner() != Some(cloner) {
            return Ok(());
        }
        let mode = info.mode().mirrored();
        let reference_family = info.is_reference_or_root();
        let dep_children = dep.children.clone();

        // Cloning the child into its own subtree would never settle.
        if self.contains(child, dependent)? {
            return Ok(());
        }
        let child_cloner = self.node(child)?.clone_info.cloner();
        for &existing in &dep_children {
            let existing_cloner = self.node(existing)?.clone_info.cloner();
            if existing_cloner == Some(child) || child_cloner == Some(existing) {
                return Ok(());
            }
        }
        if reference_family && dep_children.len() >= self.node(cloner)?.children.len() {
            return Ok(());
        }

        let index = self.sibling_index(child)?.unwrap_or(dep_children.len());
        self.guarded(child, |graph| {
            let copy = graph.clone_subtree(child, mode, 1)?;
            tracing::debug!(target: CLONE_TARGET, %dependent, %child, %copy, ?mode, "mirrored added child");
            graph.attach(copy, dependent, Some(index), super::Propagation::Full)?;
            graph.update(copy, true)
        })
    }

    pub(crate) fn mirror_child_removed(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        let dependents = self.node(parent)?.clone_info.cloned().to_vec();
        for dependent in dependents {
            if self.contains_node(dependent) {
                self.on_cloner_child_removed(dependent, parent, child)?;
            }
        }
        Ok(())
    }

    fn on_cloner_child_removed(&mut self, dependent: NodeId, cloner: NodeId, removed: NodeId) -> SceneResult<()> {
        let dep = self.node(dependent)?;
        let info = &dep.clone_info;
        if !info.follows_cloner() || info.is_duplicate() || info.cloner() != Some(cloner) {
            return Ok(());
        }
        let doomed: Vec<NodeId> = dep
            .children
            .iter()
            .copied()
            .filter(|&c| {
                self.nodes
                    .get(&c)
                    .is_some_and(|n| n.clone_info.cloner() == Some(removed))
            })
            .collect();
        for node in doomed {
            if self.contains_node(node) {
                tracing::debug!(target: CLONE_TARGET, %dependent, %removed, mirrored = %node, "mirrored removed child");
                self.delete_self(node)?;
            }
        }
        Ok(())
    }

    /// Runs after `child` was attached to `parent` as a direct edit.
    ///
    /// A child added by hand to a reference node gets a counterpart under the
    /// reference's cloner, keeping the pair's structure in step.
    pub(crate) fn on_added_to_parent(&mut self, child: NodeId, parent: NodeId) -> SceneResult<()> {
        let parent_info = &self.node(parent)?.clone_info;
        if !parent_info.is_reference_or_root() {
            return Ok(());
        }
        let Some(cloner) = parent_info.cloner() else {
            return Ok(());
        };
        let Ok(cloner_node) = self.node(cloner) else {
            return Ok(());
        };
        if self.node(parent)?.children.len() <= cloner_node.children.len() {
            return Ok(());
        }
        let child_cloner = self.node(child)?.clone_info.cloner();
        if child_cloner.is_some_and(|c| cloner_node.children.contains(&c)) {
            return Ok(());
        }
        if self.contains(child, cloner)? {
            return Ok(());
        }

        let index = self.sibling_index(child)?;
        self.guarded(child, |graph| {
            let counterpart = graph.clone_subtree(child, CloneMode::Reference, 1)?;
            tracing::debug!(target: CLONE_TARGET, %parent, %child, %cloner, %counterpart, "added counterpart under reference source");
            graph.attach(counterpart, cloner, index, super::Propagation::Full)?;
            graph.update(counterpart, true)
        })
    }

    /// Runs after `child` was removed from its parent as a direct edit.
    ///
    /// Removing either half of a reference pair removes the other half.
    pub(crate) fn on_removed_from_parent(&mut self, child: NodeId) -> SceneResult<()> {
        let info = self.node(child)?.clone_info.clone();
        if info.is_reference_or_root() {
            if let Some(cloner) = info.cloner().filter(|&c| self.contains_node(c)) {
                tracing::debug!(target: CLONE_TARGET, %child, %cloner, "removing reference source");
                self.delete_self(cloner)?;
            }
        }
        if !self.contains_node(child) {
            return Ok(());
        }
        let dependents = self.node(child)?.clone_info.cloned().to_vec();
        for dependent in dependents {
            let is_reference = self
                .nodes
                .get(&dependent)
                .is_some_and(|n| n.clone_info.is_reference_or_root());
            if is_reference {
                tracing::debug!(target: CLONE_TARGET, %child, %dependent, "removing reference dependent");
                self.delete_self(dependent)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Disposal
    // =========================================================================

    /// Tear the node and its subtree down.
    ///
    /// The node leaves its clone relationship, its dependents are unlinked,
    /// and its children are disposed. An attached node is spliced out of its
    /// parent without mirroring.
    pub fn dispose(&mut self, id: NodeId) -> SceneResult<()> {
        if let Some(parent) = self.node(id)?.parent {
            if let Ok(parent_node) = self.node_mut(parent) {
                parent_node.children.retain(|&c| c != id);
            }
            self.node_mut(id)?.parent = None;
        }
        self.dispose_subtree(id)
    }

    fn dispose_subtree(&mut self, id: NodeId) -> SceneResult<()> {
        if !self.contains_node(id) {
            return Ok(());
        }
        if self.node(id)?.clone_info.cloner().is_some() {
            self.unlink(id, false)?;
        }
        self.signals.disposed.emit(id);

        let dependents = self.node(id)?.clone_info.cloned().to_vec();
        for dependent in dependents {
            if self.contains_node(dependent) {
                self.unlink(dependent, true)?;
            }
        }

        let children = self.node(id)?.children.clone();
        for child in children {
            self.dispose_subtree(child)?;
        }

        if let Some(node) = self.nodes.remove(&id) {
            self.models.unobserve(node.model, id)?;
            self.models.release(node.model)?;
        }
        if self.active_root == Some(id) {
            self.active_root = None;
        }
        tracing::debug!(target: TARGET, %id, "node disposed");
        Ok(())
    }
}
