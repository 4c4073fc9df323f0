//! Producing and replaying node records and sync events.

use std::collections::{HashMap, HashSet};

use crate::clone_info::{CloneInfo, CloneMode};
use crate::error::{SceneError, SceneResult};
use crate::id::NodeId;
use crate::logging::PerfSpan;
use crate::persistence::{AssignmentRecord, CloneRecord, NodeRecord, SyncEvent};

use super::tree::Detach;
use super::{Propagation, SceneGraph};

const TARGET: &str = crate::logging::targets::SYNC;

impl SceneGraph {
    /// Serialize one node.
    pub fn node_record(&self, id: NodeId) -> SceneResult<NodeRecord> {
        let node = self.node(id)?;
        let info = &node.clone_info;
        let values = if info.is_reference() {
            Default::default()
        } else {
            self.models.own_values(node.model)?
        };
        Ok(NodeRecord {
            id,
            kind: node.type_tag().to_string(),
            name: node.name.clone(),
            parent: node.parent,
            index: self.sibling_index(id)?,
            values,
            clone: CloneRecord {
                mode: info.mode(),
                cloner: info.cloner(),
                cloned: info.cloned().to_vec(),
            },
            custom_properties: node.custom_props.definitions().to_vec(),
            assignments: node
                .custom_props
                .assignments()
                .iter()
                .map(|(key, property)| AssignmentRecord {
                    key: key.clone(),
                    property: property.clone(),
                })
                .collect(),
        })
    }

    /// Records for `root`'s subtree, ready for [`restore`](Self::restore).
    ///
    /// Parents and cloners inside the subtree come before the nodes that
    /// depend on them. Cloners outside the subtree must already exist where
    /// the records are restored.
    pub fn snapshot(&self, root: NodeId) -> SceneResult<Vec<NodeRecord>> {
        let order = self.depth_first_preorder(root)?;
        let members: HashSet<NodeId> = order.iter().copied().collect();
        self.ordered_records(order, &members)
    }

    /// Records for every node in the graph.
    pub fn snapshot_all(&self) -> SceneResult<Vec<NodeRecord>> {
        let _perf = PerfSpan::new("snapshot_all");
        let mut order = Vec::new();
        for root in self.root_nodes() {
            order.extend(self.depth_first_preorder(root)?);
        }
        let members: HashSet<NodeId> = order.iter().copied().collect();
        self.ordered_records(order, &members)
    }

    fn ordered_records(&self, order: Vec<NodeId>, members: &HashSet<NodeId>) -> SceneResult<Vec<NodeRecord>> {
        let mut emitted = HashSet::new();
        let mut out = Vec::with_capacity(order.len());
        for id in order {
            self.emit_record(id, members, &mut emitted, &mut out)?;
        }
        Ok(out)
    }

    fn emit_record(
        &self,
        id: NodeId,
        members: &HashSet<NodeId>,
        emitted: &mut HashSet<NodeId>,
        out: &mut Vec<NodeRecord>,
    ) -> SceneResult<()> {
        if !members.contains(&id) || !emitted.insert(id) {
            return Ok(());
        }
        let node = self.node(id)?;
        if let Some(parent) = node.parent {
            self.emit_record(parent, members, emitted, out)?;
        }
        if let Some(cloner) = node.clone_info.cloner() {
            self.emit_record(cloner, members, emitted, out)?;
        }
        out.push(self.node_record(id)?);
        Ok(())
    }

    /// Rebuild one node from its record.
    ///
    /// The node keeps the recorded id and clone relationship; its children
    /// are not cloned and attaching it does not mirror into dependents. The
    /// recorded custom property definitions and assignments are replayed in
    /// order.
    pub fn restore_node(&mut self, record: &NodeRecord) -> SceneResult<NodeId> {
        let id = record.id;
        if self.contains_node(id) {
            return Err(SceneError::DuplicateId(id));
        }
        let entry = self.kinds.get(&record.kind)?.clone();
        let mode = record.clone.mode;
        let cloner = match (mode, record.clone.cloner) {
            (CloneMode::Original, _) => None,
            (_, Some(cloner)) => Some(self.node(cloner)?.id),
            (_, None) => {
                return Err(SceneError::invalid(format!("record for {id} is {mode:?} without a cloner")));
            }
        };
        if let Some(parent) = record.parent {
            if parent == id {
                return Err(SceneError::CircularParentage { child: id, parent });
            }
            self.node(parent)?;
        }
        self.ids.reserve(id)?;

        let model = match cloner {
            Some(cloner) if mode == CloneMode::Reference => self.node(cloner)?.model,
            _ => self
                .models
                .create_with_values(entry.schema().clone(), record.values.clone())?,
        };
        let info = match cloner {
            Some(cloner) => CloneInfo::cloned_from(cloner, mode),
            None => CloneInfo::original(),
        };
        self.insert_node(id, entry, model, info, record.name.clone())?;

        if let Err(err) = self.finish_restore(id, record) {
            tracing::warn!(target: TARGET, %id, %err, "restore failed, discarding node");
            if let Err(dispose_err) = self.dispose(id) {
                tracing::warn!(target: TARGET, %id, %dispose_err, "failed to discard node");
            }
            return Err(err);
        }
        tracing::debug!(target: TARGET, %id, kind = %record.kind, ?mode, "restored node");
        Ok(id)
    }

    fn finish_restore(&mut self, id: NodeId, record: &NodeRecord) -> SceneResult<()> {
        let info = self.node(id)?.clone_info.clone();
        if let Some(cloner) = info.cloner() {
            self.init_cloning(id)?;
            if !info.is_duplicate() {
                self.node_mut(id)?.custom_props.set_delegate(Some(cloner));
            }
        }

        let props = &mut self.node_mut(id)?.custom_props;
        for property in &record.custom_properties {
            props.define(property.clone());
        }
        for assignment in &record.assignments {
            props.assign(assignment.key.clone(), assignment.property.clone());
        }

        if let Some(parent) = record.parent {
            self.attach(id, parent, record.index, Propagation::Silent)?;
        }
        self.update(id, false)
    }

    /// Rebuild a batch of records, in order.
    ///
    /// After the batch, the children of every restored parent are ordered by
    /// their recorded indices.
    pub fn restore(&mut self, records: &[NodeRecord]) -> SceneResult<Vec<NodeId>> {
        let _perf = PerfSpan::new("restore");
        let mut restored = Vec::with_capacity(records.len());
        for record in records {
            restored.push(self.restore_node(record)?);
        }

        let positions: HashMap<NodeId, usize> = records
            .iter()
            .filter_map(|r| r.index.map(|index| (r.id, index)))
            .collect();
        let parents: HashSet<NodeId> = records.iter().filter_map(|r| r.parent).collect();
        for parent in parents {
            let node = self.node_mut(parent)?;
            node.children
                .sort_by_key(|child| positions.get(child).copied().unwrap_or(usize::MAX));
        }
        for &id in &restored {
            self.update(id, false)?;
        }
        tracing::debug!(target: TARGET, count = restored.len(), "restored records");
        Ok(restored)
    }

    /// Apply a change made on another replica.
    pub fn apply_sync_event(&mut self, event: &SyncEvent) -> SceneResult<()> {
        tracing::trace!(target: TARGET, ?event, "applying sync event");
        match event {
            SyncEvent::NodeCreated { record } => {
                self.restore_node(record)?;
            }
            SyncEvent::NodeRemoved { id } => {
                if self.contains_node(*id) {
                    self.dispose(*id)?;
                }
            }
            SyncEvent::ChildAdded { parent, child, index } => {
                self.attach(*child, *parent, *index, Propagation::Silent)?;
                self.update(*child, true)?;
            }
            SyncEvent::ChildRemoved { parent, child } => {
                if !self.node(*parent)?.children.contains(child) {
                    return Err(SceneError::NotAChild {
                        parent: *parent,
                        child: *child,
                    });
                }
                self.detach(*child, Detach::Remove, Propagation::Silent)?;
            }
            SyncEvent::ValueChanged { id, key, value } => {
                self.set(*id, key, value.clone())?;
            }
            SyncEvent::CustomPropertyDefined { id, property } => {
                self.node_mut(*id)?.custom_props.define(property.clone());
                self.signals.custom_properties_changed.emit(*id);
                self.update_recursive_with_clones(*id)?;
            }
            SyncEvent::CustomPropertyRemoved { id, name } => {
                self.remove_custom_property(*id, name)?;
            }
            SyncEvent::CustomPropertyAssigned { id, key, name } => {
                self.assign_custom_property(*id, key, name)?;
            }
            SyncEvent::CustomPropertyUnassigned { id, key } => {
                self.unassign_custom_property(*id, key)?;
            }
        }
        Ok(())
    }
}
