//! Custom property resolution and editing.
//!
//! A node sees the properties it defines itself, then those of the nodes it
//! delegates to (its cloner chain), then everything its parent sees, and
//! finally whatever the delegates' ancestors define. The first definition of
//! a name wins.

use std::collections::{BTreeMap, HashSet};

use crate::custom_props::{CustomProperties, CustomProperty};
use crate::error::{SceneError, SceneResult};
use crate::id::NodeId;
use crate::value::{PropertyType, Value};

use super::SceneGraph;

const TARGET: &str = crate::logging::targets::CUSTOM_PROPS;

/// How a visible property reached the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Via {
    Own,
    Cloner,
    Ancestor,
}

#[derive(Debug, Clone)]
pub(crate) struct VisibleProperty {
    pub(crate) property: CustomProperty,
    pub(crate) via: Via,
}

impl SceneGraph {
    pub(crate) fn visible_properties(&self, id: NodeId) -> SceneResult<Vec<VisibleProperty>> {
        let mut out = Vec::new();
        let mut names = HashSet::new();
        let mut visited = HashSet::new();
        self.collect_visible(id, Via::Own, &mut out, &mut names, &mut visited)?;
        Ok(out)
    }

    fn collect_visible(
        &self,
        id: NodeId,
        via: Via,
        out: &mut Vec<VisibleProperty>,
        names: &mut HashSet<String>,
        visited: &mut HashSet<NodeId>,
    ) -> SceneResult<()> {
        if !visited.insert(id) {
            return Ok(());
        }
        let node = self.node(id)?;
        let mut push = |property: &CustomProperty, via: Via, out: &mut Vec<VisibleProperty>| {
            if names.insert(property.name.clone()) {
                out.push(VisibleProperty {
                    property: property.clone(),
                    via,
                });
            }
        };

        for property in node.custom_props.definitions() {
            push(property, via, out);
        }

        let delegated = if via == Via::Own { Via::Cloner } else { via };
        let mut chain = Vec::new();
        let mut next = node.custom_props.delegate();
        while let Some(delegate) = next {
            if chain.contains(&delegate) || delegate == id {
                break;
            }
            let Ok(delegate_node) = self.node(delegate) else {
                break;
            };
            for property in delegate_node.custom_props.definitions() {
                push(property, delegated, out);
            }
            chain.push(delegate);
            next = delegate_node.custom_props.delegate();
        }

        if let Some(parent) = node.parent {
            let inherited = if via == Via::Own { Via::Ancestor } else { via };
            self.collect_visible(parent, inherited, out, names, visited)?;
        }

        for delegate in chain {
            if let Some(parent) = self.node(delegate)?.parent {
                self.collect_visible(parent, delegated, out, names, visited)?;
            }
        }
        Ok(())
    }

    /// Model key → property name for every assignment in effect on the node,
    /// its own first, then its delegates'.
    pub(crate) fn effective_assignments(&self, id: NodeId) -> SceneResult<BTreeMap<String, String>> {
        let mut out = BTreeMap::new();
        let mut seen = HashSet::new();
        let mut next = Some(id);
        while let Some(current) = next {
            if !seen.insert(current) {
                break;
            }
            let Ok(node) = self.node(current) else {
                break;
            };
            for (key, name) in node.custom_props.assignments() {
                out.entry(key.clone()).or_insert_with(|| name.clone());
            }
            next = node.custom_props.delegate();
        }
        if out.is_empty() {
            self.node(id)?;
        }
        Ok(out)
    }

    /// Every custom property visible from the node, nearest first.
    pub fn available_custom_properties(&self, id: NodeId) -> SceneResult<Vec<CustomProperty>> {
        Ok(self
            .visible_properties(id)?
            .into_iter()
            .map(|v| v.property)
            .collect())
    }

    /// The visible property with this name.
    pub fn custom_property(&self, id: NodeId, name: &str) -> SceneResult<Option<CustomProperty>> {
        Ok(self
            .visible_properties(id)?
            .into_iter()
            .find(|v| v.property.name == name)
            .map(|v| v.property))
    }

    /// The property name assigned to `key` on the node, if any.
    pub fn custom_property_assignment(&self, id: NodeId, key: &str) -> SceneResult<Option<String>> {
        Ok(self.effective_assignments(id)?.remove(key))
    }

    /// A consolidated view: every visible definition plus every assignment
    /// in effect, with no delegation.
    pub fn custom_props(&self, id: NodeId) -> SceneResult<CustomProperties> {
        let mut props = CustomProperties::new();
        for visible in self.visible_properties(id)? {
            props.define(visible.property);
        }
        for (key, name) in self.effective_assignments(id)? {
            props.assign(key, name);
        }
        Ok(props)
    }

    /// Define or redefine a custom property on the node.
    ///
    /// The value is coerced to `property_type`; a value that cannot be is a
    /// [`PropertyTypeMismatch`](SceneError::PropertyTypeMismatch).
    pub fn set_custom_property(
        &mut self,
        id: NodeId,
        name: &str,
        property_type: PropertyType,
        value: impl Into<Value>,
    ) -> SceneResult<()> {
        let value = value.into();
        let got = value.type_name();
        let value = property_type
            .coerce(value)
            .ok_or_else(|| SceneError::PropertyTypeMismatch {
                name: name.to_string(),
                expected: property_type,
                got,
            })?;
        let property = CustomProperty::new(name, property_type, value, id);
        tracing::debug!(target: TARGET, %id, name, ?property_type, value = %property.value, "custom property set");
        self.node_mut(id)?.custom_props.define(property);
        self.custom_properties_changed(id)
    }

    /// Remove a property the node defines itself.
    pub fn remove_custom_property(&mut self, id: NodeId, name: &str) -> SceneResult<CustomProperty> {
        let removed = self
            .node_mut(id)?
            .custom_props
            .remove(name)
            .ok_or_else(|| SceneError::PropertyNotFound {
                node: id,
                name: name.to_string(),
            })?;
        tracing::debug!(target: TARGET, %id, name, "custom property removed");
        self.custom_properties_changed(id)?;
        Ok(removed)
    }

    /// Drive model `key` of the node from the visible property `name`.
    ///
    /// Returns the property previously assigned to the key on this node.
    pub fn assign_custom_property(&mut self, id: NodeId, key: &str, name: &str) -> SceneResult<Option<String>> {
        let schema = self.node(id)?.kind.schema().clone();
        schema.field(key)?;
        if self.custom_property(id, name)?.is_none() {
            return Err(SceneError::PropertyNotFound {
                node: id,
                name: name.to_string(),
            });
        }
        let previous = self.node_mut(id)?.custom_props.assign(key, name);
        tracing::debug!(target: TARGET, %id, key, name, "custom property assigned");
        self.custom_properties_changed(id)?;
        Ok(previous)
    }

    /// Remove the node's own assignment for `key`.
    pub fn unassign_custom_property(&mut self, id: NodeId, key: &str) -> SceneResult<String> {
        let name = self
            .node_mut(id)?
            .custom_props
            .unassign(key)
            .ok_or_else(|| SceneError::AssignmentNotFound {
                node: id,
                key: key.to_string(),
            })?;
        tracing::debug!(target: TARGET, %id, key, name, "custom property unassigned");
        self.custom_properties_changed(id)?;
        Ok(name)
    }

    fn custom_properties_changed(&mut self, id: NodeId) -> SceneResult<()> {
        self.signals.custom_properties_changed.emit(id);
        self.update_recursive_with_clones(id)
    }

    /// Make the custom properties of the node (and with `recursive`, of its
    /// descendants) self-sufficient: everything reached through delegation
    /// is copied in and the delegation is dropped. Resolution does not
    /// change.
    pub(crate) fn unlink_custom_properties(&mut self, id: NodeId, recursive: bool) -> SceneResult<()> {
        let targets = if recursive {
            self.depth_first_preorder(id)?
        } else {
            vec![id]
        };
        for target in targets {
            if self.node(target)?.custom_props.delegate().is_none() {
                continue;
            }
            let definitions: Vec<CustomProperty> = self
                .visible_properties(target)?
                .into_iter()
                .filter(|v| v.via == Via::Cloner)
                .map(|v| v.property)
                .collect();
            let assignments = self.effective_assignments(target)?;
            let props = &mut self.node_mut(target)?.custom_props;
            props.absorb(&definitions, &assignments);
            props.set_delegate(None);
            tracing::trace!(target: TARGET, id = %target, absorbed = definitions.len(), "custom properties unlinked");
        }
        Ok(())
    }
}
