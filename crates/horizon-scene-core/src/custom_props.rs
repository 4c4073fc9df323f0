//! Custom property storage for one node.
//!
//! A node may define named, typed custom properties and may *assign* any of
//! its model keys to a property name. When a key is assigned, the node's
//! resolved values report the property's value for that key instead of the
//! model's.
//!
//! Property lookups walk from the node to the root, so a property defined on
//! an ancestor is visible to every descendant and the nearest definition of a
//! name wins. Clones delegate to their cloner's properties until they are
//! unlinked; that walk lives on [`SceneGraph`](crate::SceneGraph), this module
//! only holds the per-node records.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::id::NodeId;
use crate::value::{PropertyType, Value};

/// A named, typed value defined on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomProperty {
    /// The property name.
    pub name: String,
    /// The declared type.
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    /// The current value.
    pub value: Value,
    /// The node that defined it.
    pub creator: NodeId,
}

impl CustomProperty {
    /// Create a property record.
    pub fn new(
        name: impl Into<String>,
        property_type: PropertyType,
        value: Value,
        creator: NodeId,
    ) -> Self {
        Self {
            name: name.into(),
            property_type,
            value,
            creator,
        }
    }
}

/// Definitions and assignments held by one node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomProperties {
    definitions: Vec<CustomProperty>,
    assignments: BTreeMap<String, String>,
    assigned_keys: BTreeMap<String, BTreeSet<String>>,
    delegate: Option<NodeId>,
}

impl CustomProperties {
    /// Empty set with no delegate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Definitions in definition order.
    pub fn definitions(&self) -> &[CustomProperty] {
        &self.definitions
    }

    /// A definition by name.
    pub fn get(&self, name: &str) -> Option<&CustomProperty> {
        self.definitions.iter().find(|p| p.name == name)
    }

    /// Returns `true` if the name is defined here.
    pub fn defines(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Add or replace a definition. Returns the replaced record.
    pub fn define(&mut self, property: CustomProperty) -> Option<CustomProperty> {
        match self.definitions.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => Some(std::mem::replace(existing, property)),
            None => {
                self.definitions.push(property);
                None
            }
        }
    }

    /// Remove a definition.
    pub fn remove(&mut self, name: &str) -> Option<CustomProperty> {
        let pos = self.definitions.iter().position(|p| p.name == name)?;
        Some(self.definitions.remove(pos))
    }

    /// Model key to property name.
    pub fn assignments(&self) -> &BTreeMap<String, String> {
        &self.assignments
    }

    /// The property name assigned to `key`, if any.
    pub fn assignment(&self, key: &str) -> Option<&str> {
        self.assignments.get(key).map(String::as_str)
    }

    /// Keys assigned to the property `name`.
    pub fn keys_assigned_to(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.assigned_keys.get(name)
    }

    /// Assign `key` to `name`, replacing any previous assignment of the key.
    ///
    /// Returns the previously assigned property name.
    pub fn assign(&mut self, key: impl Into<String>, name: impl Into<String>) -> Option<String> {
        let key = key.into();
        let name = name.into();
        let previous = self.assignments.insert(key.clone(), name.clone());
        if let Some(old) = &previous {
            self.prune_reverse(old, &key);
        }
        self.assigned_keys.entry(name).or_default().insert(key);
        previous
    }

    /// Remove the assignment of `key`. Returns the property name it pointed at.
    pub fn unassign(&mut self, key: &str) -> Option<String> {
        let previous = self.assignments.remove(key)?;
        self.prune_reverse(&previous, key);
        Some(previous)
    }

    fn prune_reverse(&mut self, name: &str, key: &str) {
        if let Some(keys) = self.assigned_keys.get_mut(name) {
            keys.remove(key);
            if keys.is_empty() {
                self.assigned_keys.remove(name);
            }
        }
    }

    /// The node whose properties this node falls back to.
    pub fn delegate(&self) -> Option<NodeId> {
        self.delegate
    }

    pub(crate) fn set_delegate(&mut self, delegate: Option<NodeId>) {
        self.delegate = delegate;
    }

    /// Copy in definitions and assignments this set does not already have.
    ///
    /// Used to make a delegating set self-sufficient.
    pub(crate) fn absorb<'a>(
        &mut self,
        definitions: impl IntoIterator<Item = &'a CustomProperty>,
        assignments: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) {
        for property in definitions {
            if !self.defines(&property.name) {
                self.definitions.push(property.clone());
            }
        }
        for (key, name) in assignments {
            if !self.assignments.contains_key(key) {
                self.assign(key.clone(), name.clone());
            }
        }
    }

    /// Returns `true` if nothing is defined or assigned.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty() && self.assignments.is_empty()
    }
}
