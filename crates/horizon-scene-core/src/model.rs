//! Prototype-chained value storage for nodes.
//!
//! Every node reads and writes its authorable data through a model that lives
//! in the graph's [`ModelStore`]. A model holds only the keys that were set on
//! it ("own values"). Reads resolve through one function:
//!
//! 1. the model's own value, if set;
//! 2. otherwise the linked parent model's resolved value;
//! 3. otherwise the schema default.
//!
//! Linking is live delegation, not a snapshot: a change on a parent model is
//! visible through every model linked beneath it without any copy. Use
//! [`ModelStore::flatten`] to bake resolved values and sever the link.
//!
//! Models are stored in an arena and referenced by [`ModelId`] so that several
//! nodes can observe the same model instance (reference clones).

use std::collections::HashMap;
use std::sync::Arc;

use slotmap::{new_key_type, SlotMap};

use crate::error::{SceneError, SceneResult};
use crate::id::NodeId;
use crate::schema::ModelSchema;
use crate::value::{Value, Values};

const TARGET: &str = crate::logging::targets::MODEL;

new_key_type! {
    /// Handle to a model in a [`ModelStore`].
    pub struct ModelId;
}

/// A successful own-value write.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelChange {
    /// The model written to.
    pub model: ModelId,
    /// The key.
    pub key: String,
    /// The stored (normalized) value.
    pub value: Value,
    /// The resolved value before the write.
    pub old_value: Value,
}

struct ModelData {
    schema: Arc<ModelSchema>,
    own: HashMap<String, Value>,
    parent: Option<ModelId>,
    children: Vec<ModelId>,
    is_reference: bool,
    observers: Vec<NodeId>,
}

impl ModelData {
    fn new(schema: Arc<ModelSchema>) -> Self {
        Self {
            schema,
            own: HashMap::new(),
            parent: None,
            children: Vec::new(),
            is_reference: false,
            observers: Vec::new(),
        }
    }
}

/// Arena of models.
pub struct ModelStore {
    models: SlotMap<ModelId, ModelData>,
}

impl ModelStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            models: SlotMap::with_key(),
        }
    }

    /// Create a model with no own values.
    pub fn create(&mut self, schema: Arc<ModelSchema>) -> ModelId {
        let id = self.models.insert(ModelData::new(schema));
        tracing::trace!(target: TARGET, ?id, "created model");
        id
    }

    /// Create a model whose own values are `values`, normalized by the schema.
    pub fn create_with_values(
        &mut self,
        schema: Arc<ModelSchema>,
        values: impl IntoIterator<Item = (String, Value)>,
    ) -> SceneResult<ModelId> {
        let mut data = ModelData::new(schema);
        for (key, value) in values {
            let value = data.schema.normalize(&key, value)?;
            data.own.insert(key, value);
        }
        Ok(self.models.insert(data))
    }

    fn data(&self, id: ModelId) -> SceneResult<&ModelData> {
        self.models.get(id).ok_or(SceneError::ModelNotFound)
    }

    fn data_mut(&mut self, id: ModelId) -> SceneResult<&mut ModelData> {
        self.models.get_mut(id).ok_or(SceneError::ModelNotFound)
    }

    /// Check if a model exists.
    pub fn contains(&self, id: ModelId) -> bool {
        self.models.contains_key(id)
    }

    /// Number of live models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns `true` if the store holds no models.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// The model's schema.
    pub fn schema(&self, id: ModelId) -> SceneResult<&Arc<ModelSchema>> {
        self.data(id).map(|d| &d.schema)
    }

    /// Resolve a key: own value, then parent chain, then schema default.
    pub fn get_value(&self, id: ModelId, key: &str) -> SceneResult<Value> {
        let data = self.data(id)?;
        let default = data.schema.default_value(key)?;

        let mut current = Some(id);
        while let Some(model_id) = current {
            let model = self.data(model_id)?;
            if let Some(value) = model.own.get(key) {
                return Ok(value.clone());
            }
            current = model.parent;
        }
        Ok(default.clone())
    }

    /// The value set directly on this model, if any.
    pub fn own_value(&self, id: ModelId, key: &str) -> SceneResult<Option<&Value>> {
        let data = self.data(id)?;
        data.schema.field(key)?;
        Ok(data.own.get(key))
    }

    /// Own values only.
    pub fn own_values(&self, id: ModelId) -> SceneResult<Values> {
        Ok(self
            .data(id)?
            .own
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    /// Resolve every declared key.
    pub fn values(&self, id: ModelId) -> SceneResult<Values> {
        let schema = self.data(id)?.schema.clone();
        schema
            .keys()
            .map(|key| Ok((key.to_string(), self.get_value(id, key)?)))
            .collect()
    }

    /// Write an own value.
    ///
    /// The value is normalized by the key's constraints first. Returns the
    /// change when the resolved value differs from what it was before; the
    /// value is stored as an own value either way.
    pub fn set_value(
        &mut self,
        id: ModelId,
        key: &str,
        value: Value,
    ) -> SceneResult<Option<ModelChange>> {
        let value = self.data(id)?.schema.normalize(key, value)?;
        let old_value = self.get_value(id, key)?;
        self.data_mut(id)?.own.insert(key.to_string(), value.clone());

        if old_value == value {
            return Ok(None);
        }
        tracing::trace!(target: TARGET, ?id, key, %value, %old_value, "model value set");
        Ok(Some(ModelChange {
            model: id,
            key: key.to_string(),
            value,
            old_value,
        }))
    }

    /// Drop an own value so the key falls back to the parent or default.
    pub fn reset_value(&mut self, id: ModelId, key: &str) -> SceneResult<Option<ModelChange>> {
        self.data(id)?.schema.field(key)?;
        let old_value = self.get_value(id, key)?;
        if self.data_mut(id)?.own.remove(key).is_none() {
            return Ok(None);
        }
        let value = self.get_value(id, key)?;
        if value == old_value {
            return Ok(None);
        }
        Ok(Some(ModelChange {
            model: id,
            key: key.to_string(),
            value,
            old_value,
        }))
    }

    /// The model this one delegates to.
    pub fn parent(&self, id: ModelId) -> SceneResult<Option<ModelId>> {
        self.data(id).map(|d| d.parent)
    }

    /// Models linked beneath this one, in link order.
    pub fn linked_children(&self, id: ModelId) -> SceneResult<&[ModelId]> {
        self.data(id).map(|d| d.children.as_slice())
    }

    /// Returns `true` if the model delegates to a parent.
    pub fn is_linked(&self, id: ModelId) -> bool {
        self.models.get(id).is_some_and(|d| d.parent.is_some())
    }

    /// Install a delegation edge from `child` to `parent`.
    ///
    /// A model is linked to at most one parent; an existing link is replaced.
    /// Linking does not copy values.
    pub fn link(&mut self, child: ModelId, parent: ModelId) -> SceneResult<()> {
        self.data(parent)?;
        if child == parent || self.chain_contains(parent, child)? {
            return Err(SceneError::invalid("model link would create a delegation cycle"));
        }
        self.unlink(child)?;
        self.data_mut(child)?.parent = Some(parent);
        self.data_mut(parent)?.children.push(child);
        tracing::trace!(target: TARGET, ?child, ?parent, "linked model");
        Ok(())
    }

    fn chain_contains(&self, start: ModelId, needle: ModelId) -> SceneResult<bool> {
        let mut current = Some(start);
        while let Some(id) = current {
            if id == needle {
                return Ok(true);
            }
            current = self.data(id)?.parent;
        }
        Ok(false)
    }

    /// Remove the delegation edge, if any. Values are not copied.
    pub fn unlink(&mut self, child: ModelId) -> SceneResult<()> {
        if let Some(parent) = self.data_mut(child)?.parent.take() {
            if let Some(parent_data) = self.models.get_mut(parent) {
                parent_data.children.retain(|&c| c != child);
            }
        }
        Ok(())
    }

    /// Bake every resolved value into own storage and drop the parent link.
    ///
    /// No-op if the model is not linked.
    pub fn flatten(&mut self, id: ModelId) -> SceneResult<()> {
        if !self.is_linked(id) {
            return Ok(());
        }
        let resolved = self.values(id)?;
        self.data_mut(id)?.own.extend(resolved);
        self.unlink(id)?;
        tracing::trace!(target: TARGET, ?id, "flattened model");
        Ok(())
    }

    /// Create an unlinked model holding `id`'s resolved values.
    pub fn clone_independent(&mut self, id: ModelId) -> SceneResult<ModelId> {
        let schema = self.data(id)?.schema.clone();
        let resolved = self.values(id)?;
        let mut data = ModelData::new(schema);
        data.own = resolved.into_iter().collect();
        Ok(self.models.insert(data))
    }

    /// `id` followed by every model linked beneath it, depth-first.
    ///
    /// This is the notification order for a change made on `id`.
    pub fn fan_out(&self, id: ModelId) -> SceneResult<Vec<ModelId>> {
        let mut out = Vec::new();
        self.fan_out_into(id, &mut out)?;
        Ok(out)
    }

    fn fan_out_into(&self, id: ModelId, out: &mut Vec<ModelId>) -> SceneResult<()> {
        out.push(id);
        for &child in &self.data(id)?.children {
            self.fan_out_into(child, out)?;
        }
        Ok(())
    }

    /// Like [`fan_out`](Self::fan_out), restricted to the models whose
    /// resolved `key` comes from `id`. A linked model holding its own value
    /// for `key` is skipped together with everything beneath it.
    pub fn fan_out_for_key(&self, id: ModelId, key: &str) -> SceneResult<Vec<ModelId>> {
        let mut out = vec![id];
        let mut stack: Vec<ModelId> = self.data(id)?.children.iter().rev().copied().collect();
        while let Some(model) = stack.pop() {
            let data = self.data(model)?;
            if data.own.contains_key(key) {
                continue;
            }
            out.push(model);
            stack.extend(data.children.iter().rev().copied());
        }
        Ok(out)
    }

    /// Whether the model carries the shared "is-reference" flag.
    pub fn is_reference(&self, id: ModelId) -> bool {
        self.models.get(id).is_some_and(|d| d.is_reference)
    }

    /// Set or clear the "is-reference" flag.
    pub fn set_reference(&mut self, id: ModelId, is_reference: bool) -> SceneResult<()> {
        self.data_mut(id)?.is_reference = is_reference;
        Ok(())
    }

    /// Nodes observing this model.
    pub fn observers(&self, id: ModelId) -> SceneResult<&[NodeId]> {
        self.data(id).map(|d| d.observers.as_slice())
    }

    /// Register a node as an observer.
    pub fn observe(&mut self, id: ModelId, node: NodeId) -> SceneResult<()> {
        let data = self.data_mut(id)?;
        if !data.observers.contains(&node) {
            data.observers.push(node);
        }
        Ok(())
    }

    /// Stop a node observing this model.
    pub fn unobserve(&mut self, id: ModelId, node: NodeId) -> SceneResult<()> {
        self.data_mut(id)?.observers.retain(|&n| n != node);
        Ok(())
    }

    /// Remove the model once nothing observes it.
    ///
    /// Models still linked beneath it are flattened first so their reads keep
    /// resolving. Returns `true` if the model was removed.
    pub fn release(&mut self, id: ModelId) -> SceneResult<bool> {
        if !self.data(id)?.observers.is_empty() {
            return Ok(false);
        }
        let children = self.data(id)?.children.clone();
        for child in children {
            self.flatten(child)?;
        }
        self.unlink(id)?;
        self.models.remove(id);
        tracing::trace!(target: TARGET, ?id, "released model");
        Ok(true)
    }

    /// Drop every model.
    pub fn clear(&mut self) {
        self.models.clear();
    }
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new()
    }
}
