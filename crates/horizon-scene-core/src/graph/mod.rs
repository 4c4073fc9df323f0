//! The scene graph.
//!
//! [`SceneGraph`] owns every node of a scene together with the models backing
//! them. Nodes are addressed by [`NodeId`] and relate to each other in two
//! independent ways:
//!
//! - **Structure**: an ordered parent/children tree (see the `tree` operations
//!   such as [`SceneGraph::add_child`] and [`SceneGraph::walk`]).
//! - **Cloning**: a node may be cloned from another node (its *cloner*) in one
//!   of the [`CloneMode`](crate::CloneMode)s. Dependents track their cloner's
//!   values, structure, and custom properties according to their mode.
//!
//! Both relationships are kept as id tables inside the graph, so every
//! cascading edit (mirroring a new child into variants, deleting the two
//! halves of a reference pair, refreshing the views of dependents) runs
//! synchronously from the call that triggered it.
//!
//! # Example
//!
//! ```
//! use horizon_scene_core::{KindRegistry, ModelSchema, NodeId, NodeKind, NullView, SceneGraph, View};
//!
//! struct Dot;
//!
//! impl NodeKind for Dot {
//!     fn type_tag(&self) -> &'static str { "dot" }
//!     fn model_schema(&self) -> ModelSchema {
//!         ModelSchema::builder("dot").field("radius", 1.0).build()
//!     }
//!     fn create_view(&self, _node: NodeId) -> Box<dyn View> { Box::new(NullView) }
//! }
//!
//! let mut graph = SceneGraph::new(KindRegistry::new().with(Dot));
//! let parent = graph.create_node("dot").unwrap();
//! let child = graph.create_node("dot").unwrap();
//! graph.add_child(parent, child).unwrap();
//!
//! graph.set(child, "radius", 4.0).unwrap();
//! assert_eq!(graph.get(child, "radius").unwrap().as_f64(), Some(4.0));
//! assert_eq!(graph.children(parent).unwrap(), &[child]);
//! ```

mod clone;
mod custom;
mod records;
mod tree;

use std::collections::HashMap;
use std::fmt;

use crate::clone_info::CloneInfo;
use crate::config::GraphConfig;
use crate::custom_props::CustomProperties;
use crate::error::{SceneError, SceneResult};
use crate::events::{GraphSignals, ValueChange};
use crate::id::{IdGenerator, NodeId};
use crate::kind::{KindEntry, KindRegistry, NodeKind, View};
use crate::model::{ModelChange, ModelId, ModelStore};
use crate::value::{Value, Values};

pub use tree::{Walk, WalkDirection, WalkOptions};

pub(crate) use tree::Propagation;

const TARGET: &str = crate::logging::targets::GRAPH;

/// One node of the scene graph.
///
/// Nodes are owned by the [`SceneGraph`]; borrow them with
/// [`SceneGraph::node`].
pub struct Node {
    id: NodeId,
    kind: KindEntry,
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    model: ModelId,
    view: Option<Box<dyn View>>,
    clone_info: CloneInfo,
    custom_props: CustomProperties,
}

impl Node {
    /// The node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The node's kind tag.
    pub fn type_tag(&self) -> &'static str {
        self.kind.type_tag()
    }

    /// The node's kind entry.
    pub fn kind(&self) -> &KindEntry {
        &self.kind
    }

    /// The node's display name. Empty when unnamed.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current parent, if attached.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The ordered children.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The model handle backing this node.
    pub fn model_id(&self) -> ModelId {
        self.model
    }

    /// The clone relationship.
    pub fn clone_info(&self) -> &CloneInfo {
        &self.clone_info
    }

    /// Custom properties defined and assigned on this node itself.
    pub fn custom_properties(&self) -> &CustomProperties {
        &self.custom_props
    }

    /// The presentation handle.
    pub fn view(&self) -> Option<&dyn View> {
        self.view.as_deref()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.type_tag())
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("clone_info", &self.clone_info)
            .finish_non_exhaustive()
    }
}

/// Arena of nodes and their models.
///
/// All operations take node ids and report failures as [`SceneError`]. The
/// graph is single-threaded: it is `Send` so it can be handed to another
/// thread, but every mutation takes `&mut self`.
pub struct SceneGraph {
    nodes: HashMap<NodeId, Node>,
    models: ModelStore,
    kinds: KindRegistry,
    ids: IdGenerator,
    signals: GraphSignals,
    config: GraphConfig,
    active_root: Option<NodeId>,
    clone_depth: usize,
}

impl SceneGraph {
    /// Create an empty graph with the default configuration.
    pub fn new(kinds: KindRegistry) -> Self {
        Self::with_config(kinds, GraphConfig::default())
    }

    /// Create an empty graph.
    pub fn with_config(kinds: KindRegistry, config: GraphConfig) -> Self {
        tracing::debug!(target: TARGET, kinds = kinds.len(), ?config, "created scene graph");
        Self {
            nodes: HashMap::new(),
            models: ModelStore::new(),
            kinds,
            ids: IdGenerator::new(),
            signals: GraphSignals::new(),
            config,
            active_root: None,
            clone_depth: 0,
        }
    }

    /// The graph configuration.
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// The registered node kinds.
    pub fn kinds(&self) -> &KindRegistry {
        &self.kinds
    }

    /// Register an additional node kind.
    pub fn register_kind<K: NodeKind>(&mut self, kind: K) {
        self.kinds.register(kind);
    }

    /// The graph's signals.
    pub fn signals(&self) -> &GraphSignals {
        &self.signals
    }

    /// The model store, read-only.
    pub fn models(&self) -> &ModelStore {
        &self.models
    }

    // =========================================================================
    // Node lifecycle
    // =========================================================================

    /// Create a detached node of the given kind with every key at its default.
    pub fn create_node(&mut self, type_tag: &str) -> SceneResult<NodeId> {
        self.create_node_with_values(type_tag, std::iter::empty::<(String, Value)>())
    }

    /// Create a detached node with initial own values.
    pub fn create_node_with_values<K, I>(&mut self, type_tag: &str, values: I) -> SceneResult<NodeId>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let entry = self.kinds.get(type_tag)?.clone();
        let id = self.ids.next_id()?;
        let model = self
            .models
            .create_with_values(entry.schema().clone(), values.into_iter().map(|(k, v)| (k.into(), v)))?;
        self.insert_node(id, entry, model, CloneInfo::original(), String::new())?;
        self.update(id, false)?;
        Ok(id)
    }

    /// Register a constructed node: observe its model, build its view, and
    /// announce it.
    fn insert_node(
        &mut self,
        id: NodeId,
        kind: KindEntry,
        model: ModelId,
        clone_info: CloneInfo,
        name: String,
    ) -> SceneResult<()> {
        self.models.observe(model, id)?;
        let view = kind.kind().create_view(id);
        tracing::debug!(target: TARGET, %id, kind = kind.type_tag(), mode = ?clone_info.mode(), "node created");
        self.nodes.insert(
            id,
            Node {
                id,
                kind,
                name,
                parent: None,
                children: Vec::new(),
                model,
                view: Some(view),
                clone_info,
                custom_props: CustomProperties::new(),
            },
        );
        self.signals.node_created.emit(id);
        Ok(())
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> SceneResult<&Node> {
        self.nodes.get(&id).ok_or(SceneError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> SceneResult<&mut Node> {
        self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))
    }

    /// Returns `true` if the node exists.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Ids of every live node, ascending.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<_> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// The node's display name.
    pub fn name(&self, id: NodeId) -> SceneResult<&str> {
        Ok(self.node(id)?.name())
    }

    /// Rename a node.
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> SceneResult<()> {
        self.node_mut(id)?.name = name.into();
        Ok(())
    }

    /// Mark `id` as the active root of the scene.
    pub fn set_active_root(&mut self, id: NodeId) -> SceneResult<()> {
        self.node(id)?;
        self.active_root = Some(id);
        Ok(())
    }

    /// The active root.
    pub fn active_root(&self) -> SceneResult<NodeId> {
        self.active_root.ok_or(SceneError::NotInitialized("Active root"))
    }

    /// Forget the active root without touching any node.
    pub fn clear_active_root(&mut self) {
        self.active_root = None;
    }

    /// Drop every node and model. Signal connections are kept.
    pub fn clear(&mut self) {
        tracing::debug!(target: TARGET, nodes = self.nodes.len(), "clearing scene graph");
        self.nodes.clear();
        self.models.clear();
        self.active_root = None;
        self.clone_depth = 0;
    }

    // =========================================================================
    // Values
    // =========================================================================

    /// The node's model value for `key`, without custom property overrides.
    pub fn get(&self, id: NodeId, key: &str) -> SceneResult<Value> {
        self.models.get_value(self.node(id)?.model, key)
    }

    /// Write a model value.
    ///
    /// Returns `true` if the node's resolved value changed. On change, every
    /// node whose model resolves the key through this one is refreshed and
    /// notified.
    pub fn set(&mut self, id: NodeId, key: &str, value: impl Into<Value>) -> SceneResult<bool> {
        let model = self.node(id)?.model;
        match self.models.set_value(model, key, value.into())? {
            Some(change) => {
                self.propagate_model_change(&change)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drop the node's own value for `key` so it falls back to its source or
    /// default. Returns `true` if the resolved value changed.
    pub fn reset(&mut self, id: NodeId, key: &str) -> SceneResult<bool> {
        let model = self.node(id)?.model;
        match self.models.reset_value(model, key)? {
            Some(change) => {
                self.propagate_model_change(&change)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Values explicitly set on the node's model.
    pub fn own_values(&self, id: NodeId) -> SceneResult<Values> {
        self.models.own_values(self.node(id)?.model)
    }

    /// Every declared key resolved through the model chain.
    pub fn model_values(&self, id: NodeId) -> SceneResult<Values> {
        self.models.values(self.node(id)?.model)
    }

    /// Every declared key as the view sees it: model values with assigned
    /// keys replaced by their custom property values.
    pub fn values(&self, id: NodeId) -> SceneResult<Values> {
        let mut values = self.model_values(id)?;
        let assignments = self.effective_assignments(id)?;
        if assignments.is_empty() {
            return Ok(values);
        }
        let visible = self.visible_properties(id)?;
        for (key, name) in assignments {
            let property = visible.iter().find(|v| v.property.name == name);
            if let (Some(slot), Some(visible)) = (values.get_mut(&key), property) {
                *slot = visible.property.value.clone();
            }
        }
        Ok(values)
    }

    /// Returns `true` if the node's model carries the reference flag.
    pub fn is_reference_model(&self, id: NodeId) -> SceneResult<bool> {
        Ok(self.models.is_reference(self.node(id)?.model))
    }

    /// Returns `true` if both nodes read and write the same model.
    pub fn shares_model(&self, a: NodeId, b: NodeId) -> SceneResult<bool> {
        Ok(self.node(a)?.model == self.node(b)?.model)
    }

    /// Returns `true` if `id`'s model live-delegates to `source`'s model.
    pub fn model_follows(&self, id: NodeId, source: NodeId) -> SceneResult<bool> {
        let model = self.node(id)?.model;
        let source_model = self.node(source)?.model;
        Ok(self.models.parent(model)? == Some(source_model))
    }

    fn propagate_model_change(&mut self, change: &ModelChange) -> SceneResult<()> {
        let models = self.models.fan_out_for_key(change.model, &change.key)?;
        for model in models {
            let observers = self.models.observers(model)?.to_vec();
            for node in observers {
                if !self.contains_node(node) {
                    continue;
                }
                self.update(node, false)?;
                self.signals.value_changed.emit(ValueChange {
                    node,
                    key: change.key.clone(),
                    value: change.value.clone(),
                    old_value: change.old_value.clone(),
                });
                self.signals.node_changed.emit(node);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Borrow the node's view.
    pub fn view(&self, id: NodeId) -> SceneResult<Option<&dyn View>> {
        Ok(self.node(id)?.view())
    }

    /// Refresh the node's view from its resolved values, optionally for its
    /// whole subtree as well.
    pub fn update(&mut self, id: NodeId, recursive: bool) -> SceneResult<()> {
        if self.config.refresh_views {
            let values = self.values(id)?;
            if let Some(view) = self.node_mut(id)?.view.as_mut() {
                view.update_view(&values);
            }
        } else {
            self.node(id)?;
        }
        if recursive {
            let children = self.node(id)?.children.clone();
            for child in children {
                self.update(child, true)?;
            }
        }
        Ok(())
    }

    /// Refresh the subtree of `id`, and for every node in it, the subtrees of
    /// everything cloned from that node. Each node is refreshed once.
    pub fn update_recursive_with_clones(&mut self, id: NodeId) -> SceneResult<()> {
        let mut visited = std::collections::HashSet::new();
        self.update_with_clones_inner(id, &mut visited)
    }

    fn update_with_clones_inner(
        &mut self,
        id: NodeId,
        visited: &mut std::collections::HashSet<NodeId>,
    ) -> SceneResult<()> {
        for node in self.depth_first_preorder(id)? {
            if !visited.insert(node) {
                continue;
            }
            self.update(node, false)?;
            let dependents = self.node(node)?.clone_info.cloned().to_vec();
            for dependent in dependents {
                if self.contains_node(dependent) {
                    self.update_with_clones_inner(dependent, visited)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneGraph")
            .field("nodes", &self.nodes.len())
            .field("models", &self.models.len())
            .field("kinds", &self.kinds.tags())
            .field("active_root", &self.active_root)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(SceneGraph: Send);


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::test_kinds::{last_update, registry};
    use super::*;

    fn setup() -> SceneGraph {
        SceneGraph::new(registry())
    }

    #[test]
    fn test_create_node_defaults() {
        let mut graph = setup();
        let id = graph.create_node("box").unwrap();
        assert_eq!(graph.get(id, "alpha").unwrap(), Value::Float(1.0));
        assert!(graph.own_values(id).unwrap().is_empty());
        assert!(graph.node(id).unwrap().clone_info().is_original());
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_unknown_kind() {
        let mut graph = setup();
        assert!(matches!(graph.create_node("circle"), Err(SceneError::UnknownKind(_))));
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_create_with_values_normalizes() {
        let mut graph = setup();
        let id = graph
            .create_node_with_values("box", [("alpha", Value::Float(3.0))])
            .unwrap();
        assert_eq!(graph.get(id, "alpha").unwrap(), Value::Float(1.0));
    }

    #[test]
    fn test_set_refreshes_view_and_notifies() {
        let mut graph = setup();
        let id = graph.create_node("box").unwrap();
        let changes = Arc::new(Mutex::new(Vec::new()));
        let changes_clone = changes.clone();
        graph.signals().value_changed.connect(move |change| {
            changes_clone.lock().push(change.clone());
        });

        assert!(graph.set(id, "x", 5.0).unwrap());
        assert!(!graph.set(id, "x", 5.0).unwrap());

        let changes = changes.lock();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].node, id);
        assert_eq!(changes[0].old_value, Value::Float(0.0));
        assert_eq!(last_update(&graph, id).unwrap()["x"], Value::Float(5.0));
    }

    #[test]
    fn test_undeclared_key() {
        let mut graph = setup();
        let id = graph.create_node("box").unwrap();
        assert!(matches!(graph.set(id, "z", 1.0), Err(SceneError::SchemaViolation { .. })));
        assert!(matches!(graph.get(id, "z"), Err(SceneError::SchemaViolation { .. })));
    }

    #[test]
    fn test_reset_falls_back_to_default() {
        let mut graph = setup();
        let id = graph.create_node("box").unwrap();
        graph.set(id, "y", 2.0).unwrap();
        assert!(graph.reset(id, "y").unwrap());
        assert_eq!(graph.get(id, "y").unwrap(), Value::Float(0.0));
        assert!(!graph.reset(id, "y").unwrap());
    }

    #[test]
    fn test_active_root() {
        let mut graph = setup();
        assert!(matches!(graph.active_root(), Err(SceneError::NotInitialized(_))));
        let id = graph.create_node("box").unwrap();
        graph.set_active_root(id).unwrap();
        assert_eq!(graph.active_root().unwrap(), id);
        graph.clear();
        assert!(graph.active_root().is_err());
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_refresh_views_disabled() {
        let config = GraphConfig::builder().refresh_views(false).build();
        let mut graph = SceneGraph::with_config(registry(), config);
        let id = graph.create_node("box").unwrap();
        graph.set(id, "x", 1.0).unwrap();
        assert!(last_update(&graph, id).is_none());
    }

    #[test]
    fn test_ids_not_reused() {
        let mut graph = setup();
        let a = graph.create_node("box").unwrap();
        graph.dispose(a).unwrap();
        let b = graph.create_node("box").unwrap();
        assert_ne!(a, b);
    }
}
