//! Node kinds and the view contract.
//!
//! The graph never hard-codes concrete node types. A kind is a type tag plus
//! a small capability contract:
//!
//! - [`NodeKind::model_schema`] describes the node's authorable data,
//! - [`NodeKind::create_view`] builds the opaque presentation handle once per
//!   node,
//! - [`View::update_view`] refreshes that handle from resolved values.
//!
//! Kinds are registered by tag in a [`KindRegistry`] which the graph uses to
//! construct nodes, including when restoring them from records.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{SceneError, SceneResult};
use crate::id::NodeId;
use crate::schema::ModelSchema;
use crate::value::Values;

const TARGET: &str = crate::logging::targets::GRAPH;

/// Opaque presentation handle owned by a node.
///
/// The graph calls [`update_view`](Self::update_view) from every node update
/// and never inspects the view otherwise.
pub trait View: Any + Send {
    /// Refresh the view from the node's resolved values.
    fn update_view(&mut self, values: &Values);

    /// Get this as Any for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// A view that ignores updates. Useful for headless kinds.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl View for NullView {
    fn update_view(&mut self, _values: &Values) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The capability contract every node kind satisfies.
pub trait NodeKind: Send + Sync + 'static {
    /// Stable tag identifying the kind in records and sync events.
    fn type_tag(&self) -> &'static str;

    /// Declared keys, defaults, and constraints for nodes of this kind.
    fn model_schema(&self) -> ModelSchema;

    /// Build the presentation handle for a new node.
    fn create_view(&self, node: NodeId) -> Box<dyn View>;
}

/// A registered kind together with its cached schema.
#[derive(Clone)]
pub struct KindEntry {
    kind: Arc<dyn NodeKind>,
    schema: Arc<ModelSchema>,
}

impl KindEntry {
    /// The kind.
    pub fn kind(&self) -> &Arc<dyn NodeKind> {
        &self.kind
    }

    /// The kind's schema, built once at registration.
    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    /// The kind's tag.
    pub fn type_tag(&self) -> &'static str {
        self.kind.type_tag()
    }
}

impl fmt::Debug for KindEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindEntry")
            .field("type_tag", &self.type_tag())
            .field("fields", &self.schema.len())
            .finish()
    }
}

/// Tag → kind lookup used to construct nodes.
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    kinds: HashMap<&'static str, KindEntry>,
}

impl KindRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind, replacing any kind with the same tag.
    pub fn register<K: NodeKind>(&mut self, kind: K) -> &mut Self {
        self.register_arc(Arc::new(kind))
    }

    /// Register an already shared kind.
    pub fn register_arc(&mut self, kind: Arc<dyn NodeKind>) -> &mut Self {
        let tag = kind.type_tag();
        let schema = Arc::new(kind.model_schema());
        tracing::debug!(target: TARGET, tag, fields = schema.len(), "registered node kind");
        self.kinds.insert(tag, KindEntry { kind, schema });
        self
    }

    /// Builder-style registration.
    pub fn with<K: NodeKind>(mut self, kind: K) -> Self {
        self.register(kind);
        self
    }

    /// Look up a kind by tag.
    pub fn get(&self, tag: &str) -> SceneResult<&KindEntry> {
        self.kinds
            .get(tag)
            .ok_or_else(|| SceneError::UnknownKind(tag.to_string()))
    }

    /// Returns `true` if the tag is registered.
    pub fn contains(&self, tag: &str) -> bool {
        self.kinds.contains_key(tag)
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.kinds.keys().copied().collect();
        tags.sort_unstable();
        tags
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;

    impl NodeKind for Marker {
        fn type_tag(&self) -> &'static str {
            "marker"
        }

        fn model_schema(&self) -> ModelSchema {
            ModelSchema::builder("marker").field("x", 0.0).build()
        }

        fn create_view(&self, _node: NodeId) -> Box<dyn View> {
            Box::new(NullView)
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = KindRegistry::new().with(Marker);
        let entry = registry.get("marker").unwrap();
        assert_eq!(entry.type_tag(), "marker");
        assert!(entry.schema().declares("x"));
        assert_eq!(registry.tags(), vec!["marker"]);
    }

    #[test]
    fn test_unknown_kind() {
        let registry = KindRegistry::new();
        assert!(matches!(registry.get("sprite"), Err(SceneError::UnknownKind(_))));
    }

    #[test]
    fn test_null_view_downcast() {
        let view: Box<dyn View> = Marker.create_view(NodeId::from_raw(1));
        assert!(view.as_any().downcast_ref::<NullView>().is_some());
    }
}
