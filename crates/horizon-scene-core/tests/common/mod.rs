//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::any::Any;
use std::sync::Arc;

use horizon_scene_core::{
    Constraint, KindRegistry, ModelSchema, NodeId, NodeKind, SceneGraph, Values, View,
};
use parking_lot::Mutex;

/// A view that keeps every update it receives.
pub struct RecordingView {
    pub updates: Arc<Mutex<Vec<Values>>>,
}

impl View for RecordingView {
    fn update_view(&mut self, values: &Values) {
        self.updates.lock().push(values.clone());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct Shape;

impl NodeKind for Shape {
    fn type_tag(&self) -> &'static str {
        "shape"
    }

    fn model_schema(&self) -> ModelSchema {
        ModelSchema::builder("shape")
            .field("x", 0.0)
            .field("y", 0.0)
            .field("width", 100.0)
            .field("height", 100.0)
            .constrained("opacity", 1.0, [Constraint::range(0.0, 1.0)])
            .field("fill", "white")
            .build()
    }

    fn create_view(&self, _node: NodeId) -> Box<dyn View> {
        Box::new(RecordingView {
            updates: Arc::new(Mutex::new(Vec::new())),
        })
    }
}

pub fn setup() -> SceneGraph {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("horizon_scene_core=debug")
        .with_test_writer()
        .try_init();
    SceneGraph::new(KindRegistry::new().with(Shape))
}

/// Create a shape and attach it under `parent`.
pub fn child_of(graph: &mut SceneGraph, parent: NodeId) -> NodeId {
    let id = graph.create_node("shape").unwrap();
    graph.add_child(parent, id).unwrap();
    id
}

/// The values the node's view last received.
pub fn last_view_values(graph: &SceneGraph, id: NodeId) -> Values {
    graph
        .view(id)
        .unwrap()
        .unwrap()
        .as_any()
        .downcast_ref::<RecordingView>()
        .unwrap()
        .updates
        .lock()
        .last()
        .cloned()
        .unwrap()
}

/// Check both directions of every parent/child edge.
pub fn assert_tree_consistent(graph: &SceneGraph) {
    for id in graph.node_ids() {
        let node = graph.node(id).unwrap();
        if let Some(parent) = node.parent() {
            let siblings = graph.children(parent).unwrap();
            assert_eq!(
                siblings.iter().filter(|&&c| c == id).count(),
                1,
                "{id} should appear once under {parent}"
            );
        }
        for &child in node.children() {
            assert_eq!(graph.parent(child).unwrap(), Some(id));
        }
        if let Some(cloner) = node.clone_info().cloner() {
            assert!(
                graph.node(cloner).unwrap().clone_info().cloned().contains(&id),
                "{cloner} should list {id} as cloned"
            );
        }
        for &dependent in node.clone_info().cloned() {
            assert_eq!(graph.node(dependent).unwrap().clone_info().cloner(), Some(id));
        }
    }
}
