//! Integration tests for cloning, mirroring, and unlinking.

mod common;

use std::sync::Arc;

use common::{assert_tree_consistent, child_of, last_view_values, setup};
use horizon_scene_core::{CloneMode, SceneError, Value};
use parking_lot::Mutex;

#[test]
fn test_defaults_resolve_after_construction() {
    let mut graph = setup();
    let a = graph.create_node("shape").unwrap();
    let schema = graph.node(a).unwrap().kind().schema().clone();

    for field in schema.fields() {
        assert_eq!(&graph.get(a, field.key()).unwrap(), field.default_value());
    }
    assert_eq!(graph.values(a).unwrap().len(), schema.len());
    assert_eq!(last_view_values(&graph, a)["fill"], Value::from("white"));
}

#[test]
fn test_variant_tracks_source() {
    let mut graph = setup();
    let a = graph.create_node("shape").unwrap();
    let b = graph.clone_node(a, CloneMode::Variant).unwrap();
    assert!(graph.model_follows(b, a).unwrap());

    graph.set(a, "x", 5.0).unwrap();
    graph.set(a, "fill", "red").unwrap();
    assert_eq!(graph.get(b, "x").unwrap(), Value::Float(5.0));
    assert_eq!(last_view_values(&graph, b)["fill"], Value::from("red"));

    graph.set(b, "y", 2.0).unwrap();
    graph.set(a, "y", 7.0).unwrap();
    assert_eq!(graph.get(b, "y").unwrap(), Value::Float(2.0));
    assert_eq!(graph.get(a, "y").unwrap(), Value::Float(7.0));
}

#[test]
fn test_variant_change_notifies_dependent() {
    let mut graph = setup();
    let a = graph.create_node("shape").unwrap();
    let b = graph.clone_node(a, CloneMode::Variant).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    graph.signals().value_changed.connect(move |change| {
        seen_clone.lock().push((change.node, change.key.clone()));
    });

    graph.set(a, "x", 1.0).unwrap();
    assert_eq!(*seen.lock(), vec![(a, "x".to_string()), (b, "x".to_string())]);

    // An override on the dependent stops notifications for that key.
    seen.lock().clear();
    graph.set(b, "x", 4.0).unwrap();
    graph.set(a, "x", 2.0).unwrap();
    assert_eq!(*seen.lock(), vec![(b, "x".to_string()), (a, "x".to_string())]);
}

#[test]
fn test_scenario_variant_unlink() {
    let mut graph = setup();
    let a = graph.create_node("shape").unwrap();
    let b = graph.clone_node(a, CloneMode::Variant).unwrap();

    graph.set(a, "x", 5.0).unwrap();
    assert_eq!(graph.get(b, "x").unwrap(), Value::Float(5.0));

    let unlinked = Arc::new(Mutex::new(Vec::new()));
    let unlinked_clone = unlinked.clone();
    graph.signals().unlinked.connect(move |id| unlinked_clone.lock().push(*id));

    graph.unlink(b, true).unwrap();
    assert_eq!(*unlinked.lock(), vec![b]);
    assert_eq!(graph.model_values(b).unwrap(), graph.model_values(a).unwrap());
    assert!(graph.node(b).unwrap().clone_info().is_original());
    assert!(!graph.node(a).unwrap().clone_info().has_cloned());

    graph.set(a, "x", 9.0).unwrap();
    assert_eq!(graph.get(b, "x").unwrap(), Value::Float(5.0));
}

#[test]
fn test_reference_shares_model() {
    let mut graph = setup();
    let a = graph.create_node("shape").unwrap();
    let child = child_of(&mut graph, a);
    let r = graph.clone_node(a, CloneMode::Reference).unwrap();
    let r_child = graph.children(r).unwrap()[0];

    assert!(graph.node(r_child).unwrap().clone_info().is_reference());
    assert!(graph.shares_model(child, r_child).unwrap());

    graph.set(r_child, "width", 12.0).unwrap();
    assert_eq!(graph.get(child, "width").unwrap(), Value::Float(12.0));
    graph.set(child, "height", 8.0).unwrap();
    assert_eq!(graph.get(r_child, "height").unwrap(), Value::Float(8.0));
    assert_eq!(last_view_values(&graph, r_child)["height"], Value::Float(8.0));

    graph.unlink(r_child, true).unwrap();
    assert!(!graph.shares_model(child, r_child).unwrap());
    assert_eq!(graph.get(r_child, "width").unwrap(), Value::Float(12.0));
    graph.set(child, "width", 1.0).unwrap();
    assert_eq!(graph.get(r_child, "width").unwrap(), Value::Float(12.0));
}

#[test]
fn test_reference_root_tracks_source_values() {
    let mut graph = setup();
    let a = graph.create_node("shape").unwrap();
    let r = graph.clone_node(a, CloneMode::Reference).unwrap();
    assert!(graph.node(r).unwrap().clone_info().is_reference_root());
    assert!(!graph.shares_model(a, r).unwrap());

    graph.set(a, "x", 3.0).unwrap();
    assert_eq!(graph.get(r, "x").unwrap(), Value::Float(3.0));
}

#[test]
fn test_child_added_mirrors_into_variant() {
    let mut graph = setup();
    let a = graph.create_node("shape").unwrap();
    let b = graph.clone_node(a, CloneMode::Variant).unwrap();

    let c = child_of(&mut graph, a);
    let b_children = graph.children(b).unwrap().to_vec();
    assert_eq!(b_children.len(), 1);
    let info = graph.node(b_children[0]).unwrap().clone_info().clone();
    assert_eq!(info.mode(), CloneMode::Variant);
    assert_eq!(info.cloner(), Some(c));

    graph.set(c, "x", 4.0).unwrap();
    assert_eq!(graph.get(b_children[0], "x").unwrap(), Value::Float(4.0));
    assert_tree_consistent(&graph);
}

#[test]
fn test_mirroring_preserves_index() {
    let mut graph = setup();
    let a = graph.create_node("shape").unwrap();
    let first = child_of(&mut graph, a);
    let b = graph.clone_node(a, CloneMode::Variant).unwrap();

    let inserted = graph.create_node("shape").unwrap();
    graph.insert_child(a, 0, inserted).unwrap();

    let b_children = graph.children(b).unwrap();
    assert_eq!(b_children.len(), 2);
    assert_eq!(graph.node(b_children[0]).unwrap().clone_info().cloner(), Some(inserted));
    assert_eq!(graph.node(b_children[1]).unwrap().clone_info().cloner(), Some(first));
}

#[test]
fn test_reference_root_mirrors_references() {
    let mut graph = setup();
    let a = graph.create_node("shape").unwrap();
    let r = graph.clone_node(a, CloneMode::Reference).unwrap();
    let c = child_of(&mut graph, a);

    let r_children = graph.children(r).unwrap().to_vec();
    assert_eq!(r_children.len(), 1);
    assert!(graph.node(r_children[0]).unwrap().clone_info().is_reference());
    assert!(graph.shares_model(c, r_children[0]).unwrap());
}

#[test]
fn test_mirroring_cascades_through_variant_chain() {
    let mut graph = setup();
    let a = graph.create_node("shape").unwrap();
    let b = graph.clone_node(a, CloneMode::Variant).unwrap();
    let c = graph.clone_node(b, CloneMode::Variant).unwrap();

    let child = child_of(&mut graph, a);
    let b_child = graph.children(b).unwrap()[0];
    let c_child = graph.children(c).unwrap()[0];
    assert_eq!(graph.node(b_child).unwrap().clone_info().cloner(), Some(child));
    assert_eq!(graph.node(c_child).unwrap().clone_info().cloner(), Some(b_child));

    graph.set(child, "y", 6.0).unwrap();
    assert_eq!(graph.get(c_child, "y").unwrap(), Value::Float(6.0));
    assert_tree_consistent(&graph);
}

#[test]
fn test_duplicate_does_not_mirror() {
    let mut graph = setup();
    let a = graph.create_node("shape").unwrap();
    child_of(&mut graph, a);
    let d = graph.clone_node(a, CloneMode::Duplicate).unwrap();
    assert_eq!(graph.children(d).unwrap().len(), 1);

    child_of(&mut graph, a);
    assert_eq!(graph.children(d).unwrap().len(), 1);
}

#[test]
fn test_scenario_child_removed_mirrors() {
    let mut graph = setup();
    let a = graph.create_node("shape").unwrap();
    let c = child_of(&mut graph, a);
    let b = graph.clone_node(a, CloneMode::Variant).unwrap();

    let b_children = graph.children(b).unwrap().to_vec();
    assert_eq!(b_children.len(), 1);
    let b_c = b_children[0];
    assert_eq!(graph.node(b_c).unwrap().clone_info().cloner(), Some(c));

    graph.remove_child(a, c).unwrap();
    assert!(graph.children(b).unwrap().is_empty());
    assert!(!graph.contains_node(b_c));
    assert!(graph.node(c).unwrap().clone_info().cloned().is_empty());
    assert_tree_consistent(&graph);
}

#[test]
fn test_child_removed_across_all_dependents() {
    let mut graph = setup();
    let a = graph.create_node("shape").unwrap();
    let c = child_of(&mut graph, a);
    let v1 = graph.clone_node(a, CloneMode::Variant).unwrap();
    let v2 = graph.clone_node(a, CloneMode::Variant).unwrap();
    let r = graph.clone_node(a, CloneMode::Reference).unwrap();
    let before = graph.node_count();

    graph.remove_child(a, c).unwrap();
    for dependent in [v1, v2, r] {
        assert!(graph.children(dependent).unwrap().is_empty());
    }
    assert_eq!(graph.node_count(), before - 3);
    assert_tree_consistent(&graph);
}

#[test]
fn test_removing_reference_removes_source() {
    let mut graph = setup();
    let a = graph.create_node("shape").unwrap();
    let c = child_of(&mut graph, a);
    let r = graph.clone_node(a, CloneMode::Reference).unwrap();
    let r_c = graph.children(r).unwrap()[0];

    graph.delete_self(r_c).unwrap();
    assert!(!graph.contains_node(r_c));
    assert!(!graph.contains_node(c));
    assert!(graph.children(a).unwrap().is_empty());
    assert_tree_consistent(&graph);
}

#[test]
fn test_child_added_to_reference_reaches_source() {
    let mut graph = setup();
    let a = graph.create_node("shape").unwrap();
    let r = graph.clone_node(a, CloneMode::Reference).unwrap();

    let added = child_of(&mut graph, r);
    let a_children = graph.children(a).unwrap().to_vec();
    assert_eq!(a_children.len(), 1);
    assert_eq!(graph.children(r).unwrap(), &[added]);
    assert!(graph.shares_model(added, a_children[0]).unwrap());
    assert_tree_consistent(&graph);
}

#[test]
fn test_move_does_not_remove_reference_pair() {
    let mut graph = setup();
    let scene = graph.create_node("shape").unwrap();
    let a = child_of(&mut graph, scene);
    let r = graph.clone_node(a, CloneMode::Reference).unwrap();
    graph.add_child(scene, r).unwrap();

    let group = child_of(&mut graph, scene);
    graph.set_parent(r, group).unwrap();
    assert!(graph.contains_node(a));
    assert_eq!(graph.parent(r).unwrap(), Some(group));
}

#[test]
fn test_clone_self_into_own_subtree_settles() {
    let mut graph = setup();
    let a = graph.create_node("shape").unwrap();
    let v = graph.clone_node(a, CloneMode::Variant).unwrap();

    // The variant becomes a child of its own source: mirroring must not
    // clone the variant into itself.
    graph.add_child(a, v).unwrap();
    assert_eq!(graph.children(a).unwrap(), &[v]);
    assert!(graph.children(v).unwrap().is_empty());
    assert_tree_consistent(&graph);
}

#[test]
fn test_unlink_children_recursively() {
    let mut graph = setup();
    let a = graph.create_node("shape").unwrap();
    let c = child_of(&mut graph, a);
    graph.set(c, "x", 2.0).unwrap();
    let b = graph.clone_node(a, CloneMode::Variant).unwrap();
    let b_c = graph.children(b).unwrap()[0];

    graph.unlink(b, true).unwrap();
    assert!(graph.node(b_c).unwrap().clone_info().is_original());
    assert_eq!(graph.get(b_c, "x").unwrap(), Value::Float(2.0));

    graph.set(c, "x", 5.0).unwrap();
    assert_eq!(graph.get(b_c, "x").unwrap(), Value::Float(2.0));

    // Nothing mirrors after unlinking.
    child_of(&mut graph, a);
    assert_eq!(graph.children(b).unwrap(), &[b_c]);
}

#[test]
fn test_unlink_without_children_keeps_them_linked() {
    let mut graph = setup();
    let a = graph.create_node("shape").unwrap();
    let c = child_of(&mut graph, a);
    let b = graph.clone_node(a, CloneMode::Variant).unwrap();
    let b_c = graph.children(b).unwrap()[0];

    graph.unlink(b, false).unwrap();
    assert_eq!(graph.node(b_c).unwrap().clone_info().cloner(), Some(c));
}

#[test]
fn test_dispose_clears_relationships() {
    let mut graph = setup();
    let a = graph.create_node("shape").unwrap();
    let c = child_of(&mut graph, a);
    let b = graph.clone_node(a, CloneMode::Variant).unwrap();
    let disposed = Arc::new(Mutex::new(Vec::new()));
    let disposed_clone = disposed.clone();
    graph.signals().disposed.connect(move |id| disposed_clone.lock().push(*id));

    graph.dispose(b).unwrap();
    assert_eq!(disposed.lock().len(), 2);
    assert!(!graph.node(a).unwrap().clone_info().has_cloned());
    assert!(!graph.node(c).unwrap().clone_info().has_cloned());
    assert_tree_consistent(&graph);
}

#[test]
fn test_errors_surface_immediately() {
    let mut graph = setup();
    let a = graph.create_node("shape").unwrap();
    let b = graph.create_node("shape").unwrap();
    assert!(matches!(graph.add_child(a, a), Err(SceneError::InvalidOperation(_))));
    assert!(graph.remove_child(a, b).unwrap_err().is_not_found());
    graph.dispose(b).unwrap();
    assert_eq!(graph.set(b, "x", 1.0), Err(SceneError::NodeNotFound(b)));
}
