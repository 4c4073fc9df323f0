//! End-to-end tests for the stock kinds and JSON scene documents.

use horizon_scene::SceneTreeDebug;
use horizon_scene::prelude::*;

fn setup() -> SceneGraph {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("horizon_scene=debug,horizon_scene_core=debug")
        .with_test_writer()
        .try_init();
    SceneGraph::new(default_registry())
}

/// A title card: a scene holding a container with a sprite and a caption,
/// plus a variant of the container. The caption's text comes from a scene
/// property.
fn build_card(graph: &mut SceneGraph) -> (NodeId, NodeId, NodeId, NodeId, NodeId) {
    let scene = graph.create_node(SCENE).unwrap();
    graph.set_name(scene, "deck").unwrap();
    let card = graph.create_node(CONTAINER).unwrap();
    graph.set_name(card, "card").unwrap();
    graph.add_child(scene, card).unwrap();

    let art = graph.create_node(SPRITE).unwrap();
    graph.set(art, "image", "art.png").unwrap();
    graph.add_child(card, art).unwrap();

    let caption = graph.create_node(TEXT).unwrap();
    graph.add_child(card, caption).unwrap();
    graph
        .set_custom_property(scene, "title", PropertyType::Text, "Sunrise")
        .unwrap();
    graph.assign_custom_property(caption, "text", "title").unwrap();

    let variant = graph.clone_node(card, CloneMode::Variant).unwrap();
    graph.add_child(scene, variant).unwrap();
    graph.set(variant, "x", 320.0).unwrap();

    graph.set_active_root(scene).unwrap();
    (scene, card, art, caption, variant)
}

#[test]
fn test_variant_tracks_source_then_unlinks() {
    let mut graph = setup();
    let a = graph.create_node(SPRITE).unwrap();
    let b = graph.clone_node(a, CloneMode::Variant).unwrap();

    graph.set(a, "x", 5.0).unwrap();
    assert_eq!(graph.get(b, "x").unwrap(), Value::Float(5.0));

    graph.unlink(b, true).unwrap();
    assert_eq!(graph.get(b, "x").unwrap(), Value::Float(5.0));
    graph.set(a, "x", 9.0).unwrap();
    assert_eq!(graph.get(b, "x").unwrap(), Value::Float(5.0));
    assert_eq!(view_state(&graph, b).unwrap().unwrap().value("x"), Some(&Value::Float(5.0)));
}

#[test]
fn test_removing_child_removes_mirror() {
    let mut graph = setup();
    let a = graph.create_node(CONTAINER).unwrap();
    let c = graph.create_node(SPRITE).unwrap();
    graph.add_child(a, c).unwrap();
    let b = graph.clone_node(a, CloneMode::Variant).unwrap();
    assert_eq!(graph.children(b).unwrap().len(), 1);

    graph.remove_child(a, c).unwrap();
    assert!(graph.children(b).unwrap().is_empty());
}

#[test]
fn test_document_round_trip() {
    let mut graph = setup();
    let (scene, card, art, caption, variant) = build_card(&mut graph);

    let json = SceneDocument::from_graph(&graph)
        .unwrap()
        .to_json_pretty()
        .unwrap();
    let document = SceneDocument::from_json(&json).unwrap();
    assert_eq!(document.len(), graph.node_count());

    let mut copy = SceneGraph::new(default_registry());
    document.restore_into(&mut copy).unwrap();

    assert_eq!(copy.active_root().unwrap(), scene);
    assert_eq!(copy.name(card).unwrap(), "card");
    assert_eq!(copy.children(scene).unwrap(), &[card, variant]);
    assert_eq!(copy.get(art, "image").unwrap(), Value::from("art.png"));
    assert_eq!(copy.values(caption).unwrap()["text"], Value::from("Sunrise"));

    // The variant's mirrored children resolve through the restored clone links.
    let variant_children = copy.children(variant).unwrap().to_vec();
    assert_eq!(variant_children.len(), 2);
    let variant_art = variant_children[0];
    assert_eq!(copy.get(variant_art, "image").unwrap(), Value::from("art.png"));
    assert_eq!(copy.get(variant, "x").unwrap(), Value::Float(320.0));

    copy.set(art, "image", "dusk.png").unwrap();
    assert_eq!(
        view_state(&copy, variant_art).unwrap().unwrap().value("image"),
        Some(&Value::from("dusk.png"))
    );

    copy.set_custom_property(scene, "title", PropertyType::Text, "Sunset")
        .unwrap();
    let variant_caption = variant_children[1];
    assert_eq!(
        view_state(&copy, variant_caption).unwrap().unwrap().value("text"),
        Some(&Value::from("Sunset"))
    );
}

#[test]
fn test_subtree_document_into_graph_with_outside_cloner() {
    let mut graph = setup();
    let (_, card, _, _, variant) = build_card(&mut graph);

    // The variant's subtree refers to the card, which the target must hold.
    let document = SceneDocument::from_subtree(&graph, variant).unwrap();
    let mut target = SceneGraph::new(default_registry());
    assert!(matches!(
        document.restore_into(&mut target),
        Err(DocumentError::Scene(SceneError::NodeNotFound(id))) if id == card
    ));
}

#[test]
fn test_sync_events_as_json() {
    let mut source = setup();
    let scene = source.create_node(SCENE).unwrap();
    let mut replica = SceneGraph::new(default_registry());
    replica
        .apply_sync_event(&SyncEvent::NodeCreated {
            record: source.node_record(scene).unwrap(),
        })
        .unwrap();

    let sprite = source.create_node(SPRITE).unwrap();
    source.add_child(scene, sprite).unwrap();
    source.set(sprite, "opacity", 0.25).unwrap();

    let events = vec![
        SyncEvent::NodeCreated {
            record: source.node_record(sprite).unwrap(),
        },
        SyncEvent::ValueChanged {
            id: sprite,
            key: "rotation".into(),
            value: Value::Float(90.0),
        },
    ];
    let wire = serde_json::to_string(&events).unwrap();
    let received: Vec<SyncEvent> = serde_json::from_str(&wire).unwrap();
    for event in &received {
        replica.apply_sync_event(event).unwrap();
    }

    assert_eq!(replica.children(scene).unwrap(), &[sprite]);
    assert_eq!(replica.get(sprite, "opacity").unwrap(), Value::Float(0.25));
    assert_eq!(replica.get(sprite, "rotation").unwrap(), Value::Float(90.0));
}

#[test]
fn test_tree_debug_output() {
    let mut graph = setup();
    let (scene, _, _, _, variant) = build_card(&mut graph);
    let text = SceneTreeDebug::new().format_all(&graph).unwrap();
    assert!(text.contains(&format!("deck [{scene}] (scene)")));
    assert!(text.contains(&format!("card [{variant}] (container)")));
}
