//! Horizon Scene - a clonable scene node graph.
//!
//! This is the main umbrella crate. It re-exports the public API of
//! `horizon-scene-core` and adds stock node kinds and JSON scene documents.
//!
//! # Example
//!
//! ```
//! use horizon_scene::prelude::*;
//!
//! let mut graph = SceneGraph::new(default_registry());
//! let scene = graph.create_node(SCENE).unwrap();
//! let card = graph.create_node(SPRITE).unwrap();
//! graph.add_child(scene, card).unwrap();
//!
//! // A variant tracks the card until it writes its own values.
//! let variant = graph.clone_node(card, CloneMode::Variant).unwrap();
//! graph.add_child(scene, variant).unwrap();
//! graph.set(card, "image", "card.png").unwrap();
//! assert_eq!(graph.get(variant, "image").unwrap(), Value::from("card.png"));
//! ```

pub use horizon_scene_core::*;

pub mod document;
pub mod kinds;
pub mod prelude;

pub use document::{DocumentError, DocumentResult, SceneDocument};
pub use kinds::{Container, Scene, Sprite, Text, ViewState, default_registry, view_state};
