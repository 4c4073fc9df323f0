//! Stock node kinds.
//!
//! Four kinds cover the common scene layouts:
//!
//! | Tag           | Kind          | Purpose                               |
//! |---------------|---------------|---------------------------------------|
//! | `"scene"`     | [`Scene`]     | Top of a document, holds the backdrop |
//! | `"container"` | [`Container`] | Positioned group of other nodes       |
//! | `"sprite"`    | [`Sprite`]    | Image placed in the scene             |
//! | `"text"`      | [`Text`]      | Run of styled text                    |
//!
//! Every stock kind presents itself through a [`ViewState`], which keeps the
//! last resolved values it was given. Applications that render the scene read
//! it back with [`view_state`].

use std::any::Any;

use horizon_scene_core::{
    Constraint, KindRegistry, ModelSchema, NodeId, NodeKind, SceneGraph, SceneResult, Value,
    Values, View,
};

/// Tag of the [`Scene`] kind.
pub const SCENE: &str = "scene";
/// Tag of the [`Container`] kind.
pub const CONTAINER: &str = "container";
/// Tag of the [`Sprite`] kind.
pub const SPRITE: &str = "sprite";
/// Tag of the [`Text`] kind.
pub const TEXT: &str = "text";

/// The presentation state of a stock node.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    node: Option<NodeId>,
    values: Values,
    revision: u64,
}

impl ViewState {
    fn for_node(node: NodeId) -> Self {
        Self {
            node: Some(node),
            ..Self::default()
        }
    }

    /// The node this view belongs to.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// The values of the last refresh.
    pub fn values(&self) -> &Values {
        &self.values
    }

    /// A single value from the last refresh.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// How many refreshes the view has received.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl View for ViewState {
    fn update_view(&mut self, values: &Values) {
        self.values.clone_from(values);
        self.revision += 1;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The [`ViewState`] of a node built from a stock kind.
///
/// Returns `Ok(None)` if the node's view is of another type.
pub fn view_state(graph: &SceneGraph, id: NodeId) -> SceneResult<Option<&ViewState>> {
    Ok(graph
        .view(id)?
        .and_then(|view| view.as_any().downcast_ref::<ViewState>()))
}

fn opacity() -> Constraint {
    Constraint::range(0.0, 1.0)
}

fn scale() -> Constraint {
    Constraint::Min(0.0)
}

/// The root of a scene document.
#[derive(Debug, Default, Clone, Copy)]
pub struct Scene;

impl NodeKind for Scene {
    fn type_tag(&self) -> &'static str {
        SCENE
    }

    fn model_schema(&self) -> ModelSchema {
        ModelSchema::builder(SCENE)
            .constrained("width", 1920, [Constraint::Min(1.0)])
            .constrained("height", 1080, [Constraint::Min(1.0)])
            .field("background", "#000000")
            .build()
    }

    fn create_view(&self, node: NodeId) -> Box<dyn View> {
        Box::new(ViewState::for_node(node))
    }
}

/// A positioned group.
#[derive(Debug, Default, Clone, Copy)]
pub struct Container;

impl NodeKind for Container {
    fn type_tag(&self) -> &'static str {
        CONTAINER
    }

    fn model_schema(&self) -> ModelSchema {
        ModelSchema::builder(CONTAINER)
            .field("x", 0.0)
            .field("y", 0.0)
            .constrained("scale", 1.0, [scale()])
            .field("rotation", 0.0)
            .constrained("opacity", 1.0, [opacity()])
            .field("visible", true)
            .build()
    }

    fn create_view(&self, node: NodeId) -> Box<dyn View> {
        Box::new(ViewState::for_node(node))
    }
}

/// An image.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sprite;

impl NodeKind for Sprite {
    fn type_tag(&self) -> &'static str {
        SPRITE
    }

    fn model_schema(&self) -> ModelSchema {
        ModelSchema::builder(SPRITE)
            .field("x", 0.0)
            .field("y", 0.0)
            .constrained("width", 100.0, [Constraint::Min(0.0)])
            .constrained("height", 100.0, [Constraint::Min(0.0)])
            .constrained("scale", 1.0, [scale()])
            .field("rotation", 0.0)
            .constrained("opacity", 1.0, [opacity()])
            .field("visible", true)
            .field("image", "")
            .field("tint", "#ffffff")
            .build()
    }

    fn create_view(&self, node: NodeId) -> Box<dyn View> {
        Box::new(ViewState::for_node(node))
    }
}

/// A run of text.
#[derive(Debug, Default, Clone, Copy)]
pub struct Text;

impl NodeKind for Text {
    fn type_tag(&self) -> &'static str {
        TEXT
    }

    fn model_schema(&self) -> ModelSchema {
        let align = ["left", "center", "right"].map(Value::from).to_vec();
        ModelSchema::builder(TEXT)
            .field("x", 0.0)
            .field("y", 0.0)
            .constrained("opacity", 1.0, [opacity()])
            .field("visible", true)
            .field("text", "")
            .field("font", "sans-serif")
            .constrained("font_size", 16.0, [Constraint::Min(1.0)])
            .field("color", "#ffffff")
            .constrained("align", "left", [Constraint::OneOf(align)])
            .build()
    }

    fn create_view(&self, node: NodeId) -> Box<dyn View> {
        Box::new(ViewState::for_node(node))
    }
}

/// A registry holding every stock kind.
pub fn default_registry() -> KindRegistry {
    KindRegistry::new()
        .with(Scene)
        .with(Container)
        .with(Sprite)
        .with(Text)
}
