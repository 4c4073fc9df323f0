//! Core systems for Horizon Scene.
//!
//! This crate provides the clonable node graph at the heart of Horizon Scene:
//!
//! - **Scene Graph**: an arena of nodes with an ordered parent/children tree,
//!   traversal, and structural signals
//! - **Models**: schema-validated, prototype-chained value storage with
//!   change fan-out
//! - **Clone Engine**: variant, duplicate, and reference clones that track
//!   their source's values and structure, with linking, unlinking, and
//!   flattening
//! - **Custom Properties**: named, typed values defined on nodes and assigned
//!   to model keys, inherited down the tree and through clones
//! - **Persistence**: node records and sync events for rebuilding a graph
//!   elsewhere
//! - **Signal/Slot System**: type-safe, synchronous notifications
//!
//! # Clone Example
//!
//! ```
//! use horizon_scene_core::{CloneMode, KindRegistry, ModelSchema, NodeId, NodeKind, NullView, SceneGraph, View};
//!
//! struct Sprite;
//!
//! impl NodeKind for Sprite {
//!     fn type_tag(&self) -> &'static str { "sprite" }
//!     fn model_schema(&self) -> ModelSchema {
//!         ModelSchema::builder("sprite").field("x", 0.0).field("y", 0.0).build()
//!     }
//!     fn create_view(&self, _node: NodeId) -> Box<dyn View> { Box::new(NullView) }
//! }
//!
//! let mut graph = SceneGraph::new(KindRegistry::new().with(Sprite));
//! let source = graph.create_node("sprite").unwrap();
//! let variant = graph.clone_node(source, CloneMode::Variant).unwrap();
//!
//! // Variants follow their source until they override a key.
//! graph.set(source, "x", 10.0).unwrap();
//! assert_eq!(graph.get(variant, "x").unwrap().as_f64(), Some(10.0));
//!
//! graph.set(variant, "x", 3.0).unwrap();
//! graph.set(source, "x", 20.0).unwrap();
//! assert_eq!(graph.get(variant, "x").unwrap().as_f64(), Some(3.0));
//!
//! // Structure is mirrored as well.
//! let child = graph.create_node("sprite").unwrap();
//! graph.add_child(source, child).unwrap();
//! assert_eq!(graph.children(variant).unwrap().len(), 1);
//! ```
//!
//! # Signal Example
//!
//! ```
//! use horizon_scene_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```

mod clone_info;
mod config;
mod custom_props;
mod error;
mod events;
pub mod graph;
mod id;
mod kind;
pub mod logging;
pub mod model;
pub mod persistence;
pub mod schema;
pub mod signal;
mod value;

pub use clone_info::{CloneInfo, CloneMode};
pub use config::{DEFAULT_MAX_CLONE_DEPTH, GraphConfig, GraphConfigBuilder};
pub use custom_props::{CustomProperties, CustomProperty};
pub use error::{SceneError, SceneResult};
pub use events::{ChildEvent, GraphSignals, ValueChange};
pub use graph::{Node, SceneGraph, Walk, WalkDirection, WalkOptions};
pub use id::{IdGenerator, NodeId};
pub use kind::{KindEntry, KindRegistry, NodeKind, NullView, View};
pub use logging::{PerfSpan, SceneTreeDebug, TreeFormatOptions, TreeStyle};
pub use model::{ModelChange, ModelId, ModelStore};
pub use persistence::{AssignmentRecord, CloneRecord, NodeRecord, SyncEvent};
pub use schema::{Constraint, FieldSpec, ModelSchema, ModelSchemaBuilder};
pub use signal::{ConnectionId, Signal, SignalEmitter};
pub use value::{PropertyType, Value, Values};
