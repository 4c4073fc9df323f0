//! Prelude module for Horizon Scene.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```
//! use horizon_scene::prelude::*;
//! ```
//!
//! This provides access to:
//! - The graph (`SceneGraph`, `Node`, `NodeId`, `CloneMode`)
//! - Values and schemas (`Value`, `Values`, `ModelSchema`, `Constraint`)
//! - Custom properties (`CustomProperty`, `PropertyType`)
//! - Stock kinds (`Scene`, `Container`, `Sprite`, `Text`) and their tags
//! - Documents (`SceneDocument`)

// ============================================================================
// Scene Graph
// ============================================================================

pub use crate::{
    CloneInfo, CloneMode, GraphConfig, Node, NodeId, SceneError, SceneGraph, SceneResult, Walk,
    WalkDirection, WalkOptions,
};

// ============================================================================
// Values and Schemas
// ============================================================================

pub use crate::{Constraint, ModelSchema, Value, Values};

// ============================================================================
// Custom Properties
// ============================================================================

pub use crate::{CustomProperty, PropertyType};

// ============================================================================
// Kinds and Views
// ============================================================================

pub use crate::kinds::{
    CONTAINER, Container, SCENE, SPRITE, Scene, Sprite, TEXT, Text, ViewState, default_registry,
    view_state,
};
pub use crate::{KindRegistry, NodeKind, NullView, View};

// ============================================================================
// Signals and Persistence
// ============================================================================

pub use crate::document::{DocumentError, SceneDocument};
pub use crate::{ConnectionId, Signal, SyncEvent};
