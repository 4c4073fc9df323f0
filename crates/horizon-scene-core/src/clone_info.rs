//! Clone relationship records.

use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// How a node relates to the node it was cloned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloneMode {
    /// Not cloned from anything.
    #[default]
    Original,
    /// Live-delegates to the cloner's model; follows the cloner's structure.
    Variant,
    /// One-time copy, independent afterwards.
    Duplicate,
    /// Shares the cloner's model instance outright.
    Reference,
    /// Top node of a reference clone; its model delegates to the cloner's
    /// and both carry the "is-reference" flag.
    ReferenceRoot,
}

impl CloneMode {
    /// The mode a clone actually receives at `depth` within one clone
    /// operation. `Reference` at depth 0 becomes `ReferenceRoot`.
    pub fn at_depth(self, depth: usize) -> Self {
        match self {
            Self::Reference if depth == 0 => Self::ReferenceRoot,
            other => other,
        }
    }

    /// The mode used for children mirrored into a dependent of this mode.
    ///
    /// Reference roots propagate plain references; every other mode
    /// propagates itself.
    pub fn mirrored(self) -> Self {
        match self {
            Self::ReferenceRoot => Self::Reference,
            other => other,
        }
    }
}

/// The clone relationship of one node.
///
/// Holds the node's cloner (absent for originals) and its dependents, the
/// nodes cloned from it, in registration order. The graph keeps both
/// directions consistent: a node appears in exactly one cloner's dependent
/// list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneInfo {
    mode: CloneMode,
    cloner: Option<NodeId>,
    cloned: Vec<NodeId>,
    follows_cloner: bool,
}

impl CloneInfo {
    /// Record for a node that was not cloned.
    pub fn original() -> Self {
        Self::default()
    }

    /// Record for a node cloned from `cloner`.
    pub fn cloned_from(cloner: NodeId, mode: CloneMode) -> Self {
        Self {
            mode,
            cloner: (mode != CloneMode::Original).then_some(cloner),
            cloned: Vec::new(),
            follows_cloner: false,
        }
    }

    /// The clone mode.
    pub fn mode(&self) -> CloneMode {
        self.mode
    }

    /// The node this one was cloned from.
    pub fn cloner(&self) -> Option<NodeId> {
        self.cloner
    }

    /// Nodes cloned from this one.
    pub fn cloned(&self) -> &[NodeId] {
        &self.cloned
    }

    /// Returns `true` if anything was cloned from this node.
    pub fn has_cloned(&self) -> bool {
        !self.cloned.is_empty()
    }

    /// Apply `f` to every dependent in registration order.
    pub fn for_each_cloned(&self, mut f: impl FnMut(NodeId)) {
        for &id in &self.cloned {
            f(id);
        }
    }

    /// `true` for [`CloneMode::Original`].
    pub fn is_original(&self) -> bool {
        self.mode == CloneMode::Original
    }

    /// `true` for [`CloneMode::Variant`].
    pub fn is_variant(&self) -> bool {
        self.mode == CloneMode::Variant
    }

    /// `true` for [`CloneMode::Duplicate`].
    pub fn is_duplicate(&self) -> bool {
        self.mode == CloneMode::Duplicate
    }

    /// `true` for [`CloneMode::Reference`] only.
    pub fn is_reference(&self) -> bool {
        self.mode == CloneMode::Reference
    }

    /// `true` for [`CloneMode::ReferenceRoot`].
    pub fn is_reference_root(&self) -> bool {
        self.mode == CloneMode::ReferenceRoot
    }

    /// `true` for either reference mode.
    pub fn is_reference_or_root(&self) -> bool {
        self.is_reference() || self.is_reference_root()
    }

    /// Whether structural edits on the cloner are mirrored into this node.
    pub fn follows_cloner(&self) -> bool {
        self.follows_cloner && self.cloner.is_some()
    }

    pub(crate) fn set_follows_cloner(&mut self, follows: bool) {
        self.follows_cloner = follows;
    }

    pub(crate) fn add_cloned(&mut self, node: NodeId) {
        if !self.cloned.contains(&node) {
            self.cloned.push(node);
        }
    }

    /// Detach one dependent. Returns `true` if it was present.
    pub(crate) fn remove_cloned(&mut self, node: NodeId) -> bool {
        let before = self.cloned.len();
        self.cloned.retain(|&n| n != node);
        before != self.cloned.len()
    }

    /// Forget the cloner. The node becomes an original; its own dependents
    /// are kept.
    pub(crate) fn unlink(&mut self) {
        self.mode = CloneMode::Original;
        self.cloner = None;
        self.follows_cloner = false;
    }
}
