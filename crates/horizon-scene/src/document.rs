//! JSON scene documents.
//!
//! A [`SceneDocument`] is a versioned list of [`NodeRecord`]s. It is produced
//! from a live graph with [`SceneDocument::from_graph`] or
//! [`SceneDocument::from_subtree`], written and read with `serde_json`, and
//! rebuilt into a graph with [`SceneDocument::restore_into`]. The receiving
//! graph must have the document's node kinds registered.
//!
//! ```
//! use horizon_scene::document::SceneDocument;
//! use horizon_scene::kinds::{SPRITE, default_registry};
//! use horizon_scene::{CloneMode, SceneGraph};
//!
//! let mut graph = SceneGraph::new(default_registry());
//! let sprite = graph.create_node(SPRITE).unwrap();
//! graph.clone_node(sprite, CloneMode::Variant).unwrap();
//!
//! let json = SceneDocument::from_graph(&graph).unwrap().to_json().unwrap();
//!
//! let mut copy = SceneGraph::new(default_registry());
//! SceneDocument::from_json(&json).unwrap().restore_into(&mut copy).unwrap();
//! assert_eq!(copy.node_count(), 2);
//! ```

use std::io::{Read, Write};

use horizon_scene_core::{NodeId, NodeRecord, SceneError, SceneGraph};
use serde::{Deserialize, Serialize};

/// The document format written by this crate.
pub const FORMAT_VERSION: u32 = 1;

/// Errors from reading, writing, or restoring a document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The JSON could not be produced or parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The graph rejected the document's records.
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// The document was written by an incompatible version.
    #[error("Unsupported document version {found} (expected {FORMAT_VERSION})")]
    UnsupportedVersion {
        /// The version found in the document.
        found: u32,
    },
}

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// A serializable snapshot of a scene graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Format version.
    pub version: u32,
    /// The node to open first, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_root: Option<NodeId>,
    /// Records in restore order.
    pub nodes: Vec<NodeRecord>,
}

impl SceneDocument {
    /// An empty document.
    pub fn new() -> Self {
        Self {
            version: FORMAT_VERSION,
            active_root: None,
            nodes: Vec::new(),
        }
    }

    /// Snapshot every node in the graph.
    pub fn from_graph(graph: &SceneGraph) -> DocumentResult<Self> {
        Ok(Self {
            version: FORMAT_VERSION,
            active_root: graph.active_root().ok(),
            nodes: graph.snapshot_all()?,
        })
    }

    /// Snapshot one subtree. The subtree's root becomes the active root.
    pub fn from_subtree(graph: &SceneGraph, root: NodeId) -> DocumentResult<Self> {
        Ok(Self {
            version: FORMAT_VERSION,
            active_root: Some(root),
            nodes: graph.snapshot(root)?,
        })
    }

    /// Number of node records.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the document holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Compact JSON.
    pub fn to_json(&self) -> DocumentResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Indented JSON.
    pub fn to_json_pretty(&self) -> DocumentResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document, rejecting versions this crate cannot read.
    pub fn from_json(source: &str) -> DocumentResult<Self> {
        let document: Self = serde_json::from_str(source)?;
        document.check_version()?;
        Ok(document)
    }

    /// Write compact JSON to a writer.
    pub fn write_to<W: Write>(&self, writer: W) -> DocumentResult<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Read a document from a reader.
    pub fn read_from<R: Read>(reader: R) -> DocumentResult<Self> {
        let document: Self = serde_json::from_reader(reader)?;
        document.check_version()?;
        Ok(document)
    }

    fn check_version(&self) -> DocumentResult<()> {
        if self.version != FORMAT_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: self.version,
            });
        }
        Ok(())
    }

    /// Rebuild the document's nodes in `graph`.
    ///
    /// Node ids are kept, so the graph must not already hold any of them.
    /// Returns the restored ids in document order.
    pub fn restore_into(&self, graph: &mut SceneGraph) -> DocumentResult<Vec<NodeId>> {
        self.check_version()?;
        let restored = graph.restore(&self.nodes)?;
        if let Some(root) = self.active_root {
            if graph.contains_node(root) {
                graph.set_active_root(root)?;
            }
        }
        tracing::debug!(
            target: "horizon_scene::document",
            nodes = restored.len(),
            active_root = ?self.active_root,
            "restored scene document"
        );
        Ok(restored)
    }
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(SceneDocument: Send, Sync);
static_assertions::assert_impl_all!(DocumentError: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{CONTAINER, SCENE, SPRITE, default_registry};

    fn setup() -> (SceneGraph, NodeId, NodeId) {
        let mut graph = SceneGraph::new(default_registry());
        let scene = graph.create_node(SCENE).unwrap();
        let group = graph.create_node(CONTAINER).unwrap();
        graph.add_child(scene, group).unwrap();
        graph.set_active_root(scene).unwrap();
        (graph, scene, group)
    }

    #[test]
    fn test_from_graph_keeps_active_root() {
        let (graph, scene, _) = setup();
        let document = SceneDocument::from_graph(&graph).unwrap();
        assert_eq!(document.version, FORMAT_VERSION);
        assert_eq!(document.active_root, Some(scene));
        assert_eq!(document.len(), 2);
    }

    #[test]
    fn test_from_subtree() {
        let (mut graph, _, group) = setup();
        let sprite = graph.create_node(SPRITE).unwrap();
        graph.add_child(group, sprite).unwrap();
        let document = SceneDocument::from_subtree(&graph, group).unwrap();
        let ids: Vec<NodeId> = document.nodes.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![group, sprite]);
        assert_eq!(document.active_root, Some(group));
    }

    #[test]
    fn test_version_rejected() {
        let mut document = SceneDocument::new();
        document.version = FORMAT_VERSION + 1;
        let json = document.to_json().unwrap();
        assert!(matches!(
            SceneDocument::from_json(&json),
            Err(DocumentError::UnsupportedVersion { found }) if found == FORMAT_VERSION + 1
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            SceneDocument::from_json("{\"version\": 1"),
            Err(DocumentError::Json(_))
        ));
    }

    #[test]
    fn test_restore_into_occupied_graph() {
        let (graph, scene, _) = setup();
        let document = SceneDocument::from_graph(&graph).unwrap();
        let mut same = graph;
        assert!(matches!(
            document.restore_into(&mut same),
            Err(DocumentError::Scene(SceneError::DuplicateId(id))) if id == scene
        ));
    }

    #[test]
    fn test_writer_and_reader() {
        let (graph, _, _) = setup();
        let document = SceneDocument::from_graph(&graph).unwrap();
        let mut buffer = Vec::new();
        document.write_to(&mut buffer).unwrap();
        let back = SceneDocument::read_from(buffer.as_slice()).unwrap();
        assert_eq!(back, document);
    }
}
