//! Logging and debugging facilities for Horizon Scene.
//!
//! This module provides:
//! - Integration with the `tracing` crate for structured logging
//! - Debug visualization for scene trees
//! - Performance tracing hooks for profiling
//!
//! # Tracing Integration
//!
//! Horizon Scene uses the `tracing` crate for instrumentation. Every event
//! carries one of the [`targets`], so a subscriber can enable, say, only the
//! clone engine:
//!
//! ```ignore
//! use tracing_subscriber::EnvFilter;
//!
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter(EnvFilter::new("horizon_scene_core::clone=debug"))
//!         .init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! # Debug Visualization
//!
//! Use [`SceneTreeDebug`] to get detailed views of a graph:
//!
//! ```ignore
//! use horizon_scene_core::logging::SceneTreeDebug;
//!
//! let debug = SceneTreeDebug::new();
//! println!("{}", debug.format_all(&graph));
//! ```

use std::fmt;

use crate::clone_info::CloneMode;
use crate::error::SceneResult;
use crate::graph::SceneGraph;
use crate::id::NodeId;

/// Span names used throughout Horizon Scene for tracing.
pub mod span_names {
    /// A clone operation, including its nested clones.
    pub const CLONE: &str = "clone";
    /// Performance measurement span.
    pub const PERF: &str = "perf";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_scene_core";
    /// Node lifecycle and structure.
    pub const GRAPH: &str = "horizon_scene_core::graph";
    /// Cloning, mirroring, and unlinking.
    pub const CLONE: &str = "horizon_scene_core::clone";
    /// Model values and delegation.
    pub const MODEL: &str = "horizon_scene_core::model";
    /// Signal emission.
    pub const SIGNAL: &str = "horizon_scene_core::signal";
    /// Custom properties.
    pub const CUSTOM_PROPS: &str = "horizon_scene_core::custom_props";
    /// Records and sync events.
    pub const SYNC: &str = "horizon_scene_core::sync";
    /// Performance spans.
    pub const PERF: &str = "horizon_scene_core::perf";
}

/// Style options for scene tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line representation.
    Compact,
}

/// Configuration for scene tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node IDs.
    pub show_ids: bool,
    /// Whether to show kind tags.
    pub show_kinds: bool,
    /// Whether to show the clone mode and cloner.
    pub show_clone_info: bool,
    /// Whether to show custom property definitions and assignments.
    pub show_properties: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_kinds: true,
            show_clone_info: true,
            show_properties: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_properties: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_kinds: false,
            show_clone_info: false,
            show_properties: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing scene trees.
#[derive(Debug, Clone, Default)]
pub struct SceneTreeDebug {
    options: TreeFormatOptions,
}

impl SceneTreeDebug {
    /// Create a new debug visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format every tree in the graph, one per root node.
    pub fn format_all(&self, graph: &SceneGraph) -> SceneResult<String> {
        let roots = graph.root_nodes();
        let mut output = format!("Scene Graph ({} total nodes):\n", graph.node_count());
        if roots.is_empty() {
            output.push_str("  (empty)\n");
        }
        for root in roots {
            self.format_subtree_into(graph, root, 0, true, &mut output)?;
        }
        Ok(output)
    }

    /// Format a subtree starting from a specific node.
    pub fn format_subtree(&self, graph: &SceneGraph, root: NodeId) -> SceneResult<String> {
        let mut output = String::new();
        self.format_subtree_into(graph, root, 0, true, &mut output)?;
        Ok(output)
    }

    fn format_subtree_into(
        &self,
        graph: &SceneGraph,
        id: NodeId,
        depth: usize,
        is_last: bool,
        output: &mut String,
    ) -> SceneResult<()> {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return Ok(());
        }
        let node = graph.node(id)?;

        output.push_str(&self.build_prefix(depth, is_last));
        output.push_str(if node.name().is_empty() {
            "(unnamed)"
        } else {
            node.name()
        });
        if self.options.show_ids {
            output.push_str(&format!(" [{id}]"));
        }
        if self.options.show_kinds {
            output.push_str(&format!(" ({})", node.type_tag()));
        }
        if self.options.show_clone_info {
            let info = node.clone_info();
            if let (Some(cloner), mode) = (info.cloner(), info.mode()) {
                output.push_str(&format!(" <{} of {cloner}>", mode_label(mode)));
            }
        }
        output.push('\n');

        if self.options.show_properties {
            let prefix = self.build_property_prefix(depth);
            let props = node.custom_properties();
            for property in props.definitions() {
                output.push_str(&format!("{prefix}  .{} = {}\n", property.name, property.value));
            }
            for (key, name) in props.assignments() {
                output.push_str(&format!("{prefix}  {key} <- {name}\n"));
            }
        }

        let children = node.children();
        let child_count = children.len();
        for (i, &child) in children.iter().enumerate() {
            self.format_subtree_into(graph, child, depth + 1, i + 1 == child_count, output)?;
        }
        Ok(())
    }

    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, tee, corner) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.options.indent_size));
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix.push(' ');
        prefix
    }

    fn build_property_prefix(&self, depth: usize) -> String {
        let branch = match self.options.style {
            TreeStyle::Ascii => "|",
            TreeStyle::Unicode => "\u{2502}",
            TreeStyle::Compact => "",
        };
        let mut prefix = String::new();
        for _ in 0..depth {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.options.indent_size));
        }
        prefix
    }
}

fn mode_label(mode: CloneMode) -> &'static str {
    match mode {
        CloneMode::Original => "original",
        CloneMode::Variant => "variant",
        CloneMode::Duplicate => "duplicate",
        CloneMode::Reference => "reference",
        CloneMode::ReferenceRoot => "reference root",
    }
}

/// Display adapter pairing a [`SceneTreeDebug`] with a graph.
pub struct DisplayTree<'a> {
    debug: &'a SceneTreeDebug,
    graph: &'a SceneGraph,
}

impl SceneTreeDebug {
    /// Borrow a `Display` view of the whole graph.
    pub fn display<'a>(&'a self, graph: &'a SceneGraph) -> DisplayTree<'a> {
        DisplayTree { debug: self, graph }
    }
}

impl fmt::Display for DisplayTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.debug.format_all(self.graph) {
            Ok(output) => write!(f, "{}", output),
            Err(e) => write!(f, "Error formatting scene tree: {}", e),
        }
    }
}

/// A guard that emits a tracing span when dropped.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, span_names::PERF, operation = name);
        Self {
            span: span.entered(),
        }
    }
}
