//! Graph configuration.

use serde::{Deserialize, Serialize};

/// Default limit on nested clone/mirroring cascades.
pub const DEFAULT_MAX_CLONE_DEPTH: usize = 64;

/// Configuration for a [`SceneGraph`](crate::SceneGraph).
///
/// ```
/// use horizon_scene_core::GraphConfig;
///
/// let config = GraphConfig::from_toml_str("max_clone_depth = 8").unwrap();
/// assert_eq!(config.max_clone_depth, 8);
/// assert!(config.refresh_views);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Maximum nesting of mirror clones, where a mirrored copy is itself
    /// mirrored into the next clone down a chain. Exceeding it fails the edit
    /// and discards every node the edit created. The depth of a copied
    /// subtree is not limited.
    pub max_clone_depth: usize,
    /// Whether node updates call into views.
    pub refresh_views: bool,
    /// Whether structural edits on a cloner are mirrored into its dependents.
    pub mirror_structure: bool,
    /// Appended to a node's name when it is cloned. Empty keeps names as is.
    pub clone_name_suffix: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_clone_depth: DEFAULT_MAX_CLONE_DEPTH,
            refresh_views: true,
            mirror_structure: true,
            clone_name_suffix: String::new(),
        }
    }
}

impl GraphConfig {
    /// Parse a configuration from TOML. Missing fields take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Serialize the configuration to TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    /// Start a builder.
    pub fn builder() -> GraphConfigBuilder {
        GraphConfigBuilder::default()
    }
}

/// Builder for [`GraphConfig`].
#[derive(Debug, Default)]
pub struct GraphConfigBuilder {
    config: GraphConfig,
}

impl GraphConfigBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the mirror cascade limit.
    pub fn max_clone_depth(mut self, depth: usize) -> Self {
        self.config.max_clone_depth = depth;
        self
    }

    /// Enable or disable view refreshes.
    pub fn refresh_views(mut self, refresh: bool) -> Self {
        self.config.refresh_views = refresh;
        self
    }

    /// Enable or disable structural mirroring.
    pub fn mirror_structure(mut self, mirror: bool) -> Self {
        self.config.mirror_structure = mirror;
        self
    }

    /// Set the suffix appended to cloned node names.
    pub fn clone_name_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.clone_name_suffix = suffix.into();
        self
    }

    /// Finish the configuration.
    pub fn build(self) -> GraphConfig {
        self.config
    }
}
