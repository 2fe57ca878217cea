//! Configuration system
//!
//! Scene tuning lives in [`SceneConfig`], loadable from TOML or RON.

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Subdivision limits shared by every octree in the crate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Maximum items per node before subdivision
    pub max_items_per_node: usize,

    /// Maximum subdivision depth
    pub max_depth: u32,

    /// Minimum node half-size (prevents excessive subdivision)
    pub min_node_size: f32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_items_per_node: 8,
            max_depth: 8,
            min_node_size: 0.01,
        }
    }
}

/// Screen-space hit tolerances in pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitTestConfig {
    /// Default thickness for point nodes
    pub point_thickness: f32,
    /// Default thickness for line nodes
    pub line_thickness: f32,
}

impl Default for HitTestConfig {
    fn default() -> Self {
        Self {
            point_thickness: 4.0,
            line_thickness: 1.0,
        }
    }
}

/// Per-frame visibility and ordering options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullingConfig {
    /// Skip nodes whose world box lies outside the view frustum
    pub frustum_culling: bool,
    /// Draw transparent nodes back to front instead of insertion order
    pub sort_transparent: bool,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            frustum_culling: true,
            sort_transparent: true,
        }
    }
}

/// Spatial acceleration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Build primitive octrees for geometry during the frame update
    pub build_geometry_octrees: bool,
    /// Geometry with fewer primitives than this is always brute-forced
    pub octree_min_primitives: usize,
    /// Keep a scene-level octree over node bounds to narrow hit tests
    pub scene_index: bool,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            build_geometry_octrees: true,
            octree_min_primitives: 32,
            scene_index: false,
        }
    }
}

/// Top-level scene configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Octree subdivision limits
    pub octree: OctreeConfig,
    /// Hit-test tolerances
    pub hit_test: HitTestConfig,
    /// Culling and ordering
    pub culling: CullingConfig,
    /// Spatial acceleration
    pub spatial: SpatialConfig,
}

impl Config for SceneConfig {}
