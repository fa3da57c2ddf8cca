//! Engine configuration.

use crate::error::GraphError;
use crate::{DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH, STRENGTH_EPSILON};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Top-level configuration for [`crate::GraphEngine`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Layout settings.
    pub layout: LayoutSettings,
    /// Analytics tuning.
    pub analytics: AnalyticsConfig,
    /// Path finder tuning.
    pub path: PathConfig,
    /// Background worker tuning.
    pub worker: WorkerConfig,
}

impl EngineConfig {
    /// Config for small graphs: static circular layout, no physics.
    pub fn minimal() -> Self {
        Self {
            layout: LayoutSettings {
                layout_type: LayoutType::Circular,
                physics: false,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Config for graphs with thousands of nodes.
    pub fn large_graph() -> Self {
        Self {
            layout: LayoutSettings {
                width: 4000.0,
                height: 3000.0,
                force_iterations: 60,
                ..Default::default()
            },
            analytics: AnalyticsConfig {
                max_community_passes: 50,
                ..Default::default()
            },
            worker: WorkerConfig {
                result_buffer: 4,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Parse YAML config text.
    pub fn from_yaml_str(text: &str) -> Result<Self, GraphError> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|e| GraphError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse JSON config text.
    pub fn from_json_str(text: &str) -> Result<Self, GraphError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| GraphError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a `.yaml`/`.yml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }

    /// Reject values the algorithms cannot work with.
    pub fn validate(&self) -> Result<(), GraphError> {
        let layout = &self.layout;
        if !(layout.width > 0.0 && layout.height > 0.0) {
            return Err(GraphError::InvalidConfig(format!(
                "viewport must be positive, got {}x{}",
                layout.width, layout.height
            )));
        }
        if layout.link_distance < 0.0 || layout.collision_radius < 0.0 {
            return Err(GraphError::InvalidConfig(
                "link distance and collision radius must not be negative".into(),
            ));
        }
        if !(self.path.strength_epsilon > 0.0 && self.path.strength_epsilon <= 1.0) {
            return Err(GraphError::InvalidConfig(format!(
                "strength epsilon must be in (0, 1], got {}",
                self.path.strength_epsilon
            )));
        }
        if self.worker.result_buffer == 0 {
            return Err(GraphError::InvalidConfig(
                "worker result buffer must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// LAYOUT
// =============================================================================

/// Layout algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutType {
    /// Physics-driven placement.
    #[default]
    Force,
    /// Levels from parent links.
    Hierarchical,
    /// Nodes on a ring.
    Circular,
    /// Ordered by last-modified time.
    Timeline,
    /// Connected components on a grid.
    Cluster,
}

impl LayoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutType::Force => "force",
            LayoutType::Hierarchical => "hierarchical",
            LayoutType::Circular => "circular",
            LayoutType::Timeline => "timeline",
            LayoutType::Cluster => "cluster",
        }
    }

    /// Whether positions produced by this layout are pinned.
    pub fn is_static(&self) -> bool {
        !matches!(self, LayoutType::Force)
    }

    /// Parse a layout name, falling back to [`LayoutType::Force`] on unknown input.
    pub fn parse_or_force(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!(layout = name, "unknown layout type, falling back to force");
            LayoutType::Force
        })
    }
}

impl fmt::Display for LayoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "force" => Ok(LayoutType::Force),
            "hierarchical" => Ok(LayoutType::Hierarchical),
            "circular" => Ok(LayoutType::Circular),
            "timeline" => Ok(LayoutType::Timeline),
            "cluster" => Ok(LayoutType::Cluster),
            other => Err(GraphError::InvalidConfig(format!(
                "unknown layout type: {other}"
            ))),
        }
    }
}

fn layout_type_or_force<'de, D>(deserializer: D) -> Result<LayoutType, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    Ok(LayoutType::parse_or_force(&name))
}

/// Settings consumed only by the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutSettings {
    /// Layout algorithm to use.
    #[serde(rename = "type", deserialize_with = "layout_type_or_force")]
    pub layout_type: LayoutType,
    /// Run the physics provider in force mode.
    pub physics: bool,
    /// Charge strength (repulsion scale).
    pub force_strength: f64,
    /// Rest length of link springs.
    pub link_distance: f64,
    /// Minimum distance kept between node centers.
    pub collision_radius: f64,
    /// Pull towards the viewport center.
    pub centering_strength: f64,
    /// Viewport width.
    pub width: f64,
    /// Viewport height.
    pub height: f64,
    /// Seed for initial placement and timeline jitter.
    pub seed: u64,
    /// Iterations the built-in simulation runs per layout call.
    pub force_iterations: usize,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            layout_type: LayoutType::Force,
            physics: true,
            force_strength: 300.0,
            link_distance: 80.0,
            collision_radius: 20.0,
            centering_strength: 0.05,
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
            seed: 42,
            force_iterations: 120,
        }
    }
}

impl LayoutSettings {
    /// Settings for a given layout type and default everything else.
    pub fn of_type(layout_type: LayoutType) -> Self {
        Self {
            layout_type,
            ..Default::default()
        }
    }

    /// Builder: set viewport size
    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }
}

// =============================================================================
// ANALYTICS / PATH / WORKER
// =============================================================================

/// Analytics tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Upper bound on community local-moving passes.
    pub max_community_passes: usize,
    /// Normalise betweenness by the number of node pairs.
    pub normalize_betweenness: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            max_community_passes: 100,
            normalize_betweenness: true,
        }
    }
}

/// Path finder tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Lower bound on strength before inverting to a weight.
    pub strength_epsilon: f64,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            strength_epsilon: STRENGTH_EPSILON,
        }
    }
}

/// Background worker tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Finished results buffered for `recv_timeout`; extra results are dropped.
    pub result_buffer: usize,
    /// Thread name for the worker.
    pub thread_name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            result_buffer: 16,
            thread_name: "graph-analysis".to_string(),
        }
    }
}
