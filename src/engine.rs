//! Orchestration: filter, then layout and analytics, merged onto nodes.
//!
//! [`GraphEngine`] holds the full (unfiltered) graph, the configuration and
//! the layout engine with its drag pins. Every [`GraphEngine::compute`] call
//! derives a fresh [`GraphView`]; nothing computed is cached between calls.

use crate::analytics::{analyze_with, NetworkAnalysis};
use crate::config::{EngineConfig, LayoutSettings, PathConfig};
use crate::error::GraphError;
use crate::filter::{filter, GraphFilters};
use crate::ingest::{FileItem, GraphBuilder};
use crate::layout::{LayoutEngine, PhysicsProvider};
use crate::model::{GraphData, PathResult};
use crate::path::{find_path_with_epsilon, PathMode};
use crate::worker::AnalysisRequest;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Filtered, positioned and annotated graph ready for rendering.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphView {
    pub graph: GraphData,
    pub analysis: NetworkAnalysis,
    /// Path tuning the view was computed with.
    #[serde(default)]
    pub path: PathConfig,
}

impl GraphView {
    /// Path query restricted to the visible subgraph.
    pub fn find_path(&self, source: &str, target: &str, mode: PathMode) -> PathResult {
        find_path_with_epsilon(
            &self.graph.nodes,
            &self.graph.links,
            source,
            target,
            mode,
            self.path.strength_epsilon,
        )
    }
}

/// Stateful front end used by the rendering layer.
#[derive(Debug)]
pub struct GraphEngine {
    config: EngineConfig,
    graph: Arc<GraphData>,
    layout: LayoutEngine,
}

impl Default for GraphEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl GraphEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            graph: Arc::new(GraphData::default()),
            layout: LayoutEngine::new(),
        }
    }

    /// Engine with a custom physics provider for force layout.
    pub fn with_physics(config: EngineConfig, physics: Box<dyn PhysicsProvider>) -> Self {
        Self {
            config,
            graph: Arc::new(GraphData::default()),
            layout: LayoutEngine::with_physics(physics),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> &GraphData {
        &self.graph
    }

    /// Switch layout settings; pins survive.
    pub fn set_layout(&mut self, settings: LayoutSettings) -> Result<(), GraphError> {
        let candidate = EngineConfig {
            layout: settings,
            ..self.config.clone()
        };
        candidate.validate()?;
        self.config = candidate;
        Ok(())
    }

    /// Replace the graph (full regeneration). Clears every pin.
    pub fn set_graph(&mut self, mut graph: GraphData) {
        graph.drop_dangling_links();
        graph.clear_computed();
        graph.derive_connections();
        tracing::info!(
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            "graph regenerated"
        );
        self.graph = Arc::new(graph);
        self.layout.clear_pins();
    }

    /// Rebuild the graph from file items.
    pub fn load_items(&mut self, items: &[FileItem]) {
        self.set_graph(GraphBuilder::new().build(items));
    }

    /// Filter, lay out and analyze the current graph.
    pub fn compute(&self, filters: &GraphFilters) -> GraphView {
        build_view(&self.graph, filters, &self.config, &self.layout)
    }

    /// Path query over the full graph.
    pub fn find_path(&self, source: &str, target: &str, mode: PathMode) -> PathResult {
        find_path_with_epsilon(
            &self.graph.nodes,
            &self.graph.links,
            source,
            target,
            mode,
            self.config.path.strength_epsilon,
        )
    }

    /// Fix a node where the user dropped it.
    pub fn pin_node(&mut self, id: &str, x: f64, y: f64) -> Result<(), GraphError> {
        if self.graph.node(id).is_none() {
            return Err(GraphError::NodeNotFound(id.to_string()));
        }
        self.layout.pin_node(id, x, y);
        Ok(())
    }

    /// Release a drag pin. Returns whether the node was pinned.
    pub fn unpin_node(&mut self, id: &str) -> Result<bool, GraphError> {
        if self.graph.node(id).is_none() {
            return Err(GraphError::NodeNotFound(id.to_string()));
        }
        Ok(self.layout.unpin_node(id))
    }

    pub fn layout_engine(&self) -> &LayoutEngine {
        &self.layout
    }

    /// Snapshot of the current state for the background worker.
    pub fn request(&self, filters: &GraphFilters) -> AnalysisRequest {
        AnalysisRequest {
            graph: Arc::clone(&self.graph),
            filters: filters.clone(),
            layout: self.config.layout.clone(),
            pins: self.layout.pins().clone(),
        }
    }
}

/// One full pipeline run. Shared by the engine and the worker thread.
pub(crate) fn build_view(
    graph: &GraphData,
    filters: &GraphFilters,
    config: &EngineConfig,
    layout: &LayoutEngine,
) -> GraphView {
    let (mut nodes, links) = filter(&graph.nodes, &graph.links, filters);
    for node in &mut nodes {
        node.clear_computed();
    }

    let mut nodes = layout.layout(&nodes, &links, &config.layout);
    let analysis = analyze_with(&nodes, &links, &config.analytics);

    let community: HashMap<&str, usize> = analysis
        .communities
        .iter()
        .flat_map(|c| c.members.iter().map(move |m| (m.as_str(), c.id)))
        .collect();
    for node in &mut nodes {
        if let Some(metrics) = analysis.centrality.get(&node.id) {
            node.centrality = Some(metrics.normalized_degree);
            node.betweenness = Some(metrics.betweenness);
            node.closeness = Some(metrics.closeness);
        }
        node.community = community.get(node.id.as_str()).copied();
    }

    let mut graph = GraphData::new(nodes, links);
    graph.derive_connections();
    GraphView {
        graph,
        analysis,
        path: config.path.clone(),
    }
}
