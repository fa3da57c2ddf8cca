//! Graph analytics and layout engine for the knowledge-base Graph View.
//!
//! This crate turns a flat file/folder/tag collection into a node-link graph,
//! filters it, computes structural metrics, places nodes and answers path
//! queries. Rendering is left to the caller.
//!
//! # Architecture
//!
//! ```text
//! FileItem[] ──► GraphBuilder ──► GraphData ──► filter ──┬── LayoutEngine ──► positions
//!                                                        ├── analyze ───────► metrics, communities
//!                                                        └── find_path ─────► PathResult
//!                                                                  │
//!                                 GraphEngine merges annotations ◄─┘
//! ```
//!
//! # Key Concepts
//!
//! - **GraphBuilder**: derives nodes and links from file items
//! - **GraphFilters**: pure predicate producing the visible subgraph
//! - **LayoutEngine**: five placement strategies plus the pin cache
//! - **AnalysisWorker**: cancellable background offload, last request wins
//!
//! # Example
//!
//! ```ignore
//! use graph_view_engine::{EngineConfig, GraphBuilder, GraphEngine, GraphFilters};
//!
//! let graph = GraphBuilder::new().build(&items);
//! let mut engine = GraphEngine::new(EngineConfig::default());
//! engine.set_graph(graph);
//! let view = engine.compute(&GraphFilters::default());
//! ```

pub mod analytics;
mod config;
mod engine;
mod error;
pub mod export;
mod filter;
mod index;
mod ingest;
pub mod layout;
mod model;
mod path;
mod worker;

pub use analytics::{analyze, analyze_with, NetworkAnalysis};
pub use config::{
    AnalyticsConfig, EngineConfig, LayoutSettings, LayoutType, PathConfig, WorkerConfig,
};
pub use engine::{GraphEngine, GraphView};
pub use error::GraphError;
pub use filter::{filter, GraphFilters};
pub use ingest::{tag_node_id, FileItem, FileItemType, GraphBuilder};
pub use layout::{ForceSimulation, LayoutEngine, PhysicsProvider};
pub use model::{
    AccessLevel, CentralityMetrics, Community, Connection, GraphData, Link, LinkType, Node,
    NodeMetadata, NodeType, PathResult, Position,
};
pub use path::{find_path, find_path_with_epsilon, PathMode};
pub use worker::{AnalysisRequest, AnalysisResult, AnalysisWorker, WorkerStats};

/// Lower bound applied to link strength before inverting it into a path weight.
pub const STRENGTH_EPSILON: f64 = 1e-3;

/// Default viewport width used when no layout settings are supplied.
pub const DEFAULT_VIEWPORT_WIDTH: f64 = 1200.0;

/// Default viewport height used when no layout settings are supplied.
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 800.0;
