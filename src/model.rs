//! Graph data model: nodes, links and the output-only value objects.
//!
//! Nodes and links are derived from the file collection and regenerated when
//! it changes. Computed fields (`cluster`, `centrality`, `betweenness`,
//! `closeness`, `community`) are annotations produced by the engine and can
//! always be recomputed from the node/link set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// =============================================================================
// ENUMS
// =============================================================================

/// Kind of entity a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    File,
    Folder,
    Database,
    Tag,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::File => "file",
            NodeType::Folder => "folder",
            NodeType::Database => "database",
            NodeType::Tag => "tag",
        }
    }

    pub fn all() -> &'static [NodeType] {
        &[
            NodeType::File,
            NodeType::Folder,
            NodeType::Database,
            NodeType::Tag,
        ]
    }
}

/// Relationship carried by a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Link,
    Backlink,
    Tag,
    Parent,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Link => "link",
            LinkType::Backlink => "backlink",
            LinkType::Tag => "tag",
            LinkType::Parent => "parent",
        }
    }
}

/// Sharing level of the underlying file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    Private,
    Shared,
    Public,
}

// =============================================================================
// NODE
// =============================================================================

/// Layout coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Derived adjacency entry stored on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub to: String,
    #[serde(rename = "type")]
    pub link_type: LinkType,
    pub strength: f64,
}

/// Descriptive metadata copied from the file item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    pub last_modified: DateTime<Utc>,
    pub word_count: usize,
    pub tags: Vec<String>,
    pub collaborators: Vec<String>,
    pub path: String,
    pub access_level: AccessLevel,
}

/// A graph vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Stable identifier, never changed after creation
    pub id: String,

    pub title: String,

    #[serde(rename = "type")]
    pub node_type: NodeType,

    /// Visual weight derived from content length
    pub size: f64,

    /// Current position (owned by the layout engine)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub position: Option<Position>,

    /// Pinned x coordinate (exempt from physics)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fx: Option<f64>,

    /// Pinned y coordinate (exempt from physics)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fy: Option<f64>,

    #[serde(default)]
    pub connections: Vec<Connection>,

    #[serde(default)]
    pub metadata: NodeMetadata,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cluster: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub centrality: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub betweenness: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub closeness: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub community: Option<usize>,
}

impl Node {
    /// Create a node with default metadata and no position.
    pub fn new(id: impl Into<String>, title: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            node_type,
            size: 8.0,
            position: None,
            fx: None,
            fy: None,
            connections: Vec::new(),
            metadata: NodeMetadata::default(),
            cluster: None,
            centrality: None,
            betweenness: None,
            closeness: None,
            community: None,
        }
    }

    /// Builder: set size
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    /// Builder: set metadata
    pub fn with_metadata(mut self, metadata: NodeMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Builder: set last-modified timestamp
    pub fn with_last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.metadata.last_modified = at;
        self
    }

    /// Builder: set tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set position
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    /// Is this node fixed in place?
    pub fn is_pinned(&self) -> bool {
        self.fx.is_some() && self.fy.is_some()
    }

    /// Move the node and fix it there.
    pub fn pin(&mut self, x: f64, y: f64) {
        self.position = Some(Position::new(x, y));
        self.fx = Some(x);
        self.fy = Some(y);
    }

    /// Release the pin, keeping the current position.
    pub fn unpin(&mut self) {
        self.fx = None;
        self.fy = None;
    }

    /// Set position without pinning.
    pub fn place(&mut self, x: f64, y: f64) {
        self.position = Some(Position::new(x, y));
    }

    /// Drop every engine-computed annotation.
    pub fn clear_computed(&mut self) {
        self.cluster = None;
        self.centrality = None;
        self.betweenness = None;
        self.closeness = None;
        self.community = None;
    }

    /// Case-insensitive match of `needle_lower` against the title or any tag.
    pub(crate) fn matches_search(&self, needle_lower: &str) -> bool {
        self.title.to_lowercase().contains(needle_lower)
            || self
                .metadata
                .tags
                .iter()
                .any(|t| t.to_lowercase().contains(needle_lower))
    }
}

// =============================================================================
// LINK
// =============================================================================

/// A graph edge between two node ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub link_type: LinkType,
    /// Always within [0, 1]
    pub strength: f64,
    #[serde(default)]
    pub bidirectional: bool,
}

impl Link {
    /// Create a one-way link with full strength.
    pub fn new(source: impl Into<String>, target: impl Into<String>, link_type: LinkType) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            link_type,
            strength: 1.0,
            bidirectional: false,
        }
    }

    /// Builder: set strength (clamped to [0, 1], NaN becomes 0)
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = if strength.is_nan() {
            0.0
        } else {
            strength.clamp(0.0, 1.0)
        };
        self
    }

    /// Builder: mark bidirectional
    pub fn bidirectional(mut self) -> Self {
        self.bidirectional = true;
        self
    }

    /// Does this link touch the given node?
    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }

    /// Endpoint opposite `id`, if `id` is an endpoint.
    pub fn other_end(&self, id: &str) -> Option<&str> {
        if self.source == id {
            Some(&self.target)
        } else if self.target == id {
            Some(&self.source)
        } else {
            None
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

// =============================================================================
// GRAPH DATA
// =============================================================================

/// Node and link collections handed between pipeline stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl GraphData {
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        Self { nodes, links }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    /// Remove links whose endpoints are not both present.
    pub fn drop_dangling_links(&mut self) {
        let links = std::mem::take(&mut self.links);
        let ids = self.node_ids();
        let kept = links
            .into_iter()
            .filter(|l| ids.contains(l.source.as_str()) && ids.contains(l.target.as_str()))
            .collect();
        self.links = kept;
    }

    /// Rebuild every node's `connections` from the link set.
    ///
    /// The source side always records the link; the target side records it
    /// only when the link is bidirectional.
    pub fn derive_connections(&mut self) {
        for node in &mut self.nodes {
            node.connections.clear();
        }
        let index: std::collections::HashMap<String, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();

        for link in &self.links {
            if let Some(&src) = index.get(&link.source) {
                self.nodes[src].connections.push(Connection {
                    to: link.target.clone(),
                    link_type: link.link_type,
                    strength: link.strength,
                });
            }
            if link.bidirectional {
                if let Some(&tgt) = index.get(&link.target) {
                    self.nodes[tgt].connections.push(Connection {
                        to: link.source.clone(),
                        link_type: link.link_type,
                        strength: link.strength,
                    });
                }
            }
        }
    }

    /// Clear all engine annotations on every node.
    pub fn clear_computed(&mut self) {
        for node in &mut self.nodes {
            node.clear_computed();
        }
    }
}

// =============================================================================
// OUTPUT VALUE OBJECTS
// =============================================================================

/// A detected group of densely connected nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    pub id: usize,
    /// Member ids in collection order
    pub members: Vec<String>,
    /// Share of possible member pairs that are linked
    pub internal_density: f64,
}

impl Community {
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// Importance metrics for a single node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CentralityMetrics {
    /// Raw in + out link count
    pub degree: usize,
    /// Degree divided by `n - 1`
    pub normalized_degree: f64,
    pub betweenness: f64,
    pub closeness: f64,
}

/// Answer to a path query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathResult {
    pub found: bool,
    pub path: Vec<String>,
    /// Sum of traversed edge weights, infinite when not found
    pub distance: f64,
    /// Path without its endpoints
    pub intermediate_nodes: Vec<String>,
}

impl PathResult {
    pub fn not_found() -> Self {
        Self {
            found: false,
            path: Vec::new(),
            distance: f64::INFINITY,
            intermediate_nodes: Vec::new(),
        }
    }

    pub fn single(id: &str) -> Self {
        Self {
            found: true,
            path: vec![id.to_string()],
            distance: 0.0,
            intermediate_nodes: Vec::new(),
        }
    }

    pub(crate) fn from_path(path: Vec<String>, distance: f64) -> Self {
        let intermediate_nodes = if path.len() > 2 {
            path[1..path.len() - 1].to_vec()
        } else {
            Vec::new()
        };
        Self {
            found: true,
            path,
            distance,
            intermediate_nodes,
        }
    }

    /// Number of edges traversed.
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_strength_is_clamped() {
        assert_eq!(Link::new("a", "b", LinkType::Link).with_strength(3.0).strength, 1.0);
        assert_eq!(Link::new("a", "b", LinkType::Link).with_strength(-1.0).strength, 0.0);
        assert_eq!(Link::new("a", "b", LinkType::Link).with_strength(f64::NAN).strength, 0.0);
    }

    #[test]
    fn drop_dangling_links_keeps_valid() {
        let mut graph = GraphData::new(
            vec![
                Node::new("a", "A", NodeType::File),
                Node::new("b", "B", NodeType::File),
            ],
            vec![
                Link::new("a", "b", LinkType::Link),
                Link::new("a", "ghost", LinkType::Link),
            ],
        );
        graph.drop_dangling_links();
        assert_eq!(graph.links.len(), 1);
        assert_eq!(graph.links[0].target, "b");
    }

    #[test]
    fn derive_connections_respects_direction() {
        let mut graph = GraphData::new(
            vec![
                Node::new("a", "A", NodeType::File),
                Node::new("b", "B", NodeType::File),
                Node::new("c", "C", NodeType::File),
            ],
            vec![
                Link::new("a", "b", LinkType::Link).with_strength(0.5),
                Link::new("b", "c", LinkType::Link).bidirectional(),
            ],
        );
        graph.derive_connections();

        let a = graph.node("a").unwrap();
        assert_eq!(a.connections.len(), 1);
        assert_eq!(a.connections[0].to, "b");
        assert_eq!(a.connections[0].strength, 0.5);

        let c = graph.node("c").unwrap();
        assert_eq!(c.connections.len(), 1);
        assert_eq!(c.connections[0].to, "b");
    }

    #[test]
    fn pin_and_unpin() {
        let mut node = Node::new("a", "A", NodeType::File);
        assert!(!node.is_pinned());
        node.pin(10.0, 20.0);
        assert!(node.is_pinned());
        assert_eq!(node.position, Some(Position::new(10.0, 20.0)));
        node.unpin();
        assert!(!node.is_pinned());
        assert_eq!(node.position, Some(Position::new(10.0, 20.0)));
    }

    #[test]
    fn path_result_intermediates() {
        let result = PathResult::from_path(vec!["a".into(), "b".into(), "c".into()], 2.0);
        assert_eq!(result.intermediate_nodes, vec!["b".to_string()]);
        assert_eq!(result.hops(), 2);
        assert!(PathResult::not_found().distance.is_infinite());
    }

    #[test]
    fn node_serializes_with_renderer_field_names() {
        let node = Node::new("a", "Alpha", NodeType::Folder).with_position(1.0, 2.0);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "folder");
        assert_eq!(json["position"]["x"], 1.0);
        assert!(json["metadata"].get("lastModified").is_some());
        assert!(json.get("cluster").is_none());
    }
}
