//! Filter pipeline: derives the visible subgraph.
//!
//! Stages run in a fixed order. Every stage that removes nodes also drops
//! the links that referenced them, and connection counts are always taken
//! from the link set that survived the earlier stages, never from the raw
//! input.

use crate::model::{GraphData, Link, Node, NodeType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// User-facing filter state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphFilters {
    /// Case-insensitive substring matched against title or tags; empty = all.
    pub search: String,
    /// Allowed node types; `None` = all, `Some(vec![])` = none.
    pub node_types: Option<Vec<NodeType>>,
    /// Minimum link count a node needs to stay visible.
    pub min_connections: usize,
    /// Keep nodes with no links.
    pub show_orphans: bool,
    /// Tag allow-list; empty = no restriction.
    pub tags: Vec<String>,
    /// Inclusive lower bound on last-modified.
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on last-modified.
    pub date_to: Option<DateTime<Utc>>,
}

impl Default for GraphFilters {
    fn default() -> Self {
        Self {
            search: String::new(),
            node_types: None,
            min_connections: 0,
            show_orphans: true,
            tags: Vec::new(),
            date_from: None,
            date_to: None,
        }
    }
}

impl GraphFilters {
    /// Builder: set search query
    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search = query.into();
        self
    }

    /// Builder: restrict node types
    pub fn with_node_types(mut self, types: impl IntoIterator<Item = NodeType>) -> Self {
        self.node_types = Some(types.into_iter().collect());
        self
    }

    /// Builder: set minimum connections
    pub fn with_min_connections(mut self, min: usize) -> Self {
        self.min_connections = min;
        self
    }

    /// Builder: show or hide orphans
    pub fn with_orphans(mut self, show: bool) -> Self {
        self.show_orphans = show;
        self
    }

    /// Builder: restrict to tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set inclusive date range
    pub fn with_date_range(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    /// Run the pipeline over a graph.
    pub fn apply(&self, graph: &GraphData) -> GraphData {
        let (nodes, links) = filter(&graph.nodes, &graph.links, self);
        GraphData { nodes, links }
    }
}

/// Derive the visible subgraph. Output links always reference output nodes.
pub fn filter(nodes: &[Node], links: &[Link], filters: &GraphFilters) -> (Vec<Node>, Vec<Link>) {
    let mut nodes: Vec<Node> = nodes.to_vec();
    let mut links: Vec<Link> = links.to_vec();
    retain_links_between(&nodes, &mut links);

    let query = filters.search.trim().to_lowercase();
    if !query.is_empty() {
        nodes.retain(|n| n.matches_search(&query));
        retain_links_between(&nodes, &mut links);
    }

    if let Some(types) = &filters.node_types {
        nodes.retain(|n| types.contains(&n.node_type));
        retain_links_between(&nodes, &mut links);
    }

    if !filters.tags.is_empty() {
        let allowed: HashSet<String> = filters.tags.iter().map(|t| t.to_lowercase()).collect();
        nodes.retain(|n| {
            n.metadata
                .tags
                .iter()
                .any(|t| allowed.contains(&t.to_lowercase()))
        });
        retain_links_between(&nodes, &mut links);
    }

    if filters.date_from.is_some() || filters.date_to.is_some() {
        nodes.retain(|n| {
            let at = n.metadata.last_modified;
            filters.date_from.map_or(true, |from| at >= from)
                && filters.date_to.map_or(true, |to| at <= to)
        });
        retain_links_between(&nodes, &mut links);
    }

    if filters.min_connections > 0 {
        let degree = degrees(&links);
        nodes.retain(|n| degree.get(n.id.as_str()).copied().unwrap_or(0) >= filters.min_connections);
        retain_links_between(&nodes, &mut links);
    }

    if !filters.show_orphans {
        let degree = degrees(&links);
        nodes.retain(|n| degree.contains_key(n.id.as_str()));
        retain_links_between(&nodes, &mut links);
    }

    tracing::debug!(
        nodes = nodes.len(),
        links = links.len(),
        "filter pipeline complete"
    );
    (nodes, links)
}

fn retain_links_between(nodes: &[Node], links: &mut Vec<Link>) {
    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    links.retain(|l| ids.contains(l.source.as_str()) && ids.contains(l.target.as_str()));
}

fn degrees(links: &[Link]) -> HashMap<&str, usize> {
    let mut degree: HashMap<&str, usize> = HashMap::new();
    for link in links {
        *degree.entry(link.source.as_str()).or_insert(0) += 1;
        *degree.entry(link.target.as_str()).or_insert(0) += 1;
    }
    degree
}
