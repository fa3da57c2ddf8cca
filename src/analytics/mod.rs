//! Network analytics: density, clustering, centrality and communities.
//!
//! Every metric is computed on the undirected view of the graph built by
//! [`GraphIndex`]: parallel links count once and self loops are ignored.
//! All iteration follows the collection order or sorted neighbour lists, so
//! an unchanged graph always yields identical numbers.

mod centrality;
mod clustering;
mod community;

pub use centrality::{betweenness_centrality, closeness_centrality, degree_centrality};
pub use clustering::{average_clustering, local_clustering};
pub use community::{detect_communities, modularity};

use crate::config::AnalyticsConfig;
use crate::index::GraphIndex;
use crate::model::{CentralityMetrics, Community, Link, Node};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of one analytics run, keyed by node id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAnalysis {
    pub node_count: usize,
    pub link_count: usize,
    pub density: f64,
    /// Mean local clustering over nodes with at least two neighbours
    pub clustering: f64,
    /// Local clustering, only for nodes where it is defined
    pub node_clustering: BTreeMap<String, f64>,
    pub centrality: BTreeMap<String, CentralityMetrics>,
    pub communities: Vec<Community>,
    pub modularity: f64,
    pub component_count: usize,
}

impl NetworkAnalysis {
    /// Community id assigned to a node.
    pub fn community_of(&self, id: &str) -> Option<usize> {
        self.communities
            .iter()
            .find(|c| c.members.iter().any(|m| m == id))
            .map(|c| c.id)
    }

    /// Node ids ordered by descending betweenness (ties by id).
    pub fn most_central(&self, limit: usize) -> Vec<&str> {
        let mut ranked: Vec<(&String, &CentralityMetrics)> = self.centrality.iter().collect();
        ranked.sort_by(|a, b| {
            b.1.betweenness
                .total_cmp(&a.1.betweenness)
                .then_with(|| b.1.degree.cmp(&a.1.degree))
                .then_with(|| a.0.cmp(b.0))
        });
        ranked
            .into_iter()
            .take(limit)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

/// Analyze a (filtered) graph with default tuning.
pub fn analyze(nodes: &[Node], links: &[Link]) -> NetworkAnalysis {
    analyze_with(nodes, links, &AnalyticsConfig::default())
}

/// Analyze a (filtered) graph.
pub fn analyze_with(nodes: &[Node], links: &[Link], config: &AnalyticsConfig) -> NetworkAnalysis {
    let index = GraphIndex::new(nodes, links);
    let n = index.len();

    let local = clustering::local_clustering_indexed(&index);
    let degree = centrality::degree_indexed(&index);
    let betweenness = centrality::betweenness_indexed(&index, config.normalize_betweenness);
    let closeness = centrality::closeness_indexed(&index);
    let labels = community::greedy_modularity_indexed(&index, config.max_community_passes);
    let communities = community::build_communities(&index, &labels);
    let modularity = community::modularity_indexed(&index, &labels);

    let normalizer = n.saturating_sub(1).max(1) as f64;
    let centrality = (0..n)
        .map(|i| {
            (
                index.id(i).to_string(),
                CentralityMetrics {
                    degree: degree[i],
                    normalized_degree: if n > 1 {
                        degree[i] as f64 / normalizer
                    } else {
                        0.0
                    },
                    betweenness: betweenness[i],
                    closeness: closeness[i],
                },
            )
        })
        .collect();

    let node_clustering: BTreeMap<String, f64> = local
        .iter()
        .enumerate()
        .filter_map(|(i, c)| c.map(|value| (index.id(i).to_string(), value)))
        .collect();

    let analysis = NetworkAnalysis {
        node_count: n,
        link_count: links.len(),
        density: density_indexed(&index),
        clustering: clustering::mean_defined(&local),
        node_clustering,
        centrality,
        communities,
        modularity,
        component_count: index.components().len(),
    };

    tracing::debug!(
        nodes = analysis.node_count,
        links = analysis.link_count,
        density = analysis.density,
        clustering = analysis.clustering,
        communities = analysis.communities.len(),
        "network analysis complete"
    );
    analysis
}

/// Share of possible undirected node pairs that are linked; 0 below two nodes.
pub fn density(nodes: &[Node], links: &[Link]) -> f64 {
    density_indexed(&GraphIndex::new(nodes, links))
}

fn density_indexed(index: &GraphIndex<'_>) -> f64 {
    let n = index.len();
    if n < 2 {
        return 0.0;
    }
    let possible = (n * (n - 1)) as f64 / 2.0;
    (index.pair_count() as f64 / possible).clamp(0.0, 1.0)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::model::{Link, LinkType, Node, NodeType};

    pub fn graph(ids: &[&str], edges: &[(&str, &str)]) -> (Vec<Node>, Vec<Link>) {
        let nodes = ids
            .iter()
            .map(|id| Node::new(*id, *id, NodeType::File))
            .collect();
        let links = edges
            .iter()
            .map(|(a, b)| Link::new(*a, *b, LinkType::Link))
            .collect();
        (nodes, links)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::graph;
    use super::*;

    #[test]
    fn density_of_small_graphs() {
        let (nodes, links) = graph(&[], &[]);
        assert_eq!(density(&nodes, &links), 0.0);

        let (nodes, links) = graph(&["a"], &[]);
        assert_eq!(density(&nodes, &links), 0.0);

        let (nodes, links) = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        assert_eq!(density(&nodes, &links), 1.0);

        let (nodes, links) = graph(&["a", "b", "c", "d"], &[("a", "b")]);
        assert!((density(&nodes, &links) - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn duplicate_links_do_not_push_density_above_one() {
        let (nodes, links) = graph(&["a", "b"], &[("a", "b"), ("b", "a"), ("a", "b")]);
        assert_eq!(density(&nodes, &links), 1.0);
    }

    #[test]
    fn analysis_is_deterministic() {
        let (nodes, links) = graph(
            &["a", "b", "c", "d", "e", "f"],
            &[
                ("a", "b"),
                ("b", "c"),
                ("c", "a"),
                ("c", "d"),
                ("d", "e"),
                ("e", "f"),
                ("f", "d"),
            ],
        );
        let first = analyze(&nodes, &links);
        let second = analyze(&nodes, &links);
        assert_eq!(first, second);
        assert_eq!(first.node_count, 6);
        assert_eq!(first.component_count, 1);
        assert_eq!(first.most_central(2), vec!["c", "d"]);
    }

    #[test]
    fn empty_graph_analysis() {
        let analysis = analyze(&[], &[]);
        assert_eq!(analysis.density, 0.0);
        assert_eq!(analysis.clustering, 0.0);
        assert!(analysis.communities.is_empty());
        assert_eq!(analysis.modularity, 0.0);
    }

    #[test]
    fn community_lookup() {
        let (nodes, links) = graph(&["a", "b", "c", "d"], &[("a", "b"), ("c", "d")]);
        let analysis = analyze(&nodes, &links);
        assert_eq!(analysis.community_of("a"), analysis.community_of("b"));
        assert_ne!(analysis.community_of("a"), analysis.community_of("c"));
        assert_eq!(analysis.community_of("zzz"), None);
    }
}
