//! Shortest path queries over the undirected view of the graph.

use crate::index::GraphIndex;
use crate::model::{Link, Node, PathResult};
use crate::STRENGTH_EPSILON;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

/// How edges are costed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathMode {
    /// Dijkstra with `weight = 1 / max(strength, ε)`.
    #[default]
    Weighted,
    /// BFS, every edge costs 1 (fewest hops).
    Unweighted,
}

/// Find the best path between two nodes.
///
/// Missing endpoints or disconnected nodes give an unfound result; this
/// never panics.
pub fn find_path(
    nodes: &[Node],
    links: &[Link],
    source: &str,
    target: &str,
    mode: PathMode,
) -> PathResult {
    find_path_with_epsilon(nodes, links, source, target, mode, STRENGTH_EPSILON)
}

/// [`find_path`] with an explicit strength floor.
pub fn find_path_with_epsilon(
    nodes: &[Node],
    links: &[Link],
    source: &str,
    target: &str,
    mode: PathMode,
    epsilon: f64,
) -> PathResult {
    let index = GraphIndex::new(nodes, links);
    let (Some(s), Some(t)) = (index.index_of(source), index.index_of(target)) else {
        tracing::debug!(source, target, "path endpoint not in graph");
        return PathResult::not_found();
    };
    if s == t {
        return PathResult::single(index.id(s));
    }

    // search from the lower index so a -> b and b -> a settle on the same path
    let (from, to) = (s.min(t), s.max(t));
    let result = match mode {
        PathMode::Weighted => dijkstra(&index, from, to, epsilon),
        PathMode::Unweighted => bfs(&index, from, to),
    };
    match result {
        Some((mut hops, distance)) => {
            if from != s {
                hops.reverse();
            }
            let path = hops.into_iter().map(|i| index.id(i).to_string()).collect();
            PathResult::from_path(path, distance)
        }
        None => PathResult::not_found(),
    }
}

pub(crate) fn edge_weight(strength: f64, epsilon: f64) -> f64 {
    1.0 / strength.max(epsilon)
}

/// Min-heap entry ordered by distance, then node index.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    distance: f64,
    node: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.node.cmp(&self.node))
    }
}

fn dijkstra(index: &GraphIndex<'_>, s: usize, t: usize, epsilon: f64) -> Option<(Vec<usize>, f64)> {
    let n = index.len();
    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];
    let mut settled = vec![false; n];
    let mut heap = BinaryHeap::new();

    dist[s] = 0.0;
    heap.push(Frontier {
        distance: 0.0,
        node: s,
    });

    while let Some(Frontier { distance, node }) = heap.pop() {
        if settled[node] {
            continue;
        }
        settled[node] = true;
        if node == t {
            break;
        }
        for &(next, strength) in index.neighbors_with_strength(node) {
            if settled[next] {
                continue;
            }
            let candidate = distance + edge_weight(strength, epsilon);
            if candidate < dist[next] {
                dist[next] = candidate;
                prev[next] = Some(node);
                heap.push(Frontier {
                    distance: candidate,
                    node: next,
                });
            }
        }
    }

    if !settled[t] {
        return None;
    }
    let path = walk_back(&prev, s, t);
    let distance = canonical_distance(index, &path, epsilon);
    Some((path, distance))
}

fn bfs(index: &GraphIndex<'_>, s: usize, t: usize) -> Option<(Vec<usize>, f64)> {
    let mut prev: Vec<Option<usize>> = vec![None; index.len()];
    let mut seen = vec![false; index.len()];
    let mut queue = VecDeque::new();
    seen[s] = true;
    queue.push_back(s);

    while let Some(node) = queue.pop_front() {
        if node == t {
            let path = walk_back(&prev, s, t);
            let hops = (path.len() - 1) as f64;
            return Some((path, hops));
        }
        for next in index.neighbors(node) {
            if !seen[next] {
                seen[next] = true;
                prev[next] = Some(node);
                queue.push_back(next);
            }
        }
    }
    None
}

fn walk_back(prev: &[Option<usize>], s: usize, t: usize) -> Vec<usize> {
    let mut path = vec![t];
    let mut current = t;
    while current != s {
        match prev[current] {
            Some(p) => {
                path.push(p);
                current = p;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

/// Sum edge weights smallest first so `a -> b` and `b -> a` add up identically.
fn canonical_distance(index: &GraphIndex<'_>, path: &[usize], epsilon: f64) -> f64 {
    let mut weights: Vec<f64> = path
        .windows(2)
        .filter_map(|pair| {
            index
                .neighbors_with_strength(pair[0])
                .iter()
                .find(|&&(j, _)| j == pair[1])
                .map(|&(_, strength)| edge_weight(strength, epsilon))
        })
        .collect();
    weights.sort_by(|a, b| a.total_cmp(b));
    weights.iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LinkType, NodeType};

    fn graph() -> (Vec<Node>, Vec<Link>) {
        let nodes = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|id| Node::new(*id, *id, NodeType::File))
            .collect();
        // a-b-c is two strong hops, a-c direct is one weak hop
        let links = vec![
            Link::new("a", "b", LinkType::Link).with_strength(1.0),
            Link::new("b", "c", LinkType::Link).with_strength(1.0),
            Link::new("a", "c", LinkType::Link).with_strength(0.1),
            Link::new("c", "d", LinkType::Backlink).with_strength(0.5),
        ];
        (nodes, links)
    }

    #[test]
    fn same_node_is_trivial() {
        let (nodes, links) = graph();
        let result = find_path(&nodes, &links, "a", "a", PathMode::Weighted);
        assert!(result.found);
        assert_eq!(result.path, vec!["a".to_string()]);
        assert_eq!(result.distance, 0.0);
    }

    #[test]
    fn weighted_prefers_strong_links() {
        let (nodes, links) = graph();
        let result = find_path(&nodes, &links, "a", "c", PathMode::Weighted);
        assert!(result.found);
        assert_eq!(result.path, vec!["a", "b", "c"]);
        assert_eq!(result.distance, 2.0);
        assert_eq!(result.intermediate_nodes, vec!["b".to_string()]);
    }

    #[test]
    fn unweighted_prefers_fewest_hops() {
        let (nodes, links) = graph();
        let result = find_path(&nodes, &links, "a", "c", PathMode::Unweighted);
        assert_eq!(result.path, vec!["a", "c"]);
        assert_eq!(result.distance, 1.0);
        assert!(result.intermediate_nodes.is_empty());
    }

    #[test]
    fn distance_sums_weights() {
        let (nodes, links) = graph();
        let result = find_path(&nodes, &links, "a", "d", PathMode::Weighted);
        assert_eq!(result.path, vec!["a", "b", "c", "d"]);
        assert!((result.distance - 4.0).abs() < 1e-12);
    }

    #[test]
    fn disconnected_or_missing_is_not_found() {
        let (nodes, links) = graph();
        let result = find_path(&nodes, &links, "a", "e", PathMode::Weighted);
        assert!(!result.found);
        assert!(result.path.is_empty());
        assert!(result.distance.is_infinite());

        let result = find_path(&nodes, &links, "a", "nope", PathMode::Unweighted);
        assert!(!result.found);
        let result = find_path(&nodes, &links, "nope", "nope", PathMode::Weighted);
        assert!(!result.found);
    }

    #[test]
    fn zero_strength_uses_epsilon() {
        let nodes = vec![
            Node::new("a", "a", NodeType::File),
            Node::new("b", "b", NodeType::File),
        ];
        let links = vec![Link::new("a", "b", LinkType::Tag).with_strength(0.0)];
        let result = find_path(&nodes, &links, "a", "b", PathMode::Weighted);
        assert!(result.found);
        assert_eq!(result.distance, 1.0 / STRENGTH_EPSILON);
    }

    #[test]
    fn symmetric_distance() {
        let (nodes, links) = graph();
        for (a, b) in [("a", "d"), ("b", "d"), ("a", "c")] {
            let forward = find_path(&nodes, &links, a, b, PathMode::Weighted);
            let backward = find_path(&nodes, &links, b, a, PathMode::Weighted);
            assert_eq!(forward.distance, backward.distance);
        }
    }

    #[test]
    fn equal_cost_routes_resolve_the_same_both_ways() {
        let nodes: Vec<Node> = ["a", "b", "c", "d"]
            .iter()
            .map(|id| Node::new(*id, *id, NodeType::File))
            .collect();
        // a-b-d costs 2 + 4, a-c-d costs 4 + 2
        let links = vec![
            Link::new("a", "b", LinkType::Link).with_strength(0.5),
            Link::new("b", "d", LinkType::Link).with_strength(0.25),
            Link::new("a", "c", LinkType::Link).with_strength(0.25),
            Link::new("c", "d", LinkType::Link).with_strength(0.5),
        ];
        for mode in [PathMode::Weighted, PathMode::Unweighted] {
            let forward = find_path(&nodes, &links, "a", "d", mode);
            let backward = find_path(&nodes, &links, "d", "a", mode);
            let mut reversed = backward.path.clone();
            reversed.reverse();
            assert_eq!(forward.path, reversed);
            assert_eq!(forward.distance, backward.distance);
            assert_eq!(backward.path.first().map(String::as_str), Some("d"));
        }
        let forward = find_path(&nodes, &links, "a", "d", PathMode::Weighted);
        assert_eq!(forward.path, vec!["a", "b", "d"]);
        assert_eq!(forward.distance, 6.0);
    }
}
