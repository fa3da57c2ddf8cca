//! Degree, betweenness and closeness centrality.
//!
//! Betweenness uses Brandes' algorithm on the unweighted undirected graph;
//! closeness runs a BFS from every node and applies the Wasserman-Faust
//! correction so nodes in small components are not over-ranked.

use crate::index::GraphIndex;
use crate::model::{Link, Node};
use std::collections::{BTreeMap, VecDeque};

/// Raw in + out link count per node id.
pub fn degree_centrality(nodes: &[Node], links: &[Link]) -> BTreeMap<String, usize> {
    let index = GraphIndex::new(nodes, links);
    degree_indexed(&index)
        .into_iter()
        .enumerate()
        .map(|(i, d)| (index.id(i).to_string(), d))
        .collect()
}

/// Normalised betweenness per node id.
pub fn betweenness_centrality(nodes: &[Node], links: &[Link]) -> BTreeMap<String, f64> {
    let index = GraphIndex::new(nodes, links);
    keyed(&index, betweenness_indexed(&index, true))
}

/// Closeness per node id, 0 for isolated nodes.
pub fn closeness_centrality(nodes: &[Node], links: &[Link]) -> BTreeMap<String, f64> {
    let index = GraphIndex::new(nodes, links);
    keyed(&index, closeness_indexed(&index))
}

fn keyed(index: &GraphIndex<'_>, values: Vec<f64>) -> BTreeMap<String, f64> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| (index.id(i).to_string(), v))
        .collect()
}

pub(crate) fn degree_indexed(index: &GraphIndex<'_>) -> Vec<usize> {
    (0..index.len()).map(|i| index.degree(i)).collect()
}

pub(crate) fn betweenness_indexed(index: &GraphIndex<'_>, normalize: bool) -> Vec<f64> {
    let n = index.len();
    let mut centrality = vec![0.0f64; n];

    let mut stack: Vec<usize> = Vec::with_capacity(n);
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0f64; n];
    let mut dist = vec![-1i64; n];
    let mut delta = vec![0.0f64; n];
    let mut queue = VecDeque::with_capacity(n);

    for s in 0..n {
        stack.clear();
        for list in &mut predecessors {
            list.clear();
        }
        sigma.iter_mut().for_each(|x| *x = 0.0);
        dist.iter_mut().for_each(|x| *x = -1);
        delta.iter_mut().for_each(|x| *x = 0.0);

        sigma[s] = 1.0;
        dist[s] = 0;
        queue.push_back(s);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for w in index.neighbors(v) {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
            }
            if w != s {
                centrality[w] += delta[w];
            }
        }
    }

    // each undirected pair was counted from both ends
    for value in &mut centrality {
        *value /= 2.0;
    }

    if normalize && n > 2 {
        let pairs = ((n - 1) * (n - 2)) as f64 / 2.0;
        for value in &mut centrality {
            *value /= pairs;
        }
    }
    centrality
}

pub(crate) fn closeness_indexed(index: &GraphIndex<'_>) -> Vec<f64> {
    let n = index.len();
    let mut result = vec![0.0f64; n];
    let mut dist = vec![usize::MAX; n];
    let mut queue = VecDeque::with_capacity(n);

    for (s, slot) in result.iter_mut().enumerate() {
        dist.iter_mut().for_each(|d| *d = usize::MAX);
        dist[s] = 0;
        queue.push_back(s);

        let mut reached = 0usize;
        let mut total = 0usize;
        while let Some(v) = queue.pop_front() {
            for w in index.neighbors(v) {
                if dist[w] == usize::MAX {
                    dist[w] = dist[v] + 1;
                    reached += 1;
                    total += dist[w];
                    queue.push_back(w);
                }
            }
        }

        if total > 0 && n > 1 {
            let r = reached as f64;
            *slot = (r / total as f64) * (r / (n - 1) as f64);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::graph;

    #[test]
    fn degree_counts_every_link() {
        let (nodes, links) = graph(&["a", "b", "c"], &[("a", "b"), ("a", "c"), ("c", "a")]);
        let degree = degree_centrality(&nodes, &links);
        assert_eq!(degree["a"], 3);
        assert_eq!(degree["b"], 1);
        assert_eq!(degree["c"], 2);
    }

    #[test]
    fn path_betweenness() {
        // a - b - c : b lies on the only a..c path
        let (nodes, links) = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let b = betweenness_centrality(&nodes, &links);
        assert_eq!(b["a"], 0.0);
        assert_eq!(b["b"], 1.0);
        assert_eq!(b["c"], 0.0);
    }

    #[test]
    fn split_shortest_paths_share_credit() {
        // square a-b-d, a-c-d: b and c each carry half of a..d
        let (nodes, links) = graph(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        );
        let index = GraphIndex::new(&nodes, &links);
        let raw = betweenness_indexed(&index, false);
        assert!((raw[1] - 0.5).abs() < 1e-12);
        assert!((raw[2] - 0.5).abs() < 1e-12);
        assert!((raw[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn star_closeness() {
        let (nodes, links) = graph(
            &["hub", "a", "b", "c"],
            &[("hub", "a"), ("hub", "b"), ("hub", "c")],
        );
        let c = closeness_centrality(&nodes, &links);
        assert_eq!(c["hub"], 1.0);
        // leaf: distances 1 + 2 + 2 = 5, reaches 3 of 3
        assert!((c["a"] - 3.0 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn isolated_node_has_zero_closeness() {
        let (nodes, links) = graph(&["a", "b", "c"], &[("a", "b")]);
        let c = closeness_centrality(&nodes, &links);
        assert_eq!(c["c"], 0.0);
        // a reaches 1 of 2 at distance 1
        assert!((c["a"] - 0.5).abs() < 1e-12);
    }
}
