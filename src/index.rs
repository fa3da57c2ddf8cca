//! Dense integer index over a node/link set.
//!
//! Analytics, path finding and the component-based layouts all work on the
//! undirected view of the graph. This builds it once: node ids map to
//! `0..n` in collection order, parallel and antiparallel links collapse into
//! one undirected pair (keeping the strongest), self loops and dangling
//! links are ignored. Neighbour lists are sorted so every traversal visits
//! nodes in the same order on every run.

use crate::model::{Link, Node};
use std::collections::HashMap;

pub(crate) struct GraphIndex<'a> {
    ids: Vec<&'a str>,
    lookup: HashMap<&'a str, usize>,
    /// (neighbour, strongest link strength), sorted by neighbour
    adjacency: Vec<Vec<(usize, f64)>>,
    /// Raw in + out link count, duplicates included
    degree: Vec<usize>,
    pair_count: usize,
}

impl<'a> GraphIndex<'a> {
    pub fn new(nodes: &'a [Node], links: &'a [Link]) -> Self {
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let mut lookup = HashMap::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            lookup.entry(*id).or_insert(i);
        }

        let mut pairs: HashMap<(usize, usize), f64> = HashMap::new();
        let mut degree = vec![0usize; ids.len()];

        for link in links {
            let (Some(&s), Some(&t)) = (
                lookup.get(link.source.as_str()),
                lookup.get(link.target.as_str()),
            ) else {
                continue;
            };
            degree[s] += 1;
            degree[t] += 1;
            if s == t {
                continue;
            }
            let key = (s.min(t), s.max(t));
            let entry = pairs.entry(key).or_insert(link.strength);
            if link.strength > *entry {
                *entry = link.strength;
            }
        }

        let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); ids.len()];
        for (&(a, b), &strength) in &pairs {
            adjacency[a].push((b, strength));
            adjacency[b].push((a, strength));
        }
        for list in &mut adjacency {
            list.sort_by_key(|&(j, _)| j);
        }

        Self {
            ids,
            lookup,
            adjacency,
            degree,
            pair_count: pairs.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn id(&self, index: usize) -> &'a str {
        self.ids[index]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.lookup.get(id).copied()
    }

    /// Distinct undirected neighbours, ascending.
    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[index].iter().map(|&(j, _)| j)
    }

    /// Neighbours with the strongest link strength to each.
    pub fn neighbors_with_strength(&self, index: usize) -> &[(usize, f64)] {
        &self.adjacency[index]
    }

    pub fn neighbor_count(&self, index: usize) -> usize {
        self.adjacency[index].len()
    }

    pub fn is_adjacent(&self, a: usize, b: usize) -> bool {
        self.adjacency[a]
            .binary_search_by_key(&b, |&(j, _)| j)
            .is_ok()
    }

    pub fn degree(&self, index: usize) -> usize {
        self.degree[index]
    }

    /// Number of distinct undirected node pairs joined by a link.
    pub fn pair_count(&self) -> usize {
        self.pair_count
    }

    /// Connected components with members ascending, ordered by smallest member.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.len()];
        let mut components = Vec::new();
        let mut stack = Vec::new();

        for start in 0..self.len() {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            stack.push(start);
            let mut members = Vec::new();
            while let Some(v) = stack.pop() {
                members.push(v);
                for w in self.neighbors(v) {
                    if !seen[w] {
                        seen[w] = true;
                        stack.push(w);
                    }
                }
            }
            members.sort_unstable();
            components.push(members);
        }
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LinkType, NodeType};

    fn nodes(ids: &[&str]) -> Vec<Node> {
        ids.iter().map(|id| Node::new(*id, *id, NodeType::File)).collect()
    }

    #[test]
    fn collapses_parallel_links() {
        let nodes = nodes(&["a", "b"]);
        let links = vec![
            Link::new("a", "b", LinkType::Link).with_strength(0.2),
            Link::new("b", "a", LinkType::Backlink).with_strength(0.9),
        ];
        let index = GraphIndex::new(&nodes, &links);
        assert_eq!(index.pair_count(), 1);
        assert_eq!(index.degree(0), 2);
        assert_eq!(index.neighbors_with_strength(0), &[(1, 0.9)]);
    }

    #[test]
    fn ignores_dangling_and_self_loops() {
        let nodes = nodes(&["a", "b"]);
        let links = vec![
            Link::new("a", "a", LinkType::Link),
            Link::new("a", "zzz", LinkType::Link),
        ];
        let index = GraphIndex::new(&nodes, &links);
        assert_eq!(index.pair_count(), 0);
        assert_eq!(index.neighbor_count(0), 0);
    }

    #[test]
    fn finds_components() {
        let nodes = nodes(&["a", "b", "c", "d"]);
        let links = vec![
            Link::new("a", "c", LinkType::Link),
            Link::new("b", "d", LinkType::Link),
        ];
        let index = GraphIndex::new(&nodes, &links);
        assert_eq!(index.components(), vec![vec![0, 2], vec![1, 3]]);
        assert!(index.is_adjacent(0, 2));
        assert!(!index.is_adjacent(0, 1));
    }
}
