//! Tree layout from `parent` links (source = parent, target = child).
//!
//! Levels are longest-path depths: a child sits one level below the deepest
//! of its parents. When a parent cycle blocks progress, the first unplaced
//! node in collection order is released as a root at the level it has
//! accumulated so far.

use super::LayoutAlgorithm;
use crate::config::LayoutSettings;
use crate::model::{Link, LinkType, Node};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchicalLayout;

impl HierarchicalLayout {
    /// Level of every node, in collection order.
    pub(crate) fn levels(nodes: &[Node], links: &[Link]) -> Vec<usize> {
        let n = nodes.len();
        let lookup: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.as_str(), i))
            .collect();

        let mut seen_edges = HashSet::new();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut pending = vec![0usize; n];
        for link in links.iter().filter(|l| l.link_type == LinkType::Parent) {
            let (Some(&p), Some(&c)) = (
                lookup.get(link.source.as_str()),
                lookup.get(link.target.as_str()),
            ) else {
                continue;
            };
            if p == c || !seen_edges.insert((p, c)) {
                continue;
            }
            children[p].push(c);
            pending[c] += 1;
        }

        let mut level = vec![0usize; n];
        let mut placed = vec![false; n];
        let mut queue: VecDeque<usize> = (0..n).filter(|&i| pending[i] == 0).collect();
        let mut remaining = n;

        while remaining > 0 {
            if queue.is_empty() {
                // cycle: release the first unplaced node
                if let Some(root) = (0..n).find(|&i| !placed[i] && pending[i] > 0) {
                    pending[root] = 0;
                    queue.push_back(root);
                }
            }
            let Some(v) = queue.pop_front() else {
                break;
            };
            if placed[v] {
                continue;
            }
            placed[v] = true;
            remaining -= 1;
            for &c in &children[v] {
                if placed[c] {
                    continue;
                }
                level[c] = level[c].max(level[v] + 1);
                pending[c] = pending[c].saturating_sub(1);
                if pending[c] == 0 {
                    queue.push_back(c);
                }
            }
        }
        level
    }
}

impl LayoutAlgorithm for HierarchicalLayout {
    fn apply(&self, nodes: &mut [Node], links: &[Link], settings: &LayoutSettings) {
        let levels = Self::levels(nodes, links);
        let max_depth = levels.iter().copied().max().unwrap_or(0);
        let row_height = settings.height / (max_depth + 1) as f64;

        let mut per_level: HashMap<usize, usize> = HashMap::new();
        for &level in &levels {
            *per_level.entry(level).or_insert(0) += 1;
        }

        let mut next_slot: HashMap<usize, usize> = HashMap::new();
        for (node, &level) in nodes.iter_mut().zip(&levels) {
            let count = per_level.get(&level).copied().unwrap_or(1);
            let slot = next_slot.entry(level).or_insert(0);
            *slot += 1;
            let x = settings.width / (count + 1) as f64 * *slot as f64;
            let y = level as f64 * row_height;
            node.pin(x, y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutType;
    use crate::layout::test_support::{links, nodes};

    fn apply(input: &mut [Node], edges: &[Link]) {
        HierarchicalLayout.apply(input, edges, &LayoutSettings::of_type(LayoutType::Hierarchical));
    }

    fn y_of(nodes: &[Node], id: &str) -> f64 {
        nodes.iter().find(|n| n.id == id).unwrap().position.unwrap().y
    }

    #[test]
    fn children_sit_below_parents() {
        let mut input = nodes(&["root", "a", "b", "a1"]);
        let edges = links(
            LinkType::Parent,
            &[("root", "a"), ("root", "b"), ("a", "a1")],
        );
        apply(&mut input, &edges);

        assert_eq!(y_of(&input, "root"), 0.0);
        assert!(y_of(&input, "a") > y_of(&input, "root"));
        assert!(y_of(&input, "a1") > y_of(&input, "a"));
        assert_eq!(y_of(&input, "a"), y_of(&input, "b"));
        assert!(input.iter().all(|n| n.is_pinned()));
    }

    #[test]
    fn siblings_are_spread_evenly() {
        let mut input = nodes(&["p", "c1", "c2", "c3"]);
        let edges = links(LinkType::Parent, &[("p", "c1"), ("p", "c2"), ("p", "c3")]);
        apply(&mut input, &edges);

        let xs: Vec<f64> = input[1..].iter().map(|n| n.position.unwrap().x).collect();
        assert_eq!(xs, vec![300.0, 600.0, 900.0]);
        assert_eq!(input[0].position.unwrap().x, 600.0);
    }

    #[test]
    fn deepest_parent_wins() {
        let mut input = nodes(&["r", "m", "leaf"]);
        let edges = links(LinkType::Parent, &[("r", "m"), ("m", "leaf"), ("r", "leaf")]);
        apply(&mut input, &edges);
        assert!(y_of(&input, "leaf") > y_of(&input, "m"));
    }

    #[test]
    fn cycles_and_other_link_types_do_not_hang() {
        let mut input = nodes(&["a", "b", "c"]);
        let mut edges = links(LinkType::Parent, &[("a", "b"), ("b", "a")]);
        edges.extend(links(LinkType::Link, &[("c", "a")]));
        apply(&mut input, &edges);
        assert!(input.iter().all(|n| n.position.is_some()));
        assert_eq!(y_of(&input, "c"), 0.0);
        assert!(y_of(&input, "b") > y_of(&input, "a"));
    }
}
