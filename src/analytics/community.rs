//! Community detection by greedy modularity optimisation.
//!
//! This is the local-moving phase of the Louvain method: every node starts
//! in its own community and is repeatedly moved to the neighbouring
//! community with the largest modularity gain. Nodes are visited in
//! ascending id order and ties go to the current community, then to the
//! smallest community id, so the partition is a pure function of the graph.

use crate::index::GraphIndex;
use crate::model::{Community, Link, Node};
use std::collections::{BTreeMap, HashMap};

/// Gains closer than this are treated as equal.
const GAIN_EPSILON: f64 = 1e-12;

/// Community id per node id, ids numbered `0..k` by first appearance in the
/// node collection.
pub fn detect_communities(
    nodes: &[Node],
    links: &[Link],
    max_passes: usize,
) -> BTreeMap<String, usize> {
    let index = GraphIndex::new(nodes, links);
    greedy_modularity_indexed(&index, max_passes)
        .into_iter()
        .enumerate()
        .map(|(i, label)| (index.id(i).to_string(), label))
        .collect()
}

/// Newman modularity of a partition given as community id per node id.
/// Nodes missing from the map each count as their own community.
pub fn modularity(nodes: &[Node], links: &[Link], partition: &BTreeMap<String, usize>) -> f64 {
    let index = GraphIndex::new(nodes, links);
    let offset = partition.values().max().map_or(0, |m| m + 1);
    let labels: Vec<usize> = (0..index.len())
        .map(|i| partition.get(index.id(i)).copied().unwrap_or(offset + i))
        .collect();
    modularity_indexed(&index, &labels)
}

pub(crate) fn greedy_modularity_indexed(index: &GraphIndex<'_>, max_passes: usize) -> Vec<usize> {
    let n = index.len();
    let mut community: Vec<usize> = (0..n).collect();
    let m = index.pair_count() as f64;
    if m == 0.0 {
        return renumber(&community);
    }

    let k: Vec<f64> = (0..n).map(|v| index.neighbor_count(v) as f64).collect();
    // Σ_tot per community; community ids are node indices
    let mut total: Vec<f64> = k.clone();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| index.id(a).cmp(index.id(b)).then(a.cmp(&b)));

    let mut links_to: BTreeMap<usize, f64> = BTreeMap::new();
    let mut passes = 0;
    for _ in 0..max_passes {
        passes += 1;
        let mut moved = false;
        for &v in &order {
            if k[v] == 0.0 {
                continue;
            }
            let current = community[v];
            links_to.clear();
            for w in index.neighbors(v) {
                *links_to.entry(community[w]).or_insert(0.0) += 1.0;
            }

            total[current] -= k[v];
            let gain = |c: usize, k_in: f64| k_in / m - total[c] * k[v] / (2.0 * m * m);

            let mut best = current;
            let mut best_gain = gain(current, links_to.get(&current).copied().unwrap_or(0.0));
            for (&c, &k_in) in &links_to {
                let g = gain(c, k_in);
                if g > best_gain + GAIN_EPSILON {
                    best = c;
                    best_gain = g;
                }
            }

            total[best] += k[v];
            if best != current {
                community[v] = best;
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }
    tracing::trace!(passes, "community local moving finished");

    renumber(&community)
}

/// Map arbitrary labels to `0..k` in order of first appearance.
fn renumber(labels: &[usize]) -> Vec<usize> {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    labels
        .iter()
        .map(|&label| {
            let next = mapping.len();
            *mapping.entry(label).or_insert(next)
        })
        .collect()
}

pub(crate) fn build_communities(index: &GraphIndex<'_>, labels: &[usize]) -> Vec<Community> {
    let count = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (v, &label) in labels.iter().enumerate() {
        members[label].push(v);
    }

    members
        .into_iter()
        .enumerate()
        .map(|(id, group)| {
            let size = group.len();
            let mut internal = 0usize;
            for (i, &a) in group.iter().enumerate() {
                for &b in &group[i + 1..] {
                    if index.is_adjacent(a, b) {
                        internal += 1;
                    }
                }
            }
            let internal_density = if size < 2 {
                0.0
            } else {
                internal as f64 / ((size * (size - 1)) as f64 / 2.0)
            };
            Community {
                id,
                members: group.iter().map(|&v| index.id(v).to_string()).collect(),
                internal_density,
            }
        })
        .collect()
}

pub(crate) fn modularity_indexed(index: &GraphIndex<'_>, labels: &[usize]) -> f64 {
    let m = index.pair_count();
    if m == 0 {
        return 0.0;
    }
    let m = m as f64;

    let mut internal: HashMap<usize, f64> = HashMap::new();
    let mut degree_sum: HashMap<usize, f64> = HashMap::new();
    for v in 0..index.len() {
        *degree_sum.entry(labels[v]).or_insert(0.0) += index.neighbor_count(v) as f64;
        for w in index.neighbors(v) {
            if w > v && labels[w] == labels[v] {
                *internal.entry(labels[v]).or_insert(0.0) += 1.0;
            }
        }
    }

    let mut keys: Vec<usize> = degree_sum.keys().copied().collect();
    keys.sort_unstable();
    keys.iter()
        .map(|label| {
            let l = internal.get(label).copied().unwrap_or(0.0);
            let d = degree_sum[label];
            l / m - (d / (2.0 * m)).powi(2)
        })
        .sum()
}
