//! Local and network clustering coefficients.

use crate::index::GraphIndex;
use crate::model::{Link, Node};
use std::collections::BTreeMap;

/// Local clustering per node id; nodes with fewer than two neighbours are
/// left out because the coefficient is undefined for them.
pub fn local_clustering(nodes: &[Node], links: &[Link]) -> BTreeMap<String, f64> {
    let index = GraphIndex::new(nodes, links);
    local_clustering_indexed(&index)
        .into_iter()
        .enumerate()
        .filter_map(|(i, c)| c.map(|value| (index.id(i).to_string(), value)))
        .collect()
}

/// Mean local clustering over nodes where it is defined, 0 when none are.
pub fn average_clustering(nodes: &[Node], links: &[Link]) -> f64 {
    mean_defined(&local_clustering_indexed(&GraphIndex::new(nodes, links)))
}

pub(crate) fn local_clustering_indexed(index: &GraphIndex<'_>) -> Vec<Option<f64>> {
    (0..index.len())
        .map(|v| {
            let neighbors: Vec<usize> = index.neighbors(v).collect();
            let k = neighbors.len();
            if k < 2 {
                return None;
            }
            let mut closed = 0usize;
            for (i, &a) in neighbors.iter().enumerate() {
                for &b in &neighbors[i + 1..] {
                    if index.is_adjacent(a, b) {
                        closed += 1;
                    }
                }
            }
            let possible = (k * (k - 1)) as f64 / 2.0;
            Some(closed as f64 / possible)
        })
        .collect()
}

pub(crate) fn mean_defined(values: &[Option<f64>]) -> f64 {
    let defined: Vec<f64> = values.iter().flatten().copied().collect();
    if defined.is_empty() {
        0.0
    } else {
        defined.iter().sum::<f64>() / defined.len() as f64
    }
}
