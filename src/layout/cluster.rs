//! Connected components arranged on a grid.
//!
//! Every component with at least two members becomes a cluster; clusters are
//! numbered in order of their first member in the collection and laid out
//! row by row, members on a small circle around the cell center. Isolated
//! nodes are not clusters and keep wherever they already are.

use super::{seed_missing_positions, LayoutAlgorithm};
use crate::config::LayoutSettings;
use crate::index::GraphIndex;
use crate::model::{Link, Node};
use std::f64::consts::TAU;

#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterLayout;

impl ClusterLayout {
    /// Cluster id per node (collection order); `None` for isolated nodes.
    pub(crate) fn assign(nodes: &[Node], links: &[Link]) -> Vec<Option<usize>> {
        let index = GraphIndex::new(nodes, links);
        let mut assignment = vec![None; index.len()];
        let clusters = index.components().into_iter().filter(|c| c.len() >= 2);
        for (id, members) in clusters.enumerate() {
            for v in members {
                assignment[v] = Some(id);
            }
        }
        assignment
    }
}

impl LayoutAlgorithm for ClusterLayout {
    fn apply(&self, nodes: &mut [Node], links: &[Link], settings: &LayoutSettings) {
        let assignment = Self::assign(nodes, links);
        let cluster_count = assignment.iter().flatten().max().map_or(0, |m| m + 1);

        let mut members: Vec<Vec<usize>> = vec![Vec::new(); cluster_count];
        for (v, cluster) in assignment.iter().enumerate() {
            if let Some(c) = cluster {
                members[*c].push(v);
            }
        }

        let cols = (cluster_count as f64).sqrt().ceil().max(1.0) as usize;
        let rows = cluster_count.div_ceil(cols).max(1);
        let cell_w = settings.width / cols as f64;
        let cell_h = settings.height / rows as f64;

        for (cluster, group) in members.iter().enumerate() {
            let (col, row) = (cluster % cols, cluster / cols);
            let cx = (col as f64 + 0.5) * cell_w;
            let cy = (row as f64 + 0.5) * cell_h;
            let m = group.len();
            let radius = (20.0 * (m as f64).sqrt()).min(80.0);
            for (j, &v) in group.iter().enumerate() {
                let angle = TAU * j as f64 / m as f64;
                let node = &mut nodes[v];
                node.pin(cx + radius * angle.cos(), cy + radius * angle.sin());
                node.cluster = Some(cluster);
            }
        }

        for (node, cluster) in nodes.iter_mut().zip(&assignment) {
            if cluster.is_none() {
                node.cluster = None;
                node.unpin();
            }
        }
        seed_missing_positions(nodes, settings);
        tracing::trace!(clusters = cluster_count, "cluster layout placed");
    }
}
