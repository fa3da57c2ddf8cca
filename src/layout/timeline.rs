use super::{node_rng, LayoutAlgorithm};
use crate::config::LayoutSettings;
use crate::model::{Link, Node, NodeType};
use rand::Rng;

/// Maximum vertical jitter either side of a node type's lane.
const JITTER: f64 = 20.0;

/// Nodes ordered left to right by last-modified time, one lane per node type.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimelineLayout;

impl TimelineLayout {
    fn lane_offset(node_type: NodeType) -> f64 {
        match node_type {
            NodeType::Folder => -120.0,
            NodeType::File => -60.0,
            NodeType::Database => 60.0,
            NodeType::Tag => 120.0,
        }
    }
}

impl LayoutAlgorithm for TimelineLayout {
    fn apply(&self, nodes: &mut [Node], _links: &[Link], settings: &LayoutSettings) {
        let count = nodes.len();
        let mut order: Vec<usize> = (0..count).collect();
        // stable: equal timestamps keep collection order
        order.sort_by_key(|&i| nodes[i].metadata.last_modified);

        let (left, span) = (0.1 * settings.width, 0.8 * settings.width);
        let (_, mid_y) = settings.center();

        for (rank, &i) in order.iter().enumerate() {
            let x = if count == 1 {
                0.5 * settings.width
            } else {
                left + span * rank as f64 / (count - 1) as f64
            };
            let node = &mut nodes[i];
            let jitter = node_rng(settings.seed, &node.id).gen_range(-JITTER..=JITTER);
            let y = mid_y + Self::lane_offset(node.node_type) + jitter;
            node.pin(x, y);
        }
    }
}
