//! Layout engine: places nodes under one of five strategies.
//!
//! Static layouts (hierarchical, circular, timeline, cluster) are pure
//! functions of the node/link set and pin every position they produce.
//! Force layout hands the nodes to a [`PhysicsProvider`]. Positions pinned
//! by the user (drag) live in the engine's pin cache and override every
//! strategy until they are released or the graph is regenerated.

mod circular;
mod cluster;
mod force;
mod hierarchical;
mod timeline;

pub use circular::CircularLayout;
pub use cluster::ClusterLayout;
pub use force::{ForceSimulation, PhysicsProvider};
pub use hierarchical::HierarchicalLayout;
pub use timeline::TimelineLayout;

use crate::config::{LayoutSettings, LayoutType};
use crate::model::{Link, Node, Position};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// A static placement strategy.
pub trait LayoutAlgorithm {
    /// Assign `position` (and pins) to every node in place.
    fn apply(&self, nodes: &mut [Node], links: &[Link], settings: &LayoutSettings);
}

/// Layout engine that dispatches to specific algorithms and owns the pin cache.
pub struct LayoutEngine {
    physics: Box<dyn PhysicsProvider>,
    pins: BTreeMap<String, Position>,
}

impl std::fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("pins", &self.pins)
            .finish_non_exhaustive()
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutEngine {
    /// Engine using the built-in [`ForceSimulation`].
    pub fn new() -> Self {
        Self::with_physics(Box::new(ForceSimulation::default()))
    }

    /// Engine using a caller-supplied physics provider for force mode.
    pub fn with_physics(physics: Box<dyn PhysicsProvider>) -> Self {
        Self {
            physics,
            pins: BTreeMap::new(),
        }
    }

    /// Compute positions for a (filtered) node set.
    ///
    /// Returns fresh node records; the input is not modified. Empty input
    /// gives an empty output.
    pub fn layout(&self, nodes: &[Node], links: &[Link], settings: &LayoutSettings) -> Vec<Node> {
        let mut nodes = nodes.to_vec();
        if nodes.is_empty() {
            return nodes;
        }

        if !settings.layout_type.is_static() {
            // pins left by a static layout do not carry over into physics
            for node in nodes.iter_mut() {
                if !self.pins.contains_key(&node.id) {
                    node.unpin();
                }
            }
        }

        match settings.layout_type {
            LayoutType::Force => self.layout_force(&mut nodes, links, settings),
            LayoutType::Hierarchical => HierarchicalLayout.apply(&mut nodes, links, settings),
            LayoutType::Circular => CircularLayout.apply(&mut nodes, links, settings),
            LayoutType::Timeline => TimelineLayout.apply(&mut nodes, links, settings),
            LayoutType::Cluster => ClusterLayout.apply(&mut nodes, links, settings),
        }

        self.apply_pins(&mut nodes);
        tracing::debug!(
            layout = %settings.layout_type,
            nodes = nodes.len(),
            pinned = self.pins.len(),
            "layout complete"
        );
        nodes
    }

    fn layout_force(&self, nodes: &mut [Node], links: &[Link], settings: &LayoutSettings) {
        seed_missing_positions(nodes, settings);
        self.apply_pins(nodes);
        if settings.physics {
            self.physics.simulate(nodes, links, settings);
        }
    }

    fn apply_pins(&self, nodes: &mut [Node]) {
        if self.pins.is_empty() {
            return;
        }
        for node in nodes.iter_mut() {
            if let Some(pos) = self.pins.get(&node.id) {
                node.pin(pos.x, pos.y);
            }
        }
    }

    // =========================================================================
    // PINNING (drag start / end from the renderer)
    // =========================================================================

    /// Fix a node at a position until unpinned or the graph is regenerated.
    pub fn pin_node(&mut self, id: impl Into<String>, x: f64, y: f64) {
        self.pins.insert(id.into(), Position::new(x, y));
    }

    /// Release a pin. Returns whether the node was pinned.
    pub fn unpin_node(&mut self, id: &str) -> bool {
        self.pins.remove(id).is_some()
    }

    /// Drop every pin (full regeneration).
    pub fn clear_pins(&mut self) {
        self.pins.clear();
    }

    pub fn pinned(&self, id: &str) -> Option<Position> {
        self.pins.get(id).copied()
    }

    pub fn pins(&self) -> &BTreeMap<String, Position> {
        &self.pins
    }
}

/// Lay out with a default engine (no user pins).
pub fn layout(nodes: &[Node], links: &[Link], settings: &LayoutSettings) -> Vec<Node> {
    LayoutEngine::new().layout(nodes, links, settings)
}

/// Give every unplaced node a seeded random position inside the viewport.
///
/// The seed mixes the settings seed with the node id, so a node lands in the
/// same spot regardless of its index in the collection.
pub(crate) fn seed_missing_positions(nodes: &mut [Node], settings: &LayoutSettings) {
    for node in nodes.iter_mut().filter(|n| n.position.is_none()) {
        let mut rng = node_rng(settings.seed, &node.id);
        let x = rng.gen_range(0.0..settings.width.max(f64::MIN_POSITIVE));
        let y = rng.gen_range(0.0..settings.height.max(f64::MIN_POSITIVE));
        node.place(x, y);
    }
}

pub(crate) fn node_rng(seed: u64, id: &str) -> StdRng {
    StdRng::seed_from_u64(seed ^ stable_hash(id))
}

/// FNV-1a, stable across runs and platforms.
fn stable_hash(text: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in text.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::model::{Link, LinkType, Node, NodeType};

    pub fn nodes(ids: &[&str]) -> Vec<Node> {
        ids.iter().map(|id| Node::new(*id, *id, NodeType::File)).collect()
    }

    pub fn links(kind: LinkType, edges: &[(&str, &str)]) -> Vec<Link> {
        edges.iter().map(|(a, b)| Link::new(*a, *b, kind)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{links, nodes};
    use super::*;
    use crate::model::LinkType;

    #[test]
    fn empty_input_gives_empty_output() {
        for layout_type in [
            LayoutType::Force,
            LayoutType::Hierarchical,
            LayoutType::Circular,
            LayoutType::Timeline,
            LayoutType::Cluster,
        ] {
            let out = layout(&[], &[], &LayoutSettings::of_type(layout_type));
            assert!(out.is_empty());
        }
    }

    #[test]
    fn single_node_is_placed_by_every_layout() {
        let input = nodes(&["only"]);
        for layout_type in [
            LayoutType::Force,
            LayoutType::Hierarchical,
            LayoutType::Circular,
            LayoutType::Timeline,
            LayoutType::Cluster,
        ] {
            let out = layout(&input, &[], &LayoutSettings::of_type(layout_type));
            assert_eq!(out.len(), 1);
            let pos = out[0].position.expect("position assigned");
            assert!(pos.x.is_finite() && pos.y.is_finite());
        }
    }

    #[test]
    fn static_layouts_pin_positions() {
        let mut input = nodes(&["a", "b", "c"]);
        input[1].pin(5.0, 5.0);
        let chain = links(LinkType::Link, &[("a", "b"), ("b", "c")]);
        for layout_type in [
            LayoutType::Force,
            LayoutType::Hierarchical,
            LayoutType::Circular,
            LayoutType::Timeline,
            LayoutType::Cluster,
        ] {
            let settings = LayoutSettings {
                physics: false,
                ..LayoutSettings::of_type(layout_type)
            };
            let out = layout(&input, &chain, &settings);
            assert!(
                out.iter().all(|n| n.is_pinned() == layout_type.is_static()),
                "{layout_type}"
            );
        }
    }

    #[test]
    fn force_mode_clears_static_pins() {
        let mut input = nodes(&["a", "b"]);
        input[0].pin(5.0, 5.0);
        let settings = LayoutSettings {
            physics: false,
            ..LayoutSettings::of_type(LayoutType::Force)
        };
        let out = layout(&input, &[], &settings);
        assert!(out.iter().all(|n| !n.is_pinned()));
        assert_eq!(out[0].position, Some(Position::new(5.0, 5.0)));
    }

    #[test]
    fn seeded_positions_are_reproducible_and_in_viewport() {
        let input = nodes(&["a", "b", "c"]);
        let settings = LayoutSettings {
            physics: false,
            ..LayoutSettings::default()
        };
        let first = layout(&input, &[], &settings);
        let second = layout(&input, &[], &settings);
        assert_eq!(first, second);
        for node in &first {
            let pos = node.position.unwrap();
            assert!(pos.x >= 0.0 && pos.x < settings.width);
            assert!(pos.y >= 0.0 && pos.y < settings.height);
        }
    }

    #[test]
    fn user_pins_override_every_layout() {
        let mut engine = LayoutEngine::new();
        engine.pin_node("b", 1.0, 2.0);
        let input = nodes(&["a", "b", "c"]);
        let edges = links(LinkType::Link, &[("a", "b"), ("b", "c")]);

        for layout_type in [LayoutType::Force, LayoutType::Circular, LayoutType::Cluster] {
            let out = engine.layout(&input, &edges, &LayoutSettings::of_type(layout_type));
            let b = out.iter().find(|n| n.id == "b").unwrap();
            assert_eq!(b.position, Some(Position::new(1.0, 2.0)));
            assert!(b.is_pinned());
        }

        assert!(engine.unpin_node("b"));
        assert!(!engine.unpin_node("b"));
        assert!(engine.pinned("b").is_none());
    }
}
