use super::LayoutAlgorithm;
use crate::config::LayoutSettings;
use crate::model::{Link, Node};
use std::f64::consts::TAU;

/// Nodes evenly spaced on a ring around the viewport center, in collection order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CircularLayout;

impl LayoutAlgorithm for CircularLayout {
    fn apply(&self, nodes: &mut [Node], _links: &[Link], settings: &LayoutSettings) {
        let count = nodes.len();
        let (cx, cy) = settings.center();
        let radius = 0.35 * settings.width.min(settings.height);

        for (i, node) in nodes.iter_mut().enumerate() {
            let angle = TAU * i as f64 / count as f64;
            node.pin(cx + radius * angle.cos(), cy + radius * angle.sin());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutType;
    use crate::layout::test_support::nodes;
    use std::f64::consts::PI;

    #[test]
    fn four_nodes_on_quarter_angles() {
        let settings = LayoutSettings::of_type(LayoutType::Circular);
        let mut input = nodes(&["a", "b", "c", "d"]);
        CircularLayout.apply(&mut input, &[], &settings);

        let (cx, cy) = settings.center();
        let expected = [0.0, PI / 2.0, PI, 3.0 * PI / 2.0];
        for (node, angle) in input.iter().zip(expected) {
            let pos = node.position.unwrap();
            let actual = (pos.y - cy).atan2(pos.x - cx).rem_euclid(TAU);
            assert!((actual - angle).abs() < 1e-9, "{} at {actual}", node.id);
            let r = ((pos.x - cx).powi(2) + (pos.y - cy).powi(2)).sqrt();
            assert!((r - 280.0).abs() < 1e-9);
            assert!(node.is_pinned());
        }
    }
}
